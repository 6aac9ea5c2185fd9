//! Storage Engine Module
//!
//! This module provides the in-memory core of durakv: a key-value table
//! with TTL support, an ordered expiry queue, and the background sweeper
//! that drains it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               StorageEngine                 │
//! │  ┌───────────────────────────────────────┐  │
//! │  │ RwLock: entries + expiry_queue        │  │
//! │  └───────────────────────────────────────┘  │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!                       │
//!         ┌─────────────┴─────────────┐
//!         │      ExpirySweeper        │
//!         │  (Background Tokio Task)  │
//!         └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Single Exclusive-Access Discipline**: the table and the expiry
//!   queue mutate together under one lock
//! - **TTL Support**: entries can carry an absolute expiry deadline
//! - **Lazy Expiry**: expired entries behave as absent on access
//! - **Active Expiry**: the sweeper drains due deadlines from the queue
//!   instead of scanning the table

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{Entry, StorageEngine};
pub use expiry::{start_expiry_sweeper, ExpirySweeper};
