//! # Outbox Queue
//!
//! Durable, ordered mutation queue for Outbox.
//!
//! This crate provides the store that captures write requests issued while
//! the client has no connectivity:
//! - [`QueuedMutation`] records (write verb, URL, opaque payload)
//! - [`QueueStore`] trait shared by the producer and consumer sides
//! - [`MemoryStore`] for tests and ephemeral use
//! - [`JournalStore`] for crash-safe persistent storage
//!
//! ## Design Principles
//!
//! - The queue is strictly FIFO: `list()` returns records in insertion
//!   order and nothing in this crate ever reorders them.
//! - A record leaves the store only after a confirmed successful replay or
//!   after the replay engine reports it terminally failed.
//! - `enqueue` makes the record durable before returning.
//! - Payloads are opaque bytes; the queue never decodes them.
//!
//! ## Example
//!
//! ```rust
//! use outbox_queue::{MemoryStore, Method, QueueStore};
//!
//! let store = MemoryStore::new();
//! let id = store.enqueue(Method::Post, "/api/orders", Some(b"{}".to_vec())).unwrap();
//! assert_eq!(store.list()[0].id, id);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod journal;
mod memory;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use journal::JournalStore;
pub use memory::MemoryStore;
pub use record::{Method, MutationId, QueuedMutation};
pub use store::QueueStore;
