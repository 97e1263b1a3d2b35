//! # Outbox Engine
//!
//! Connectivity monitoring, write interception, and queued-mutation replay
//! for Outbox.
//!
//! This crate provides:
//! - [`ConnectivityMonitor`]: debounced online/offline signal relay
//! - [`WriteInterceptor`]: diverts connectivity-loss write failures into
//!   the durable queue and answers with a synthetic accepted result
//! - [`SyncEngine`]: ordered, single-flight replay of queued mutations
//! - [`OfflineService`]: explicit composition root with init/dispose
//!
//! ## Architecture
//!
//! ```text
//! write call ──▶ WriteInterceptor ──▶ online: pass through
//!                      │
//!                      └──▶ offline write failure: QueueStore.enqueue
//!
//! platform signal ──▶ ConnectivityMonitor ──▶ OFFLINE→ONLINE commit
//!                                                   │
//!                                                   ▼
//!                                     SyncEngine.run(): replay in order
//! ```
//!
//! ## Key Invariants
//!
//! - Replay order is queue insertion order; replays run one at a time
//! - At most one sync pass is active at any moment; extra triggers coalesce
//! - A mutation leaves the queue only after a confirmed success or after
//!   the retry ceiling, and terminal failures stay queryable
//! - Only connectivity-loss write failures are masked; every other error
//!   reaches the caller unchanged

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod connectivity;
mod engine;
mod error;
mod interceptor;
mod service;
mod worker;

pub use client::{ApiClient, ApiError, ApiRequest, ApiResponse, MockClient, Verb};
pub use config::SyncConfig;
pub use connectivity::{ConnectivityMonitor, ConnectivityState, Subscription};
pub use engine::{FailedMutation, SyncEngine, SyncReport, SyncStats};
pub use error::{SyncError, SyncResult};
pub use interceptor::{AuthProvider, NoAuth, WriteInterceptor};
pub use service::OfflineService;
pub use worker::{register_asset_worker, WorkerRegistrar};
