// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent dispatch core for the Courier framework.
//!
//! A bounded FIFO queue feeds a fixed pool of worker tasks. Each worker runs
//! the configured [`MessageHandler`](courier_core::MessageHandler) under a
//! per-message deadline, commits the terminal status on the message record,
//! and maintains aggregate statistics. Guarantees and limits:
//!
//! - Dispatch starts in FIFO arrival order; completion order is unordered.
//! - `enqueue` never blocks; a full queue is an immediate `QueueFull` error.
//! - Handler failures are terminal per message; redelivery, if any, belongs
//!   to a retry policy inside the handler (see `courier-resilience`).

pub mod config;
pub mod dispatcher;
pub mod stats;
pub mod store;

pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use stats::{QueueStats, StatsTracker};
pub use store::MessageStore;
