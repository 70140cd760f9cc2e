// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier dispatch framework.
//!
//! This crate provides the message record lifecycle, the error taxonomy and
//! reporter, and the [`MessageHandler`] contract that the dispatch core calls
//! outward. Transport, task-tracking, and assistant adapters live in
//! downstream crates and only meet the core through that contract.

pub mod error;
pub mod handler;
pub mod report;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CourierError, ErrorCategory, ErrorSeverity};
pub use handler::MessageHandler;
pub use report::{ClassifiedError, ErrorReporter};
pub use types::{InvalidTransition, MessageId, MessageStatus, ProcessOutcome, QueuedMessage};
