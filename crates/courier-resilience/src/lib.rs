// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Courier dispatch framework.
//!
//! Currently provides the retry/backoff layer handlers wrap around their
//! outbound transport, task-tracker, and assistant calls.

pub mod retry;

pub use retry::{RetryExhausted, RetryPolicy, retry};
