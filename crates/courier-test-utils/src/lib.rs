// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock handler implementations for fast, deterministic,
//! CI-runnable tests without external services.

pub mod mock_handler;

pub use mock_handler::{FnHandler, MockBehavior, MockHandler};
