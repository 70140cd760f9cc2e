// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The handler contract: the sole interface the dispatch core calls outward.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::QueuedMessage;

/// An asynchronous message handler.
///
/// Implementations wrap the external collaborators (messaging transport,
/// task tracker, assistant backend) and typically guard their outbound calls
/// with a retry policy. The dispatch core invokes `handle` once per message
/// under a deadline; a returned error marks the message `Failed` and is never
/// redelivered by the core.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message, returning the textual result to commit on the record.
    async fn handle(&self, message: &QueuedMessage) -> Result<String, CourierError>;
}
