// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record types and the pending -> processing -> terminal lifecycle.
//!
//! [`QueuedMessage`] keeps its lifecycle fields private so every status
//! change goes through [`QueuedMessage::begin_processing`] or
//! [`QueuedMessage::finish`]. Illegal transitions are an [`InvalidTransition`]
//! error, never a silent mutation, and terminal states are absorbing.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::error::CourierError;

/// Unique identifier for a queued message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing status of a queued message.
///
/// Legal transitions: `Pending -> Processing -> {Completed, Failed, TimedOut}`.
/// The three terminal states are absorbing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[strum(serialize = "timeout")]
    #[serde(rename = "timeout")]
    TimedOut,
}

impl MessageStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MessageStatus::Completed | MessageStatus::Failed | MessageStatus::TimedOut
        )
    }
}

/// Attempted an illegal status transition on a message record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: MessageStatus,
    pub to: MessageStatus,
}

/// The outcome of one handler invocation, as observed by the worker.
///
/// Deadline exceedance is deliberately distinct from a handler failure so
/// callers are forced to account for both.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The handler returned normally with a textual result.
    Completed(String),
    /// The handler did not finish within the per-message deadline.
    TimedOut { limit: Duration },
    /// The handler returned an error.
    Failed(CourierError),
}

impl ProcessOutcome {
    /// The terminal status this outcome maps to.
    pub fn status(&self) -> MessageStatus {
        match self {
            ProcessOutcome::Completed(_) => MessageStatus::Completed,
            ProcessOutcome::TimedOut { .. } => MessageStatus::TimedOut,
            ProcessOutcome::Failed(_) => MessageStatus::Failed,
        }
    }
}

/// A message record: the unit of work owned by the dispatch core.
///
/// Input payload fields (`sender`, `text`, `timestamp`, `metadata`) are set at
/// construction and never change. Lifecycle fields are only reachable through
/// accessors and the guarded transition methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMessage {
    id: MessageId,
    sender: String,
    text: String,
    timestamp: DateTime<Utc>,
    status: MessageStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<String>,
    error: Option<String>,
    /// Reserved for caller-level redelivery; the core never mutates it.
    retry_count: u32,
    metadata: HashMap<String, String>,
}

impl QueuedMessage {
    /// Create a new pending record with a fresh id.
    pub fn new(
        sender: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender: sender.into(),
            text: text.into(),
            timestamp,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            retry_count: 0,
            metadata,
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The handler result; present iff the status is `Completed`.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// The failure description; present iff the status is `Failed` or `TimedOut`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Bump the redelivery counter. The dispatch core never calls this; it
    /// exists for producers that re-enqueue a message themselves.
    pub fn increment_retry_count(&mut self) {
        self.retry_count += 1;
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Transition `Pending -> Processing`, stamping `started_at`.
    pub fn begin_processing(&mut self) -> Result<(), InvalidTransition> {
        if self.status != MessageStatus::Pending {
            return Err(InvalidTransition {
                from: self.status,
                to: MessageStatus::Processing,
            });
        }
        self.status = MessageStatus::Processing;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Transition `Processing` to the terminal status carried by `outcome`,
    /// stamping `completed_at` and committing the result or error text.
    pub fn finish(&mut self, outcome: ProcessOutcome) -> Result<(), InvalidTransition> {
        if self.status != MessageStatus::Processing {
            return Err(InvalidTransition {
                from: self.status,
                to: outcome.status(),
            });
        }
        self.status = outcome.status();
        self.completed_at = Some(Utc::now());
        match outcome {
            ProcessOutcome::Completed(result) => self.result = Some(result),
            ProcessOutcome::TimedOut { limit } => {
                self.error = Some(format!(
                    "processing timeout after {:.1}s",
                    limit.as_secs_f64()
                ));
            }
            ProcessOutcome::Failed(err) => self.error = Some(err.to_string()),
        }
        Ok(())
    }

    /// Wall-clock time spent in `Processing`, once terminal.
    pub fn processing_time(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => (completed - started).to_std().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fresh(text: &str) -> QueuedMessage {
        QueuedMessage::new("+1234567890", text, Utc::now(), HashMap::new())
    }

    #[test]
    fn new_record_is_pending_with_no_timestamps() {
        let msg = fresh("hello");
        assert_eq!(msg.status(), MessageStatus::Pending);
        assert_eq!(msg.retry_count(), 0);
        assert!(msg.started_at().is_none());
        assert!(msg.completed_at().is_none());
        assert!(msg.result().is_none());
        assert!(msg.error().is_none());
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(fresh("a").id(), fresh("b").id());
    }

    #[test]
    fn completed_path_commits_result_and_timestamps() {
        let mut msg = fresh("hello");
        msg.begin_processing().expect("pending -> processing");
        msg.finish(ProcessOutcome::Completed("ok".into()))
            .expect("processing -> completed");

        assert_eq!(msg.status(), MessageStatus::Completed);
        assert_eq!(msg.result(), Some("ok"));
        assert!(msg.error().is_none());
        assert!(msg.started_at().expect("started") <= msg.completed_at().expect("completed"));
    }

    #[test]
    fn timeout_path_records_timeout_error() {
        let mut msg = fresh("slow");
        msg.begin_processing().expect("pending -> processing");
        msg.finish(ProcessOutcome::TimedOut {
            limit: Duration::from_secs(30),
        })
        .expect("processing -> timeout");

        assert_eq!(msg.status(), MessageStatus::TimedOut);
        assert!(msg.result().is_none());
        assert!(msg.error().expect("error").contains("timeout"));
    }

    #[test]
    fn failed_path_records_handler_error() {
        let mut msg = fresh("bad");
        msg.begin_processing().expect("pending -> processing");
        msg.finish(ProcessOutcome::Failed(CourierError::Internal("boom".into())))
            .expect("processing -> failed");

        assert_eq!(msg.status(), MessageStatus::Failed);
        assert!(msg.error().expect("error").contains("boom"));
    }

    #[test]
    fn cannot_finish_a_pending_record() {
        let mut msg = fresh("early");
        let err = msg
            .finish(ProcessOutcome::Completed("ok".into()))
            .expect_err("pending -> completed must be rejected");
        assert_eq!(err.from, MessageStatus::Pending);
        assert_eq!(err.to, MessageStatus::Completed);
        assert_eq!(msg.status(), MessageStatus::Pending);
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let mut msg = fresh("done");
        msg.begin_processing().expect("pending -> processing");
        msg.finish(ProcessOutcome::Completed("ok".into()))
            .expect("processing -> completed");

        assert!(msg.begin_processing().is_err());
        assert!(
            msg.finish(ProcessOutcome::Failed(CourierError::Internal("late".into())))
                .is_err()
        );
        assert_eq!(msg.status(), MessageStatus::Completed);
        assert_eq!(msg.result(), Some("ok"));
    }

    #[test]
    fn status_serializes_with_snake_case_tags() {
        let json = serde_json::to_string(&MessageStatus::TimedOut).expect("serialize");
        assert_eq!(json, "\"timeout\"");
        let json = serde_json::to_string(&MessageStatus::Pending).expect("serialize");
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn record_serializes_round_trip() {
        let mut metadata = HashMap::new();
        metadata.insert("group_id".to_string(), "abc123".to_string());
        let msg = QueuedMessage::new("+1234567890", "hello", Utc::now(), metadata);

        let json = serde_json::to_string(&msg).expect("serialize");
        let parsed: QueuedMessage = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(parsed.id(), msg.id());
        assert_eq!(parsed.sender(), "+1234567890");
        assert_eq!(parsed.status(), MessageStatus::Pending);
        assert_eq!(parsed.metadata().get("group_id").map(String::as_str), Some("abc123"));
    }

    proptest! {
        /// Any sequence of transition attempts reaches at most one terminal
        /// state, and `started_at <= completed_at` whenever both are set.
        #[test]
        fn transition_sequences_respect_lifecycle(ops in proptest::collection::vec(0u8..4, 0..12)) {
            let mut msg = fresh("prop");
            let mut terminal_seen: Option<MessageStatus> = None;

            for op in ops {
                let _ = match op {
                    0 => msg.begin_processing(),
                    1 => msg.finish(ProcessOutcome::Completed("ok".into())),
                    2 => msg.finish(ProcessOutcome::TimedOut { limit: Duration::from_secs(1) }),
                    _ => msg.finish(ProcessOutcome::Failed(CourierError::Internal("x".into()))),
                };

                if msg.status().is_terminal() {
                    match terminal_seen {
                        None => terminal_seen = Some(msg.status()),
                        Some(first) => prop_assert_eq!(first, msg.status()),
                    }
                }
            }

            if let (Some(started), Some(completed)) = (msg.started_at(), msg.completed_at()) {
                prop_assert!(started <= completed);
            }
        }
    }
}
