// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types and classification taxonomy for the Courier dispatch core.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Message fragments that mark a failure as transient regardless of variant.
///
/// Matched against the lower-cased rendering of the error, covering the
/// network/timeout/rate-limit class of failures that outbound API clients
/// surface as plain text.
const TRANSIENT_KEYWORDS: &[&str] = &[
    "timeout",
    "connection",
    "temporary",
    "unavailable",
    "rate limit",
    "too many requests",
    "429",
    "502",
    "503",
    "504",
];

/// The primary error type used across the Courier workspace.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Messaging transport errors (send/receive failure, connection loss).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Task-tracking service errors (API failure, bad response, auth).
    #[error("task tracker error: {message}")]
    TaskTracker {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Assistant/model backend errors (API failure, overload, bad output).
    #[error("assistant error: {message}")]
    Assistant {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The bounded dispatch queue is at capacity.
    #[error("queue full: capacity {capacity} reached")]
    QueueFull { capacity: usize },

    /// An operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration errors (missing fields, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input validation errors.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// The taxonomy category this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CourierError::Transport { .. } => ErrorCategory::Transport,
            CourierError::TaskTracker { .. } => ErrorCategory::TaskTracker,
            CourierError::Assistant { .. } => ErrorCategory::Assistant,
            CourierError::QueueFull { .. } => ErrorCategory::Queue,
            CourierError::Timeout { .. } => ErrorCategory::Unknown,
            CourierError::Config(_) => ErrorCategory::Configuration,
            CourierError::Validation(_) => ErrorCategory::Validation,
            CourierError::Internal(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this failure is judged likely to succeed on retry.
    ///
    /// Deadline failures are always transient; anything else is transient
    /// when its rendered message carries one of the well-known network,
    /// rate-limit, or availability markers.
    pub fn is_transient(&self) -> bool {
        if matches!(self, CourierError::Timeout { .. }) {
            return true;
        }
        let message = self.to_string().to_lowercase();
        TRANSIENT_KEYWORDS.iter().any(|kw| message.contains(kw))
    }

    /// Convenience constructor for a transport failure without a source.
    pub fn transport(message: impl Into<String>) -> Self {
        CourierError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Convenience constructor for a task-tracker failure without a source.
    pub fn task_tracker(message: impl Into<String>) -> Self {
        CourierError::TaskTracker {
            message: message.into(),
            source: None,
        }
    }

    /// Convenience constructor for an assistant failure without a source.
    pub fn assistant(message: impl Into<String>) -> Self {
        CourierError::Assistant {
            message: message.into(),
            source: None,
        }
    }
}

/// Failure domains used for classification and retry decisions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transport,
    TaskTracker,
    Assistant,
    Queue,
    Configuration,
    Validation,
    Unknown,
}

impl ErrorCategory {
    /// The default user-facing sentence for this category.
    pub fn default_user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => {
                "Unable to send or receive messages. Please check your connection."
            }
            ErrorCategory::TaskTracker => {
                "Unable to access your tasks. Please verify the task tracker configuration."
            }
            ErrorCategory::Assistant => {
                "The assistant is temporarily unavailable. Please try again."
            }
            ErrorCategory::Queue => {
                "The system is busy processing requests. Please try again shortly."
            }
            ErrorCategory::Configuration => {
                "System configuration error. Please contact support."
            }
            ErrorCategory::Validation => {
                "Invalid request. Please check your message and try again."
            }
            ErrorCategory::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Ordered severity levels for classified errors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}
