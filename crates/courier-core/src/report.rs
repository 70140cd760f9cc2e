// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classified errors and the user-facing error reporter.
//!
//! [`ClassifiedError`] pairs a technical failure with a taxonomy category,
//! a severity, and a user-safe message. [`ErrorReporter`] logs the technical
//! side with full context and returns only the sanitized text, so what
//! operators see and what end users see stay decoupled.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::error::{CourierError, ErrorCategory, ErrorSeverity};

/// A failure classified into the error taxonomy.
#[derive(Debug)]
pub struct ClassifiedError {
    message: String,
    category: ErrorCategory,
    severity: ErrorSeverity,
    user_message: Option<String>,
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    context: HashMap<String, String>,
    backtrace: Backtrace,
}

impl ClassifiedError {
    /// Classify a technical message with default category and severity
    /// (`Unknown` / `Medium`).
    ///
    /// A backtrace is captured at the classification site, subject to the
    /// standard `RUST_BACKTRACE` gating.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: ErrorCategory::Unknown,
            severity: ErrorSeverity::Medium,
            user_message: None,
            cause: None,
            context: HashMap::new(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Override the derived user-facing message.
    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = Some(user_message.into());
        self
    }

    /// Attach the wrapped original failure.
    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Add a diagnostic key/value pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// The user-facing message: the explicit override if one was supplied,
    /// otherwise the fixed sentence derived from the category.
    pub fn user_message(&self) -> &str {
        self.user_message
            .as_deref()
            .unwrap_or_else(|| self.category.default_user_message())
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        self.cause.as_deref()
    }

    pub fn context(&self) -> &HashMap<String, String> {
        &self.context
    }

    /// The backtrace captured where this error was classified.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl From<CourierError> for ClassifiedError {
    /// Classify an operational error under its own category, at `Medium`
    /// severity, keeping the original as the wrapped cause.
    fn from(err: CourierError) -> Self {
        let category = err.category();
        Self {
            message: err.to_string(),
            category,
            severity: ErrorSeverity::Medium,
            user_message: None,
            cause: Some(Box::new(err)),
            context: HashMap::new(),
            backtrace: Backtrace::capture(),
        }
    }
}

/// Logs classified errors and produces sanitized user-visible text.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    /// When false, [`report`](Self::report) returns an empty string and only logs.
    notify_user: bool,
    /// When true, the technical message is appended to the user message.
    include_details: bool,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self {
            notify_user: true,
            include_details: false,
        }
    }
}

impl ErrorReporter {
    pub fn new(notify_user: bool, include_details: bool) -> Self {
        Self {
            notify_user,
            include_details,
        }
    }

    /// Log the technical side of `err` at a severity-derived level and return
    /// the user-visible message.
    ///
    /// Returns an empty string when user notification is disabled.
    pub fn report(&self, err: &ClassifiedError, actor_id: Option<&str>) -> String {
        self.log(err, actor_id);

        if !self.notify_user {
            return String::new();
        }

        let mut visible = format!("\u{26a0}\u{fe0f} {}", err.user_message());
        if self.include_details && !err.message().is_empty() {
            visible.push_str("\n\nDetails: ");
            visible.push_str(err.message());
        }
        visible
    }

    fn log(&self, err: &ClassifiedError, actor_id: Option<&str>) {
        let cause = err.cause().map(|c| c.to_string());
        let cause = cause.as_deref();
        let backtrace = match err.backtrace().status() {
            BacktraceStatus::Captured => Some(err.backtrace().to_string()),
            _ => None,
        };
        let backtrace = backtrace.as_deref();
        match err.severity() {
            ErrorSeverity::Critical => error!(
                category = %err.category(),
                severity = %err.severity(),
                actor_id,
                cause,
                backtrace,
                context = ?err.context(),
                "{}",
                err.message()
            ),
            ErrorSeverity::High => error!(
                category = %err.category(),
                severity = %err.severity(),
                actor_id,
                cause,
                backtrace,
                context = ?err.context(),
                "{}",
                err.message()
            ),
            ErrorSeverity::Medium => warn!(
                category = %err.category(),
                severity = %err.severity(),
                actor_id,
                cause,
                context = ?err.context(),
                "{}",
                err.message()
            ),
            ErrorSeverity::Low => info!(
                category = %err.category(),
                severity = %err.severity(),
                actor_id,
                cause,
                context = ?err.context(),
                "{}",
                err.message()
            ),
        }
    }
}
