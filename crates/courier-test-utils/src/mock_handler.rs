// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock message handlers for deterministic testing.
//!
//! [`MockHandler`] implements [`MessageHandler`] with a scripted FIFO of
//! behaviors, enabling fast, CI-runnable tests without external services.
//! [`FnHandler`] adapts a plain async closure to the handler contract.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{CourierError, MessageHandler, QueuedMessage};

/// One scripted handler behavior.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the given result immediately.
    Reply(String),
    /// Sleep for the duration, then return the given result.
    ReplyAfter(String, Duration),
    /// Return an internal error with the given message.
    Fail(String),
}

/// A mock handler that pops scripted behaviors from a FIFO queue.
///
/// When the script is empty, the default behavior is used. Every invocation
/// is counted, whether or not it completes before a dispatcher deadline.
pub struct MockHandler {
    script: Arc<Mutex<VecDeque<MockBehavior>>>,
    default: MockBehavior,
    calls: AtomicUsize,
}

impl MockHandler {
    /// A handler that always replies with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_default(MockBehavior::Reply(text.into()))
    }

    /// A handler that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(MockBehavior::Fail(message.into()))
    }

    /// A handler that sleeps for `delay` before replying with `text`.
    pub fn sleeping(delay: Duration, text: impl Into<String>) -> Self {
        Self::with_default(MockBehavior::ReplyAfter(text.into(), delay))
    }

    /// A handler with an explicit behavior script; `default` applies once the
    /// script runs out.
    pub fn scripted(script: Vec<MockBehavior>, default: MockBehavior) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(script))),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_default(default: MockBehavior) -> Self {
        Self::scripted(Vec::new(), default)
    }

    /// Number of times `handle` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next_behavior(&self) -> MockBehavior {
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl MessageHandler for MockHandler {
    async fn handle(&self, _message: &QueuedMessage) -> Result<String, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_behavior().await {
            MockBehavior::Reply(text) => Ok(text),
            MockBehavior::ReplyAfter(text, delay) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            MockBehavior::Fail(message) => Err(CourierError::Internal(message)),
        }
    }
}

/// Adapts an async closure over an owned record snapshot to [`MessageHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(QueuedMessage) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<String, CourierError>> + Send,
{
    async fn handle(&self, message: &QueuedMessage) -> Result<String, CourierError> {
        (self.0)(message.clone()).await
    }
}
