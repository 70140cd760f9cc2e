// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch core: bounded queue, worker pool, and lifecycle bookkeeping.
//!
//! Producers call [`Dispatcher::enqueue`]; `max_workers` worker tasks pull
//! ids from the shared bounded queue in FIFO order, run the handler under the
//! per-message deadline, and commit terminal status and statistics. Because
//! workers pull concurrently, completion order is not arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use courier_core::{CourierError, MessageHandler, MessageId, MessageStatus, ProcessOutcome, QueuedMessage};

use crate::config::DispatcherConfig;
use crate::stats::{QueueStats, StatsTracker};
use crate::store::MessageStore;

/// How long an idle worker waits on the queue before rechecking the running
/// flag, so shutdown is prompt even when the queue stays empty.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

struct Shared {
    config: DispatcherConfig,
    store: MessageStore,
    tx: mpsc::Sender<MessageId>,
    /// Single receiver shared by all workers; held only while pulling.
    rx: Mutex<mpsc::Receiver<MessageId>>,
    running: AtomicBool,
    /// Records waiting for a free worker (queue depth).
    queued: AtomicUsize,
    /// Records enqueued but not yet marked consumed (drain counter).
    unfinished: AtomicUsize,
    drained: Notify,
    stats: Mutex<StatsTracker>,
}

/// Owns the bounded queue, the message registry, and the worker pool.
pub struct Dispatcher {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    cancel: Mutex<CancellationToken>,
}

impl Dispatcher {
    /// Create a dispatcher with a fresh, internally owned registry.
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_store(config, MessageStore::new())
    }

    /// Create a dispatcher around an injected registry, so the store can be
    /// owned and inspected by the caller (and tested in isolation).
    pub fn with_store(config: DispatcherConfig, store: MessageStore) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(1));
        Self {
            shared: Arc::new(Shared {
                config,
                store,
                tx,
                rx: Mutex::new(rx),
                running: AtomicBool::new(false),
                queued: AtomicUsize::new(0),
                unfinished: AtomicUsize::new(0),
                drained: Notify::new(),
                stats: Mutex::new(StatsTracker::default()),
            }),
            workers: Mutex::new(Vec::new()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Whether worker loops are currently active.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Create a pending record and push it onto the bounded queue.
    ///
    /// The push is non-blocking: when the queue is at capacity this fails
    /// immediately with [`CourierError::QueueFull`] and nothing is retained
    /// in the registry. The caller decides whether to notify or backpressure;
    /// this layer never retries.
    pub fn enqueue(
        &self,
        sender: impl Into<String>,
        text: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<MessageId, CourierError> {
        let message = QueuedMessage::new(
            sender,
            text,
            timestamp.unwrap_or_else(Utc::now),
            metadata.unwrap_or_default(),
        );
        let id = message.id().clone();
        let sender_label = message.sender().to_string();

        // Insert the record and account both counters before pushing, so a
        // worker that receives the id immediately can never decrement a
        // counter that has not been incremented yet. Roll everything back
        // when the push fails.
        self.shared.store.insert(message);
        let depth = self.shared.queued.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.unfinished.fetch_add(1, Ordering::SeqCst);

        match self.shared.tx.try_send(id.clone()) {
            Ok(()) => {
                info!(
                    message_id = %id,
                    sender = %sender_label,
                    queue_size = depth,
                    "message enqueued"
                );
                Ok(id)
            }
            Err(TrySendError::Full(_)) => {
                self.rollback_enqueue(&id);
                error!(
                    max_size = self.shared.config.max_size,
                    current_size = self.shared.queued.load(Ordering::SeqCst),
                    "queue is full, cannot enqueue message"
                );
                Err(CourierError::QueueFull {
                    capacity: self.shared.config.max_size,
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.rollback_enqueue(&id);
                Err(CourierError::Internal("dispatch queue is closed".into()))
            }
        }
    }

    /// Undo the registry insert and counter increments of a failed push.
    fn rollback_enqueue(&self, id: &MessageId) {
        self.shared.store.remove(id);
        self.shared.queued.fetch_sub(1, Ordering::SeqCst);
        // A drain in progress may be waiting on this very count.
        if self.shared.unfinished.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.drained.notify_waiters();
        }
    }

    /// Spawn the worker pool.
    ///
    /// No-op with a warning when already running.
    pub async fn start(&self, handler: Arc<dyn MessageHandler>) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            warn!("dispatcher already running");
            return;
        }

        info!(
            max_workers = self.shared.config.max_workers,
            max_size = self.shared.config.max_size,
            timeout_secs = self.shared.config.timeout_secs,
            "starting dispatcher"
        );

        let token = CancellationToken::new();
        *self.cancel.lock().await = token.clone();

        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.shared.config.max_workers {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&self.shared),
                Arc::clone(&handler),
                token.clone(),
            )));
        }
    }

    /// Stop the worker pool.
    ///
    /// With `wait = true`, first waits for every enqueued message to be
    /// marked consumed (drain), then cancels the workers. With `wait = false`
    /// the workers are cancelled immediately: a message mid-processing keeps
    /// its `Processing` status forever and its queue slot is never marked
    /// consumed. Restarting the dispatcher does not reclaim such records.
    pub async fn stop(&self, wait: bool) {
        if !self.shared.running.load(Ordering::SeqCst) {
            return;
        }

        info!(wait_for_empty = wait, "stopping dispatcher");

        if wait {
            loop {
                let notified = self.shared.drained.notified();
                tokio::pin!(notified);
                // Register as a waiter before reading the counter, so a
                // notify_waiters racing with the load cannot be lost.
                notified.as_mut().enable();
                if self.shared.unfinished.load(Ordering::SeqCst) == 0 {
                    break;
                }
                notified.await;
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
        self.cancel.lock().await.cancel();

        {
            let mut workers = self.workers.lock().await;
            for handle in workers.drain(..) {
                if let Err(err) = handle.await {
                    warn!(error = %err, "worker terminated abnormally");
                }
            }
        }

        let stats = self.get_stats().await;
        info!(
            total_processed = stats.total_processed,
            successful = stats.successful,
            failed = stats.failed,
            timeout = stats.timeout,
            "dispatcher stopped"
        );
    }

    /// A snapshot of the record's committed state, if the id is known.
    pub fn get_message(&self, id: &MessageId) -> Option<QueuedMessage> {
        self.shared.store.get(id)
    }

    /// A point-in-time statistics snapshot.
    pub async fn get_stats(&self) -> QueueStats {
        let active_workers = self.workers.lock().await.len();
        let tracker = self.shared.stats.lock().await;
        tracker.snapshot(
            self.shared.queued.load(Ordering::SeqCst),
            active_workers,
            self.shared.store.len(),
        )
    }
}

async fn worker_loop(
    worker_id: usize,
    shared: Arc<Shared>,
    handler: Arc<dyn MessageHandler>,
    cancel: CancellationToken,
) {
    info!(worker_id, "worker started");

    loop {
        let polled = {
            let mut rx = tokio::select! {
                guard = shared.rx.lock() => guard,
                _ = cancel.cancelled() => break,
            };
            tokio::select! {
                polled = tokio::time::timeout(POLL_INTERVAL, rx.recv()) => polled,
                _ = cancel.cancelled() => break,
            }
        };

        let id = match polled {
            Ok(Some(id)) => id,
            // The sender half is gone; nothing more will ever arrive.
            Ok(None) => break,
            Err(_) => {
                if !shared.running.load(Ordering::SeqCst) {
                    break;
                }
                continue;
            }
        };

        shared.queued.fetch_sub(1, Ordering::SeqCst);

        tokio::select! {
            _ = process_message(worker_id, &shared, handler.as_ref(), &id) => {
                // Mark the queue slot consumed regardless of outcome.
                if shared.unfinished.fetch_sub(1, Ordering::SeqCst) == 1 {
                    shared.drained.notify_waiters();
                }
            }
            _ = cancel.cancelled() => {
                // Abandoned mid-flight on non-waiting shutdown; the record
                // stays Processing and its slot is never marked consumed.
                break;
            }
        }
    }

    info!(worker_id, "worker stopped");
}

async fn process_message(
    worker_id: usize,
    shared: &Shared,
    handler: &dyn MessageHandler,
    id: &MessageId,
) {
    let begun = shared
        .store
        .update(id, |message| message.begin_processing().map(|()| message.clone()));

    let snapshot = match begun {
        Some(Ok(snapshot)) => snapshot,
        Some(Err(invalid)) => {
            warn!(worker_id, message_id = %id, error = %invalid, "skipping message in unexpected state");
            return;
        }
        None => {
            warn!(worker_id, message_id = %id, "message missing from registry");
            return;
        }
    };

    info!(
        worker_id,
        message_id = %id,
        sender = snapshot.sender(),
        "processing message"
    );

    let limit = shared.config.timeout();
    let outcome = match tokio::time::timeout(limit, handler.handle(&snapshot)).await {
        Ok(Ok(result)) => ProcessOutcome::Completed(result),
        Ok(Err(err)) => ProcessOutcome::Failed(err),
        // Best-effort cancellation only: the handler future is dropped, but
        // work it delegated elsewhere may still run to completion.
        Err(_) => ProcessOutcome::TimedOut { limit },
    };

    let status = outcome.status();
    match &outcome {
        ProcessOutcome::Completed(_) => {}
        ProcessOutcome::TimedOut { .. } => {
            error!(
                message_id = %id,
                timeout_secs = limit.as_secs_f64(),
                "message processing timeout"
            );
        }
        ProcessOutcome::Failed(err) => {
            error!(message_id = %id, error = %err, "message processing failed");
        }
    }

    let elapsed_secs = shared
        .store
        .update(id, |message| {
            if let Err(invalid) = message.finish(outcome) {
                warn!(message_id = %id, error = %invalid, "could not commit terminal status");
            }
            message.processing_time()
        })
        .flatten()
        .map(|elapsed| elapsed.as_secs_f64());

    if status == MessageStatus::Completed {
        if let Some(elapsed) = elapsed_secs {
            info!(
                message_id = %id,
                processing_time = elapsed,
                "message processed successfully"
            );
        }
    }

    shared.stats.lock().await.record(status, elapsed_secs);
}
