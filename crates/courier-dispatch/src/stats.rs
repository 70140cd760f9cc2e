// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate processing statistics.

use serde::Serialize;

use courier_core::MessageStatus;

/// Point-in-time statistics snapshot, as consumed by operators/monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    /// Messages that reached a terminal status.
    pub total_processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub timeout: u64,
    /// Running arithmetic mean of per-message processing time, in seconds.
    pub avg_processing_time: f64,
    /// Records currently waiting for a free worker.
    pub queue_size: usize,
    /// Worker tasks currently spawned.
    pub active_workers: usize,
    /// Records retained in the registry.
    pub total_messages: usize,
}

/// Accumulates terminal outcomes and the running processing-time average.
#[derive(Debug, Default)]
pub struct StatsTracker {
    total_processed: u64,
    successful: u64,
    failed: u64,
    timeout: u64,
    avg_processing_time: f64,
}

impl StatsTracker {
    /// Record one terminal outcome.
    ///
    /// Non-terminal statuses are ignored. The average is updated as
    /// `(avg * (n - 1) + elapsed) / n` with `n` the new processed count.
    pub fn record(&mut self, status: MessageStatus, elapsed_secs: Option<f64>) {
        match status {
            MessageStatus::Completed => self.successful += 1,
            MessageStatus::Failed => self.failed += 1,
            MessageStatus::TimedOut => self.timeout += 1,
            MessageStatus::Pending | MessageStatus::Processing => return,
        }
        self.total_processed += 1;

        if let Some(elapsed) = elapsed_secs {
            let n = self.total_processed as f64;
            self.avg_processing_time = (self.avg_processing_time * (n - 1.0) + elapsed) / n;
        }
    }

    /// Build a full snapshot, merging in the live gauge values.
    pub fn snapshot(
        &self,
        queue_size: usize,
        active_workers: usize,
        total_messages: usize,
    ) -> QueueStats {
        QueueStats {
            total_processed: self.total_processed,
            successful: self.successful,
            failed: self.failed,
            timeout: self.timeout,
            avg_processing_time: self.avg_processing_time,
            queue_size,
            active_workers,
            total_messages,
        }
    }
}
