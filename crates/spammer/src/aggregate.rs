//! Merging worker results after the join barrier.

use crate::operations::OperationLog;
use std::time::Duration;

/// Everything one worker accumulated over its shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub log: OperationLog,
    /// Transfers the ledger accepted.
    pub successes: u64,
    /// Transfers answered with `RetryAfter`.
    pub retryable_failures: u64,
    /// Round-trip latency of every transfer call, in shard order.
    pub latencies: Vec<Duration>,
}

impl WorkerReport {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Default::default()
        }
    }

    /// Number of transfers attempted.
    pub fn attempted(&self) -> u64 {
        self.successes + self.retryable_failures
    }
}

/// Global view of the transfer phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferTotals {
    pub log: OperationLog,
    pub successes: u64,
    pub retryable_failures: u64,
    pub latencies: Vec<Duration>,
    /// Workers incorporated so far.
    pub workers: usize,
}

impl TransferTotals {
    /// Fold one worker report in.
    pub fn absorb(&mut self, report: WorkerReport) {
        self.log.merge(report.log);
        self.successes += report.successes;
        self.retryable_failures += report.retryable_failures;
        self.latencies.extend(report.latencies);
        self.workers += 1;
    }

    /// Combine two partial aggregates.
    pub fn merge(mut self, other: TransferTotals) -> TransferTotals {
        self.log.merge(other.log);
        self.successes += other.successes;
        self.retryable_failures += other.retryable_failures;
        self.latencies.extend(other.latencies);
        self.workers += other.workers;
        self
    }
}

/// Merge every worker report into one [`TransferTotals`].
pub fn aggregate(reports: impl IntoIterator<Item = WorkerReport>) -> TransferTotals {
    let mut totals = TransferTotals::default();
    for report in reports {
        totals.absorb(report);
    }
    totals
}
