//! Run report.

use crate::aggregate::TransferTotals;
use crate::error::SpammerError;
use crate::verify::VerificationReport;
use hdrhistogram::Histogram;
use std::fmt;
use std::time::Duration;

/// Highest latency tracked by the histogram, in microseconds.
const MAX_TRACKED_LATENCY_US: u64 = 3_600_000_000;

/// Summary of a completed and verified run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Transfers attempted.
    pub pairs: usize,
    /// Transfers the ledger accepted.
    pub successes: u64,
    /// Transfers answered with `RetryAfter`.
    pub retryable_failures: u64,
    /// Accounts whose balance was verified.
    pub accounts_verified: usize,
    /// Wall time of the transfer and verification phases.
    pub elapsed: Duration,
    /// Per-transfer round-trip latency, in microseconds.
    pub latency: Histogram<u64>,
}

impl RunReport {
    /// Build the report from the merged worker results and the verification outcome.
    pub fn new(
        pairs: usize,
        totals: &TransferTotals,
        verification: &VerificationReport,
        elapsed: Duration,
    ) -> Result<Self, SpammerError> {
        let mut latency = Histogram::<u64>::new_with_bounds(1, MAX_TRACKED_LATENCY_US, 3)
            .map_err(|e| SpammerError::Report(e.to_string()))?;
        for sample in &totals.latencies {
            latency.saturating_record(sample.as_micros().min(u64::MAX as u128) as u64);
        }

        Ok(Self {
            pairs,
            successes: totals.successes,
            retryable_failures: totals.retryable_failures,
            accounts_verified: verification.accounts_verified(),
            elapsed,
            latency,
        })
    }

    /// Accepted transfers per second of wall time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.successes as f64 / secs
        } else {
            0.0
        }
    }

    /// Latency at `quantile` (0.0 to 1.0), if any transfer was timed.
    pub fn latency_at(&self, quantile: f64) -> Option<Duration> {
        (!self.latency.is_empty())
            .then(|| Duration::from_micros(self.latency.value_at_quantile(quantile)))
    }

    pub fn p50_latency(&self) -> Option<Duration> {
        self.latency_at(0.50)
    }

    pub fn p99_latency(&self) -> Option<Duration> {
        self.latency_at(0.99)
    }

    /// Print a human-readable summary to stdout.
    pub fn print(&self) {
        println!();
        println!("{self}");
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Transfer Run Report ===")?;
        writeln!(f, "Duration:           {:.2?}", self.elapsed)?;
        writeln!(f, "Transfers:          {}", self.pairs)?;
        writeln!(f, "Accepted:           {}", self.successes)?;
        writeln!(f, "Total fails:        {}", self.retryable_failures)?;
        writeln!(f, "Throughput:         {:.2} transfers/s", self.throughput())?;
        if let (Some(p50), Some(p99)) = (self.p50_latency(), self.p99_latency()) {
            writeln!(
                f,
                "Latency:            p50={:.2?} p90={:.2?} p99={:.2?} max={:.2?}",
                p50,
                Duration::from_micros(self.latency.value_at_quantile(0.90)),
                p99,
                Duration::from_micros(self.latency.max()),
            )?;
        }
        writeln!(f, "Accounts verified:  {}", self.accounts_verified)?;
        write!(f, "===========================")
    }
}
