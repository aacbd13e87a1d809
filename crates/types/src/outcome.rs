//! Classification of a single transfer attempt.

use std::fmt;

/// What the ledger did with one transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferOutcome {
    /// The ledger reported a success status; the transfer was applied.
    Success,

    /// The ledger asked to retry later; nothing was applied.
    ///
    /// Expected under contention. Never replayed within a run.
    RetryableFailure,

    /// Any other application error, a malformed response, or a transport failure.
    FatalFailure,
}

impl TransferOutcome {
    /// Check if the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransferOutcome::FatalFailure)
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Success => f.write_str("success"),
            TransferOutcome::RetryableFailure => f.write_str("retryable failure"),
            TransferOutcome::FatalFailure => f.write_str("fatal failure"),
        }
    }
}
