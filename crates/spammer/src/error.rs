//! Error types for spammer runs.

use crate::client::ClientError;
use crate::config::ConfigError;
use ledger_types::{AccountId, AmountError, Money};
use thiserror::Error;

/// Errors that end a run.
///
/// Retryable ledger answers never show up here: they are counted by the
/// workers and the run carries on.
#[derive(Debug, Error)]
pub enum SpammerError {
    /// Configuration values are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An amount could not be encoded.
    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    /// Client construction failed.
    #[error("Ledger client error: {0}")]
    Client(#[from] ClientError),

    /// A transfer failed fatally.
    #[error("Failed to transfer: worker={worker}, src={from}, dst={to}, amount={amount}: {cause}")]
    TransferFailed {
        worker: usize,
        from: AccountId,
        to: AccountId,
        amount: Money,
        #[source]
        cause: ClientError,
    },

    /// Account creation failed.
    #[error("Failed to create account #{index}: {cause}")]
    Provisioning {
        index: usize,
        #[source]
        cause: ClientError,
    },

    /// A balance query failed during verification.
    #[error("Failed to get balance: account={account}: {cause}")]
    BalanceQuery {
        account: AccountId,
        #[source]
        cause: ClientError,
    },

    /// The ledger's balance disagrees with the accepted transfers.
    #[error(
        "Incorrect balance: account={account}, expected={expected}, actual={observed}, ops={operations:?}"
    )]
    BalanceMismatch {
        account: AccountId,
        expected: Money,
        observed: Money,
        operations: Vec<i64>,
    },

    /// No initial balance is known for a touched account.
    #[error("No initial balance known for account {0}")]
    UnknownInitialBalance(AccountId),

    /// Expected balance does not fit the decimal range.
    #[error("Expected balance overflows for account {0}")]
    BalanceOverflow(AccountId),

    /// A worker stopped early because another worker failed.
    #[error("Worker {worker} cancelled")]
    Cancelled { worker: usize },

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),

    /// The run report could not be built.
    #[error("Report error: {0}")]
    Report(String),
}

impl SpammerError {
    /// Whether this error only reflects cancellation caused by another failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SpammerError::Cancelled { .. })
    }
}
