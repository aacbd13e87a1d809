//! Ledger client capability.
//!
//! The core only talks to the ledger through [`LedgerClient`]. Two
//! implementations ship with the crate:
//!
//! - [`HttpLedgerClient`]: JSON over HTTP against a running ledger service
//! - [`InMemoryLedger`]: an in-process ledger with fault injection, used for
//!   dry runs and tests

mod http;
mod memory;
mod types;

pub use http::{HttpLedgerClient, DEFAULT_BASE_URL};
pub use memory::{InMemoryLedger, DEFAULT_FIRST_ACCOUNT};
pub use types::*;

use async_trait::async_trait;
use ledger_types::{AccountId, AmountError, Money, TransferOutcome};

/// Remote ledger operations used by the spammer.
///
/// Implementations must be safe for concurrent independent use: every call
/// is a complete round trip and callers never lock around it.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Create an account funded with `balance`.
    async fn create_account(&self, balance: &Money) -> Result<AccountId, ClientError>;

    /// Transfer `amount` from `source` to `destination`.
    ///
    /// Returns `Success` or `RetryableFailure`. Fatal conditions are reported
    /// as `Err` so the raw response travels with the diagnostic.
    /// `Ok(FatalFailure)` breaks this contract; callers still treat it as
    /// fatal but have no response to report.
    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: &Money,
    ) -> Result<TransferOutcome, ClientError>;

    /// Current balance of `account`.
    async fn get_balance(&self, account: AccountId) -> Result<Money, ClientError>;
}

/// Errors returned by ledger clients. All of them are fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Ledger rejected {operation}: {body}")]
    Rejected {
        operation: &'static str,
        body: String,
    },

    #[error("Ledger response to {operation} is missing `{field}`: {body}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
        body: String,
    },

    #[error("Undecodable ledger response to {operation}: {body}")]
    Decode {
        operation: &'static str,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid amount in ledger response: {0}")]
    Amount(#[from] AmountError),
}
