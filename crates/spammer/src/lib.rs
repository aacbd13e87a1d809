//! Ledger Transfer Spammer
//!
//! A correctness-oriented load generator for a remote ledger service. It
//! fires concurrent transfers between a fixed pool of accounts, classifies
//! the ledger's answers, and afterwards proves that every account's balance
//! equals its initial balance plus exactly the transfers that were accepted.
//!
//! # Architecture
//!
//! - **Workload**: every ordered pair of the pool, twice, globally shuffled
//! - **Partitioning**: one contiguous shard per worker, remainder to the last
//! - **Workers**: one tokio task per shard with a private operation log
//! - **Aggregation**: worker reports merged after all workers have finished
//! - **Verification**: expected balances recomputed and compared per account
//!
//! # Example
//!
//! ```ignore
//! use ledger_spammer::{HttpLedgerClient, Spammer, SpammerConfig};
//! use std::sync::Arc;
//!
//! let config = SpammerConfig::new("http://localhost:18080/bank/api")
//!     .with_account_count(50)
//!     .with_worker_count(10);
//! let client = Arc::new(HttpLedgerClient::new(&config.base_url, config.request_timeout)?);
//!
//! let spammer = Spammer::new(config, client)?;
//! let report = spammer.run().await?;
//! report.print();
//! ```

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod partition;
pub mod provision;
pub mod report;
pub mod runner;
pub mod verify;
pub mod worker;
pub mod workloads;

pub use aggregate::{aggregate, TransferTotals, WorkerReport};
pub use client::{ClientError, HttpLedgerClient, InMemoryLedger, LedgerClient};
pub use config::{ConfigError, SpammerConfig};
pub use error::SpammerError;
pub use operations::OperationLog;
pub use partition::{partition, WorkShard};
pub use report::RunReport;
pub use runner::Spammer;
pub use verify::{BalanceVerifier, InitialBalances, VerificationReport};
pub use worker::TransferWorker;
pub use workloads::{generate_pairs, AccountPair, AmountRange, TransferPolicy};
