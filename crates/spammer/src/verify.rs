//! Balance verification.
//!
//! After the transfer phase, every account that appears in the merged
//! operation log must hold exactly its initial balance plus the sum of its
//! logged deltas. Balances are compared in minor units.

use crate::client::LedgerClient;
use crate::error::SpammerError;
use crate::operations::OperationLog;
use futures::stream::{self, StreamExt, TryStreamExt};
use ledger_types::{AccountId, Money};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Starting balances of the accounts under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialBalances {
    /// Every account started with the same balance.
    Uniform(Money),
    /// Each account has its own starting balance.
    PerAccount(BTreeMap<AccountId, Money>),
}

impl InitialBalances {
    pub fn for_account(&self, account: AccountId) -> Option<Money> {
        match self {
            InitialBalances::Uniform(balance) => Some(*balance),
            InitialBalances::PerAccount(balances) => balances.get(&account).copied(),
        }
    }
}

/// One account's expected and observed balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCheck {
    pub account: AccountId,
    pub expected: Money,
    pub observed: Money,
}

/// Every account that passed verification, ascending by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub checks: Vec<BalanceCheck>,
}

impl VerificationReport {
    pub fn accounts_verified(&self) -> usize {
        self.checks.len()
    }
}

/// Expected balance after applying `operations` to `initial`.
pub fn expected_balance(
    account: AccountId,
    initial: Money,
    operations: &[i64],
) -> Result<Money, SpammerError> {
    let net = operations
        .iter()
        .try_fold(0i64, |acc, delta| acc.checked_add(*delta))
        .ok_or(SpammerError::BalanceOverflow(account))?;
    initial
        .checked_add_units(net)
        .ok_or(SpammerError::BalanceOverflow(account))
}

/// Checks ledger balances against an operation log.
pub struct BalanceVerifier<'a, C: ?Sized> {
    client: &'a C,
    initial: InitialBalances,
    concurrency: usize,
}

impl<'a, C: LedgerClient + ?Sized> BalanceVerifier<'a, C> {
    pub fn new(client: &'a C, initial: InitialBalances) -> Self {
        Self {
            client,
            initial,
            concurrency: 1,
        }
    }

    /// Number of balance queries allowed in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Verify every account present in `log`.
    ///
    /// Accounts are checked in ascending id order; the first mismatch ends
    /// verification with [`SpammerError::BalanceMismatch`], which carries the
    /// account's full operation list.
    pub async fn verify(&self, log: &OperationLog) -> Result<VerificationReport, SpammerError> {
        let expectations = log
            .iter()
            .map(|(account, operations)| {
                let initial = self
                    .initial
                    .for_account(account)
                    .ok_or(SpammerError::UnknownInitialBalance(account))?;
                let expected = expected_balance(account, initial, operations)?;
                Ok((account, expected))
            })
            .collect::<Result<Vec<_>, SpammerError>>()?;

        info!(accounts = expectations.len(), "Verifying balances");

        // `buffered` keeps results in account order while queries overlap.
        let observed: Vec<(AccountId, Money, Money)> = stream::iter(expectations)
            .map(|(account, expected)| async move {
                let observed = self
                    .client
                    .get_balance(account)
                    .await
                    .map_err(|cause| SpammerError::BalanceQuery { account, cause })?;
                Ok::<_, SpammerError>((account, expected, observed))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut report = VerificationReport::default();
        for (account, expected, observed) in observed {
            if !same_balance(&expected, &observed)? {
                return Err(SpammerError::BalanceMismatch {
                    account,
                    expected,
                    observed,
                    operations: log.operations(account).to_vec(),
                });
            }
            debug!(%account, balance = %observed, "Account was checked successfully");
            report.checks.push(BalanceCheck {
                account,
                expected,
                observed,
            });
        }

        info!(
            accounts = report.accounts_verified(),
            "All balances verified"
        );
        Ok(report)
    }
}

fn same_balance(expected: &Money, observed: &Money) -> Result<bool, SpammerError> {
    Ok(expected.currency() == observed.currency()
        && expected.to_minor_units()? == observed.to_minor_units()?)
}
