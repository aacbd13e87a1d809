//! In-process ledger.
//!
//! Applies transfers atomically under a mutex that is never held across an
//! await. Faults can be injected to exercise the retryable and fatal paths.

use super::{ClientError, LedgerClient};
use async_trait::async_trait;
use ledger_types::{AccountId, Currency, Decimal, Money, TransferOutcome};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// First id handed out by [`InMemoryLedger::new`], matching the reference service.
pub const DEFAULT_FIRST_ACCOUNT: AccountId = AccountId(1_000_000_001);

#[derive(Debug)]
struct LedgerState {
    balances: BTreeMap<AccountId, Decimal>,
    next_account: u64,
    transfers: u64,
}

/// Thread-safe in-memory ledger implementing [`LedgerClient`].
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    currency: Currency,
    retry_every: Option<u64>,
    reject_every: Option<u64>,
}

impl InMemoryLedger {
    /// Create an empty ledger for `currency`.
    pub fn new(currency: Currency) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balances: BTreeMap::new(),
                next_account: DEFAULT_FIRST_ACCOUNT.0,
                transfers: 0,
            }),
            currency,
            retry_every: None,
            reject_every: None,
        }
    }

    /// Create a ledger with `accounts` already funded with `balance`.
    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountId>, balance: Money) -> Self {
        let ledger = Self::new(balance.currency());
        {
            let mut state = ledger.state.lock();
            for account in accounts {
                state.balances.insert(account, balance.amount());
                state.next_account = state.next_account.max(account.0.saturating_add(1));
            }
        }
        ledger
    }

    /// Answer every n-th transfer with `RetryAfter` without applying it.
    pub fn with_retry_every(mut self, n: u64) -> Self {
        self.retry_every = (n > 0).then_some(n);
        self
    }

    /// Answer every n-th transfer with a fatal application error.
    pub fn with_reject_every(mut self, n: u64) -> Self {
        self.reject_every = (n > 0).then_some(n);
        self
    }

    /// Current balance of an account, if it exists.
    pub fn balance_of(&self, account: AccountId) -> Option<Money> {
        self.state
            .lock()
            .balances
            .get(&account)
            .map(|amount| Money::new(*amount, self.currency))
    }

    /// Number of transfer requests received so far.
    pub fn transfer_requests(&self) -> u64 {
        self.state.lock().transfers
    }

    /// Number of accounts.
    pub fn num_accounts(&self) -> usize {
        self.state.lock().balances.len()
    }

    fn application_error(operation: &'static str, code: &str, message: &str) -> ClientError {
        ClientError::Rejected {
            operation,
            body: serde_json::json!({
                "errors": { "application": { "code": code, "message": message } }
            })
            .to_string(),
        }
    }

    fn check_currency(&self, operation: &'static str, money: &Money) -> Result<(), ClientError> {
        if money.currency() == self.currency {
            Ok(())
        } else {
            Err(Self::application_error(
                operation,
                "CurrencyMismatch",
                "Currency differs from ledger currency",
            ))
        }
    }
}

fn hits(every: Option<u64>, count: u64) -> bool {
    every.is_some_and(|n| count % n == 0)
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_account(&self, balance: &Money) -> Result<AccountId, ClientError> {
        self.check_currency("create account", balance)?;

        let mut state = self.state.lock();
        let account = AccountId(state.next_account);
        state.next_account += 1;
        state.balances.insert(account, balance.amount());
        Ok(account)
    }

    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: &Money,
    ) -> Result<TransferOutcome, ClientError> {
        const OPERATION: &str = "transfer";
        self.check_currency(OPERATION, amount)?;

        let mut state = self.state.lock();
        state.transfers += 1;
        let count = state.transfers;

        if hits(self.retry_every, count) {
            return Ok(TransferOutcome::RetryableFailure);
        }
        if hits(self.reject_every, count) {
            return Err(Self::application_error(
                OPERATION,
                "InjectedFault",
                "Injected fatal failure",
            ));
        }
        if source == destination {
            return Err(Self::application_error(
                OPERATION,
                "SameAccount",
                "Source and destination are the same account",
            ));
        }

        let (Some(&from), Some(&to)) = (
            state.balances.get(&source),
            state.balances.get(&destination),
        ) else {
            return Err(Self::application_error(
                OPERATION,
                "AccountNotFound",
                "Account not found",
            ));
        };

        let value = amount.amount();
        if from < value {
            return Err(Self::application_error(
                OPERATION,
                "InsufficientSourceBalance",
                "Insufficient balance on source account",
            ));
        }

        state.balances.insert(source, from - value);
        state.balances.insert(destination, to + value);
        Ok(TransferOutcome::Success)
    }

    async fn get_balance(&self, account: AccountId) -> Result<Money, ClientError> {
        self.balance_of(account).ok_or_else(|| {
            Self::application_error("get balance", "AccountNotFound", "Account not found")
        })
    }
}
