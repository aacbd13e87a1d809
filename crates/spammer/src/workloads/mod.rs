//! Workload generation.
//!
//! The transfer scenario attempts every ordered pair of the account pool
//! twice, in a globally shuffled order. Each attempt's direction and amount
//! are chosen by a [`TransferPolicy`] owned by the worker that executes it.

mod transfer;

pub use transfer::{AmountRange, FixedTransfers, PlannedTransfer, RandomTransfers};

use ledger_types::AccountId;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// An ordered pair of distinct accounts, as generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountPair {
    pub first: AccountId,
    pub second: AccountId,
}

impl AccountPair {
    pub fn new(first: AccountId, second: AccountId) -> Self {
        Self { first, second }
    }

    /// The same pair with the direction swapped.
    pub fn reversed(self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }
}

impl fmt::Display for AccountPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Chooses direction and amount for each attempted transfer.
pub trait TransferPolicy {
    /// Plan the transfer for one pair of the shard.
    fn plan(&mut self, pair: AccountPair) -> PlannedTransfer;
}

/// Every ordered pair `(a, b)` with `a != b`, in pool order.
pub fn ordered_pairs(accounts: &[AccountId]) -> Vec<AccountPair> {
    let mut pairs = Vec::with_capacity(accounts.len() * accounts.len().saturating_sub(1));
    for (i, &a) in accounts.iter().enumerate() {
        for (j, &b) in accounts.iter().enumerate() {
            if i != j {
                pairs.push(AccountPair::new(a, b));
            }
        }
    }
    pairs
}

/// Build the full shuffled workload.
///
/// Every ordered pair appears exactly twice, so each unordered pair is
/// attempted the same number of times in both directions. Fewer than two
/// accounts yield an empty workload.
pub fn generate_pairs<R: Rng + ?Sized>(accounts: &[AccountId], rng: &mut R) -> Vec<AccountPair> {
    let base = ordered_pairs(accounts);
    let mut pairs = Vec::with_capacity(base.len() * 2);
    pairs.extend_from_slice(&base);
    pairs.extend(base.iter().rev().copied());
    pairs.shuffle(rng);
    pairs
}
