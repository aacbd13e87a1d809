//! Per-account log of accepted transfers.

use ledger_types::AccountId;
use std::collections::BTreeMap;

/// Signed balance deltas per account, one entry per accepted transfer.
///
/// The source of a transfer gets `-amount`, the destination `+amount`.
/// Entries keep their recording order so a drifting account can be traced
/// back to the operation that caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLog {
    entries: BTreeMap<AccountId, Vec<i64>>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one delta for `account`.
    pub fn record(&mut self, account: AccountId, delta: i64) {
        self.entries.entry(account).or_default().push(delta);
    }

    /// Record an accepted transfer on both sides.
    pub fn record_transfer(&mut self, source: AccountId, destination: AccountId, amount: i64) {
        self.record(source, -amount);
        self.record(destination, amount);
    }

    /// Deltas recorded for `account`, in recording order.
    pub fn operations(&self, account: AccountId) -> &[i64] {
        self.entries.get(&account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Net delta for `account`.
    pub fn net(&self, account: AccountId) -> i64 {
        self.operations(account).iter().sum()
    }

    /// Sum of every entry. Zero whenever the log only holds whole transfers.
    pub fn total(&self) -> i64 {
        self.entries.values().flatten().sum()
    }

    /// Accounts with at least one entry, ascending.
    pub fn accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AccountId, &[i64])> + '_ {
        self.entries.iter().map(|(account, ops)| (*account, ops.as_slice()))
    }

    /// Number of accounts touched.
    pub fn num_accounts(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries across all accounts.
    pub fn num_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absorb `other`: union of accounts, concatenation of their entries.
    ///
    /// The empty log is the identity. Merging is associative, and commutative
    /// up to the order of entries within an account.
    pub fn merge(&mut self, other: OperationLog) {
        for (account, mut ops) in other.entries {
            self.entries.entry(account).or_default().append(&mut ops);
        }
    }

    /// Per-account entries sorted, for order-insensitive comparison.
    pub fn as_multisets(&self) -> BTreeMap<AccountId, Vec<i64>> {
        self.entries
            .iter()
            .map(|(account, ops)| {
                let mut ops = ops.clone();
                ops.sort_unstable();
                (*account, ops)
            })
            .collect()
    }
}

impl FromIterator<(AccountId, i64)> for OperationLog {
    fn from_iter<T: IntoIterator<Item = (AccountId, i64)>>(iter: T) -> Self {
        let mut log = OperationLog::new();
        for (account, delta) in iter {
            log.record(account, delta);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: AccountId = AccountId(1);
    const B: AccountId = AccountId(2);
    const C: AccountId = AccountId(3);

    #[test]
    fn test_transfer_entries_cancel_out() {
        let mut log = OperationLog::new();
        log.record_transfer(A, B, 20);
        log.record_transfer(B, C, 15);
        log.record_transfer(C, A, 7);

        assert_eq!(log.operations(A), &[-20, 7]);
        assert_eq!(log.operations(B), &[20, -15]);
        assert_eq!(log.operations(C), &[15, -7]);
        assert_eq!(log.total(), 0);
        assert_eq!(log.num_entries(), 6);
        assert_eq!(log.net(A), -13);
    }

    #[test]
    fn test_merge_concatenates() {
        let mut left: OperationLog = [(A, -20), (B, 20)].into_iter().collect();
        let right: OperationLog = [(B, -5), (C, 5)].into_iter().collect();
        left.merge(right);

        assert_eq!(left.operations(B), &[20, -5]);
        assert_eq!(left.num_accounts(), 3);
        assert_eq!(left.total(), 0);
    }

    #[test]
    fn test_empty_log_is_identity() {
        let log: OperationLog = [(A, -3), (B, 3)].into_iter().collect();

        let mut left = OperationLog::new();
        left.merge(log.clone());
        assert_eq!(left, log);

        let mut right = log.clone();
        right.merge(OperationLog::new());
        assert_eq!(right, log);
    }

    #[test]
    fn test_unknown_account_has_no_operations() {
        let log = OperationLog::new();
        assert!(log.operations(A).is_empty());
        assert_eq!(log.net(A), 0);
        assert!(log.is_empty());
    }
}
