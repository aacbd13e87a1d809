//! Transfer worker.
//!
//! A worker owns one shard, its own transfer policy and its own report. It
//! shares nothing mutable with other workers; the ledger client is the only
//! shared resource.

use crate::aggregate::WorkerReport;
use crate::client::{ClientError, LedgerClient};
use crate::error::SpammerError;
use crate::partition::WorkShard;
use crate::workloads::TransferPolicy;
use ledger_types::{Currency, Money, TransferOutcome};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Executes one shard of transfers, strictly in order.
pub struct TransferWorker<C: ?Sized, P> {
    id: usize,
    client: Arc<C>,
    policy: P,
    currency: Currency,
    cancel: CancellationToken,
}

impl<C, P> TransferWorker<C, P>
where
    C: LedgerClient + ?Sized,
    P: TransferPolicy,
{
    /// Create a worker.
    pub fn new(id: usize, client: Arc<C>, policy: P, currency: Currency) -> Self {
        Self {
            id,
            client,
            policy,
            currency,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between operations once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every pair of `shard`.
    ///
    /// Accepted transfers are logged on both accounts, `RetryAfter` answers
    /// are counted and skipped, and anything else stops the worker with
    /// [`SpammerError::TransferFailed`]. An operation already in flight always
    /// completes; cancellation is only observed before starting the next one.
    pub async fn run(mut self, shard: WorkShard) -> Result<WorkerReport, SpammerError> {
        let mut report = WorkerReport::new(self.id);
        report.latencies.reserve(shard.len());

        debug!(
            worker = self.id,
            start = shard.start,
            pairs = shard.len(),
            "Worker starting"
        );

        for pair in shard.pairs {
            if self.cancel.is_cancelled() {
                info!(
                    worker = self.id,
                    completed = report.attempted(),
                    "Worker cancelled"
                );
                return Err(SpammerError::Cancelled { worker: self.id });
            }

            let planned = self.policy.plan(pair);
            let amount = Money::from_units(planned.amount, self.currency);

            let started = Instant::now();
            let result = self
                .client
                .transfer(planned.source, planned.destination, &amount)
                .await;
            report.latencies.push(started.elapsed());

            match result {
                Ok(TransferOutcome::Success) => {
                    report
                        .log
                        .record_transfer(planned.source, planned.destination, planned.amount);
                    report.successes += 1;
                    debug!(
                        worker = self.id,
                        src = %planned.source,
                        dst = %planned.destination,
                        amount = planned.amount,
                        "Transfer accepted"
                    );
                }
                Ok(TransferOutcome::RetryableFailure) => {
                    report.retryable_failures += 1;
                    warn!(
                        worker = self.id,
                        src = %planned.source,
                        dst = %planned.destination,
                        amount = planned.amount,
                        "Transfer asked to retry later, skipping"
                    );
                }
                Ok(TransferOutcome::FatalFailure) => {
                    return Err(SpammerError::TransferFailed {
                        worker: self.id,
                        from: planned.source,
                        to: planned.destination,
                        amount,
                        cause: ClientError::Rejected {
                            operation: "transfer",
                            body: "<client contract violation: FatalFailure returned as Ok, \
                                   no response body available>"
                                .to_string(),
                        },
                    });
                }
                Err(cause) => {
                    return Err(SpammerError::TransferFailed {
                        worker: self.id,
                        from: planned.source,
                        to: planned.destination,
                        amount,
                        cause,
                    });
                }
            }
        }

        info!(
            worker = self.id,
            successes = report.successes,
            retryable_failures = report.retryable_failures,
            "Worker finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryLedger;
    use crate::workloads::{AccountPair, FixedTransfers, PlannedTransfer};
    use async_trait::async_trait;
    use ledger_types::AccountId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    /// Answers every transfer the same way and counts the calls.
    struct ScriptedLedger {
        outcome: Option<TransferOutcome>,
        calls: AtomicUsize,
    }

    impl ScriptedLedger {
        fn answering(outcome: Option<TransferOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LedgerClient for ScriptedLedger {
        async fn create_account(&self, _balance: &Money) -> Result<AccountId, ClientError> {
            unreachable!("workers never create accounts")
        }

        async fn transfer(
            &self,
            _source: AccountId,
            _destination: AccountId,
            _amount: &Money,
        ) -> Result<TransferOutcome, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.ok_or_else(|| ClientError::Rejected {
                operation: "transfer",
                body: r#"{"errors":{"application":{"code":"AccountNotFound"}}}"#.to_string(),
            })
        }

        async fn get_balance(&self, _account: AccountId) -> Result<Money, ClientError> {
            unreachable!("workers never query balances")
        }
    }

    /// Replays a fixed list of (source-is-first, amount) decisions.
    struct Script(std::vec::IntoIter<(bool, i64)>);

    impl TransferPolicy for Script {
        fn plan(&mut self, pair: AccountPair) -> PlannedTransfer {
            let (forward, amount) = self.0.next().unwrap();
            let pair = if forward { pair } else { pair.reversed() };
            PlannedTransfer {
                source: pair.first,
                destination: pair.second,
                amount,
            }
        }
    }

    fn shard(pairs: &[(u64, u64)]) -> WorkShard {
        WorkShard {
            worker: 0,
            start: 0,
            pairs: pairs
                .iter()
                .map(|&(a, b)| AccountPair::new(AccountId(a), AccountId(b)))
                .collect(),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_retryable_failures_are_counted_not_logged() {
        let client = ScriptedLedger::answering(Some(TransferOutcome::RetryableFailure));
        let shard = shard(&[(1, 2), (2, 3), (3, 1), (1, 3), (2, 1)]);

        let report = TransferWorker::new(0, client.clone(), FixedTransfers::new(10), Currency::Usd)
            .run(shard)
            .await
            .unwrap();

        assert!(report.log.is_empty());
        assert_eq!(report.retryable_failures, 5);
        assert_eq!(report.successes, 0);
        assert_eq!(report.latencies.len(), 5);
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
        assert!(logs_contain("retry later"));
    }

    #[tokio::test]
    async fn test_successes_are_logged_on_both_sides() {
        let ledger = Arc::new(InMemoryLedger::with_accounts(
            (1..=3).map(AccountId),
            Money::from_units(1_000, Currency::Usd),
        ));
        let policy = Script(vec![(true, 20), (false, 15), (true, 5)].into_iter());
        let shard = shard(&[(1, 2), (1, 2), (2, 3)]);

        let report = TransferWorker::new(3, ledger.clone(), policy, Currency::Usd)
            .run(shard)
            .await
            .unwrap();

        assert_eq!(report.worker, 3);
        assert_eq!(report.successes, 3);
        assert_eq!(report.log.operations(AccountId(1)), &[-20, 15]);
        assert_eq!(report.log.operations(AccountId(2)), &[20, -15, -5]);
        assert_eq!(report.log.operations(AccountId(3)), &[5]);
        assert_eq!(report.log.total(), 0);
        assert_eq!(
            ledger.balance_of(AccountId(2)),
            Some(Money::from_units(1_000, Currency::Usd))
        );
    }

    #[tokio::test]
    async fn test_fatal_failure_stops_the_worker() {
        let client = ScriptedLedger::answering(None);
        let shard = shard(&[(1, 2), (2, 3), (3, 1)]);

        let err = TransferWorker::new(1, client.clone(), FixedTransfers::new(12), Currency::Usd)
            .run(shard)
            .await
            .unwrap_err();

        match err {
            SpammerError::TransferFailed {
                worker,
                from,
                to,
                amount,
                cause,
            } => {
                assert_eq!(worker, 1);
                assert_eq!(from, AccountId(1));
                assert_eq!(to, AccountId(2));
                assert_eq!(amount, Money::from_units(12, Currency::Usd));
                assert!(cause.to_string().contains("AccountNotFound"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing after the failing pair was attempted.
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fatal_outcome_returned_as_ok_is_named_a_contract_violation() {
        let client = ScriptedLedger::answering(Some(TransferOutcome::FatalFailure));

        let err = TransferWorker::new(0, client.clone(), FixedTransfers::new(10), Currency::Usd)
            .run(shard(&[(1, 2), (2, 1)]))
            .await
            .unwrap_err();

        match err {
            SpammerError::TransferFailed { cause, .. } => {
                assert!(cause.to_string().contains("client contract violation"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_worker_does_not_start_new_operations() {
        let client = ScriptedLedger::answering(Some(TransferOutcome::Success));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = TransferWorker::new(2, client.clone(), FixedTransfers::new(10), Currency::Usd)
            .with_cancellation(cancel)
            .run(shard(&[(1, 2), (2, 1)]))
            .await
            .unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_shard() {
        let client = ScriptedLedger::answering(Some(TransferOutcome::Success));
        let report = TransferWorker::new(0, client, FixedTransfers::new(10), Currency::Usd)
            .run(shard(&[]))
            .await
            .unwrap();
        assert_eq!(report, WorkerReport::new(0));
    }
}
