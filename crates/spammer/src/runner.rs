//! Spammer runner.
//!
//! Drives one complete scenario: generate the shuffled pair workload, split
//! it into one shard per worker, run the workers concurrently, wait for all
//! of them, merge their reports and verify every touched balance.

use crate::aggregate::{aggregate, TransferTotals};
use crate::client::LedgerClient;
use crate::config::SpammerConfig;
use crate::error::SpammerError;
use crate::partition::{partition, WorkShard};
use crate::provision::{account_range, provision_accounts};
use crate::report::RunReport;
use crate::verify::{BalanceVerifier, InitialBalances};
use crate::worker::TransferWorker;
use crate::workloads::{generate_pairs, RandomTransfers, TransferPolicy};
use ledger_types::AccountId;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs transfer scenarios against one ledger.
pub struct Spammer<C: ?Sized> {
    config: SpammerConfig,
    client: Arc<C>,
}

impl<C> Spammer<C>
where
    C: LedgerClient + ?Sized + 'static,
{
    /// Create a spammer. Fails if `config` does not validate.
    pub fn new(config: SpammerConfig, client: Arc<C>) -> Result<Self, SpammerError> {
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SpammerConfig {
        &self.config
    }

    /// The configured contiguous account pool.
    pub fn accounts(&self) -> Result<Vec<AccountId>, SpammerError> {
        account_range(self.config.first_account, self.config.account_count)
    }

    /// Create a fresh pool of `account_count` funded accounts.
    pub async fn provision(&self) -> Result<Vec<AccountId>, SpammerError> {
        provision_accounts(
            self.client.clone(),
            self.config.account_count,
            self.config.initial_money()?,
            self.config.provision_parallelism,
        )
        .await
    }

    /// Run the scenario on the configured pool.
    pub async fn run(&self) -> Result<RunReport, SpammerError> {
        let accounts = self.accounts()?;
        self.run_on(&accounts).await
    }

    /// Run the scenario on `accounts` with random amounts and directions.
    pub async fn run_on(&self, accounts: &[AccountId]) -> Result<RunReport, SpammerError> {
        let range = self.config.amount_range;
        let config = &self.config;
        self.run_with(accounts, |worker| {
            RandomTransfers::new(range, config.worker_seed(worker))
        })
        .await
    }

    /// Run the scenario on `accounts`, building each worker's policy with `policy_for`.
    ///
    /// Every account in `accounts` must start with the configured initial
    /// balance. The report is only returned once every touched account has
    /// been verified.
    pub async fn run_with<P, F>(
        &self,
        accounts: &[AccountId],
        policy_for: F,
    ) -> Result<RunReport, SpammerError>
    where
        P: TransferPolicy + Send + 'static,
        F: FnMut(usize) -> P,
    {
        let started = Instant::now();
        let initial = self.config.initial_money()?;

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let pairs = generate_pairs(accounts, &mut rng);
        let num_pairs = pairs.len();
        let shards = partition(pairs, self.config.worker_count)?;

        info!(
            accounts = accounts.len(),
            pairs = num_pairs,
            workers = shards.len(),
            "Starting transfers"
        );

        let totals = self.execute(shards, policy_for).await?;
        info!(
            successes = totals.successes,
            retryable_failures = totals.retryable_failures,
            touched = totals.log.num_accounts(),
            "Transfers completed"
        );

        let verification =
            BalanceVerifier::new(self.client.as_ref(), InitialBalances::Uniform(initial))
                .with_concurrency(self.config.provision_parallelism)
                .verify(&totals.log)
                .await?;

        RunReport::new(num_pairs, &totals, &verification, started.elapsed())
    }

    /// Run every shard on its own task and wait for all of them.
    ///
    /// The first real failure cancels the other workers; they finish their
    /// current transfer and stop. The failure is returned only after every
    /// task has ended.
    async fn execute<P, F>(
        &self,
        shards: Vec<WorkShard>,
        mut policy_for: F,
    ) -> Result<TransferTotals, SpammerError>
    where
        P: TransferPolicy + Send + 'static,
        F: FnMut(usize) -> P,
    {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let num_workers = shards.len();

        for shard in shards {
            let worker = TransferWorker::new(
                shard.worker,
                self.client.clone(),
                policy_for(shard.worker),
                self.config.currency,
            )
            .with_cancellation(cancel.clone());
            tasks.spawn(worker.run(shard));
        }

        let mut reports = Vec::with_capacity(num_workers);
        let mut first_error: Option<SpammerError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) if e.is_cancellation() => {
                    debug!(error = %e, "Worker stopped after cancellation");
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Worker failed, cancelling remaining workers");
                    cancel.cancel();
                    first_error.get_or_insert(e);
                }
                Err(join_error) => {
                    error!(error = %join_error, "Worker task failed, cancelling remaining workers");
                    cancel.cancel();
                    first_error.get_or_insert(SpammerError::WorkerPanicked(join_error.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(aggregate(reports)),
        }
    }
}
