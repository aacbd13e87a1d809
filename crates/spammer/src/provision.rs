//! Account provisioning.
//!
//! Creates the funded account pool the transfer scenario runs against, or
//! describes an already provisioned contiguous pool.

use crate::client::LedgerClient;
use crate::error::SpammerError;
use ledger_types::{AccountId, Money};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// The `count` contiguous account ids starting at `first`.
pub fn account_range(first: AccountId, count: usize) -> Result<Vec<AccountId>, SpammerError> {
    (0..count as u64)
        .map(|offset| {
            first.offset(offset).ok_or_else(|| {
                SpammerError::InvalidConfig(format!(
                    "{count} accounts starting at {first} overflow the id space"
                ))
            })
        })
        .collect()
}

/// Create `count` accounts funded with `balance`.
///
/// Creation is split into at most `parallelism` contiguous chunks that run
/// concurrently; each chunk creates its accounts one after another. The
/// returned ids follow chunk order. The first failure aborts the remaining
/// chunks.
pub async fn provision_accounts<C>(
    client: Arc<C>,
    count: usize,
    balance: Money,
    parallelism: usize,
) -> Result<Vec<AccountId>, SpammerError>
where
    C: LedgerClient + ?Sized + 'static,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    if parallelism == 0 {
        return Err(SpammerError::InvalidConfig(
            "provisioning parallelism must be at least 1".to_string(),
        ));
    }

    let chunk_size = count.div_ceil(parallelism);
    info!(
        accounts = count,
        chunks = count.div_ceil(chunk_size),
        balance = %balance,
        "Provisioning accounts"
    );

    let mut tasks = JoinSet::new();
    for (chunk, start) in (0..count).step_by(chunk_size).enumerate() {
        let end = (start + chunk_size).min(count);
        let client = client.clone();
        tasks.spawn(async move {
            let mut created = Vec::with_capacity(end - start);
            for index in start..end {
                let account = client
                    .create_account(&balance)
                    .await
                    .map_err(|cause| SpammerError::Provisioning { index, cause })?;
                debug!(index, %account, "Account created");
                created.push(account);
            }
            Ok::<_, SpammerError>((chunk, created))
        });
    }

    let mut chunks = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| SpammerError::WorkerPanicked(e.to_string()))?;
        match result {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    chunks.sort_unstable_by_key(|(chunk, _)| *chunk);
    let accounts: Vec<AccountId> = chunks.into_iter().flat_map(|(_, ids)| ids).collect();
    info!(accounts = accounts.len(), "Accounts provisioned");
    Ok(accounts)
}
