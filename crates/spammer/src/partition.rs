//! Splitting the workload into per-worker shards.

use crate::error::SpammerError;
use crate::workloads::AccountPair;

/// A contiguous slice of the workload owned by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkShard {
    /// Index of the worker that owns this shard.
    pub worker: usize,
    /// Position of the first pair in the full workload.
    pub start: usize,
    pub pairs: Vec<AccountPair>,
}

impl WorkShard {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Positions covered in the full workload.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.pairs.len()
    }
}

/// Split `pairs` into exactly `workers` contiguous shards.
///
/// The first `workers - 1` shards hold `len / workers` pairs each and the
/// last one absorbs the remainder. No pair is dropped or duplicated.
pub fn partition(pairs: Vec<AccountPair>, workers: usize) -> Result<Vec<WorkShard>, SpammerError> {
    if workers == 0 {
        return Err(SpammerError::InvalidConfig(
            "worker count must be at least 1".to_string(),
        ));
    }

    let step = pairs.len() / workers;
    let mut shards = Vec::with_capacity(workers);
    let mut rest = pairs;
    let mut start = 0;

    for worker in 0..workers - 1 {
        let tail = rest.split_off(step);
        shards.push(WorkShard {
            worker,
            start,
            pairs: rest,
        });
        start += step;
        rest = tail;
    }
    shards.push(WorkShard {
        worker: workers - 1,
        start,
        pairs: rest,
    });

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::generate_pairs;
    use ledger_types::AccountId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn workload(accounts: u64) -> Vec<AccountPair> {
        let pool: Vec<_> = (1..=accounts).map(AccountId).collect();
        generate_pairs(&pool, &mut ChaCha8Rng::seed_from_u64(accounts))
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        for accounts in [0, 1, 2, 3, 4, 7] {
            let pairs = workload(accounts);
            for workers in 1..=13 {
                let shards = partition(pairs.clone(), workers).unwrap();
                assert_eq!(shards.len(), workers);

                // Concatenating the shards in order reproduces the input exactly.
                let rejoined: Vec<_> = shards.iter().flat_map(|s| s.pairs.clone()).collect();
                assert_eq!(rejoined, pairs, "accounts={accounts} workers={workers}");

                // Position ranges tile 0..len with no gap or overlap.
                let mut next = 0;
                for (i, shard) in shards.iter().enumerate() {
                    assert_eq!(shard.worker, i);
                    assert_eq!(shard.range().start, next);
                    assert_eq!(&pairs[shard.range()], shard.pairs.as_slice());
                    next = shard.range().end;
                }
                assert_eq!(next, pairs.len());
            }
        }
    }

    #[test]
    fn test_last_shard_absorbs_remainder() {
        // 4 accounts -> 24 pairs; 5 workers -> 4 + 4 + 4 + 4 + 8.
        let shards = partition(workload(4), 5).unwrap();
        let sizes: Vec<_> = shards.iter().map(WorkShard::len).collect();
        assert_eq!(sizes, vec![4, 4, 4, 4, 8]);
    }

    #[test]
    fn test_even_split() {
        let shards = partition(workload(4), 2).unwrap();
        assert_eq!(shards[0].len(), 12);
        assert_eq!(shards[1].len(), 12);
    }

    #[test]
    fn test_more_workers_than_pairs() {
        let shards = partition(workload(2), 5).unwrap();
        let sizes: Vec<_> = shards.iter().map(WorkShard::len).collect();
        assert_eq!(sizes, vec![0, 0, 0, 0, 4]);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        assert!(matches!(
            partition(workload(3), 0),
            Err(SpammerError::InvalidConfig(_))
        ));
    }
}
