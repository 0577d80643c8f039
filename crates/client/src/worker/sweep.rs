//! Size-bounded eviction across every partition.

use futures_util::future::join_all;
use mealsw_core::{CacheDb, Error, Partition, StoredRequest};
use serde::Serialize;

/// Eviction thresholds. A partition holding more than `max_entries` loses
/// its `evict_count` oldest entries per sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_entries: usize,
    pub evict_count: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self { max_entries: 100, evict_count: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSweep {
    pub name: String,
    /// Entry count before the sweep.
    pub entries: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub partitions: Vec<PartitionSweep>,
}

impl SweepReport {
    pub fn deleted(&self) -> usize {
        self.partitions.iter().map(|p| p.deleted).sum()
    }
}

/// Run one sweep over every partition, whatever its name.
///
/// Deletions within a partition are issued together and an individual
/// failure is counted, not propagated. Only failing to enumerate partitions
/// or keys is an error.
pub async fn sweep(db: &CacheDb, policy: EvictionPolicy) -> Result<SweepReport, Error> {
    let mut report = SweepReport::default();

    for name in db.partition_names().await? {
        let partition = db.partition(&name);
        let keys = partition.keys().await?;
        let entries = keys.len();

        let (deleted, failed) = if entries > policy.max_entries {
            let victims = &keys[..policy.evict_count.min(entries)];
            let counts = evict(&partition, victims).await;
            tracing::info!(partition = %name, entries, deleted = counts.0, "evicted oldest entries");
            counts
        } else {
            (0, 0)
        };

        report.partitions.push(PartitionSweep { name, entries, deleted, failed });
    }

    Ok(report)
}

/// Delete `victims` together. Returns (deleted, failed); an entry that was
/// already gone counts as neither.
async fn evict(partition: &Partition, victims: &[StoredRequest]) -> (usize, usize) {
    let results = join_all(victims.iter().map(|entry| partition.delete(&entry.key))).await;

    let (mut deleted, mut failed) = (0, 0);
    for result in results {
        match result {
            Ok(true) => deleted += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(partition = partition.name(), error = %e, "eviction failed");
                failed += 1;
            }
        }
    }
    (deleted, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealsw_core::{Request, Response};
    use url::Url;

    fn request(i: usize) -> Request {
        Request::get(Url::parse(&format!("http://localhost:8000/api/v1/meals?id={i}")).unwrap())
    }

    async fn fill(db: &CacheDb, name: &str, count: usize) {
        let partition = db.open_partition(name).await.unwrap();
        for i in 0..count {
            partition.put(&request(i), &Response::new(200, format!("{i}"))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_sweep_evicts_oldest_half() {
        let db = CacheDb::open_in_memory().await.unwrap();
        fill(&db, "erica-meal-dynamic-v3.4.4", 101).await;

        let report = sweep(&db, EvictionPolicy::default()).await.unwrap();
        assert_eq!(report.deleted(), 50);
        assert_eq!(report.partitions[0].entries, 101);
        assert_eq!(report.partitions[0].failed, 0);

        let partition = db.partition("erica-meal-dynamic-v3.4.4");
        let keys = partition.keys().await.unwrap();
        assert_eq!(keys.len(), 51);
        assert_eq!(keys[0].url, request(50).url.to_string());
        assert!(partition.match_request(&request(49)).await.unwrap().is_none());
        assert!(partition.match_request(&request(100)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_leaves_small_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        fill(&db, "erica-meal-static-v3.4.4", 100).await;
        fill(&db, "erica-meal-dynamic-v3.4.4", 3).await;

        let report = sweep(&db, EvictionPolicy::default()).await.unwrap();
        assert_eq!(report.deleted(), 0);
        assert_eq!(report.partitions.len(), 2);
        assert_eq!(db.partition("erica-meal-static-v3.4.4").entry_count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_sweep_covers_foreign_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        fill(&db, "someone-else", 5).await;

        let policy = EvictionPolicy { max_entries: 4, evict_count: 2 };
        let report = sweep(&db, policy).await.unwrap();
        assert_eq!(report.deleted(), 2);
        assert_eq!(db.partition("someone-else").entry_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sweep_empty_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let report = sweep(&db, EvictionPolicy::default()).await.unwrap();
        assert!(report.partitions.is_empty());
    }

    #[tokio::test]
    async fn test_evict_skips_entries_already_gone() {
        let db = CacheDb::open_in_memory().await.unwrap();
        fill(&db, "erica-meal-dynamic-v3.4.4", 4).await;
        let partition = db.partition("erica-meal-dynamic-v3.4.4");
        let keys = partition.keys().await.unwrap();

        assert!(partition.delete(&keys[0].key).await.unwrap());
        assert_eq!(evict(&partition, &keys[..2]).await, (1, 0));
        assert_eq!(partition.entry_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sweep_counts_failed_deletions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        fill(&db, "someone-else", 5).await;
        db.set_read_only(true).await.unwrap();

        let policy = EvictionPolicy { max_entries: 4, evict_count: 2 };
        let report = sweep(&db, policy).await.unwrap();
        assert_eq!(report.partitions[0].deleted, 0);
        assert_eq!(report.partitions[0].failed, 2);

        db.set_read_only(false).await.unwrap();
        assert_eq!(db.partition("someone-else").entry_count().await.unwrap(), 5);
    }
}
