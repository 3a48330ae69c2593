//! Published snapshot store.
//!
//! Holds the most recently published [`Snapshot`] behind a lock, swapped
//! atomically by the scheduler. Readers always see either the previous
//! complete snapshot or the new one, never a partial merge.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::listings::collector::SourceOutcome;
use crate::models::{Listing, Marketplace, Snapshot};

/// How one source fared during a refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub marketplace: Marketplace,
    pub listings: usize,
    pub pages_fetched: usize,
    pub truncated: bool,
    pub error: Option<String>,
}

impl From<&SourceOutcome> for SourceReport {
    fn from(outcome: &SourceOutcome) -> Self {
        Self {
            marketplace: outcome.marketplace,
            listings: outcome.listings.len(),
            pages_fetched: outcome.pages_fetched,
            truncated: outcome.truncated,
            error: outcome.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Status of the most recent completed refresh cycle.
///
/// Timestamps live here rather than in the snapshot so that snapshots stay
/// pure over their inputs.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub completed_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    /// Set when at least one source failed; names the failed sources.
    pub error: Option<String>,
}

impl CycleReport {
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| s.error.is_some())
    }
}

#[derive(Default)]
struct Inner {
    snapshot: Arc<Snapshot>,
    last_cycle: Option<CycleReport>,
    refreshing: bool,
}

/// Shared read endpoint for the aggregation pipeline.
#[derive(Default)]
pub struct ListingsStore {
    inner: RwLock<Inner>,
}

impl ListingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current published snapshot. Cheap to call; the snapshot itself
    /// is shared, not copied.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner
            .read()
            .expect("listings lock poisoned")
            .snapshot
            .clone()
    }

    pub fn last_cycle(&self) -> Option<CycleReport> {
        self.inner
            .read()
            .expect("listings lock poisoned")
            .last_cycle
            .clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.read().expect("listings lock poisoned").refreshing
    }

    /// Cheapest known listing for one token, if it is listed anywhere.
    pub fn best_listing(&self, token_id: &str) -> Option<Listing> {
        self.snapshot()
            .get(token_id)
            .and_then(|aggregated| aggregated.best.clone())
    }

    /// Number of tokens with at least one listing.
    pub fn listed_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Cheapest best-offer across the whole collection.
    pub fn floor(&self) -> Option<Listing> {
        let snapshot = self.snapshot();
        snapshot
            .tokens
            .values()
            .filter_map(|aggregated| aggregated.best.as_ref())
            .min_by_key(|listing| (listing.price, listing.marketplace))
            .cloned()
    }

    pub(crate) fn set_refreshing(&self, refreshing: bool) {
        self.inner
            .write()
            .expect("listings lock poisoned")
            .refreshing = refreshing;
    }

    /// Swap in a new snapshot and cycle report in one step.
    pub(crate) fn publish(&self, snapshot: Snapshot, report: CycleReport) {
        let mut inner = self.inner.write().expect("listings lock poisoned");
        inner.snapshot = Arc::new(snapshot);
        inner.last_cycle = Some(report);
        inner.refreshing = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::*;
    use crate::models::AggregatedListing;

    fn listing(marketplace: Marketplace, price: &str) -> Listing {
        Listing {
            price: price.parse::<Decimal>().unwrap(),
            currency: "ETH".to_string(),
            url: format!("https://example.com/{marketplace}"),
            marketplace,
        }
    }

    fn snapshot_of(entries: &[(&str, Marketplace, &str)]) -> Snapshot {
        let mut tokens = BTreeMap::new();
        for (token, marketplace, price) in entries {
            let mut per_source = BTreeMap::new();
            per_source.insert(*marketplace, listing(*marketplace, price));
            tokens.insert(
                token.to_string(),
                AggregatedListing::from_per_source(per_source),
            );
        }
        Snapshot { tokens }
    }

    fn report() -> CycleReport {
        CycleReport {
            completed_at: Utc::now(),
            sources: vec![],
            error: None,
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = ListingsStore::new();
        assert!(store.snapshot().is_empty());
        assert!(store.last_cycle().is_none());
        assert!(!store.is_refreshing());
        assert_eq!(store.listed_count(), 0);
        assert!(store.floor().is_none());
    }

    #[test]
    fn test_publish_replaces_snapshot_wholesale() {
        let store = ListingsStore::new();

        store.publish(
            snapshot_of(&[("1", Marketplace::OpenSea, "0.05")]),
            report(),
        );
        assert_eq!(store.listed_count(), 1);
        assert!(store.best_listing("1").is_some());

        store.publish(
            snapshot_of(&[("2", Marketplace::MagicEden, "0.10")]),
            report(),
        );
        assert_eq!(store.listed_count(), 1);
        assert!(store.best_listing("1").is_none());
        assert!(store.best_listing("2").is_some());
        assert!(store.last_cycle().is_some());
    }

    #[test]
    fn test_publish_clears_refreshing() {
        let store = ListingsStore::new();
        store.set_refreshing(true);
        assert!(store.is_refreshing());

        store.publish(Snapshot::default(), report());
        assert!(!store.is_refreshing());
    }

    #[test]
    fn test_floor_is_collection_wide_minimum() {
        let store = ListingsStore::new();
        store.publish(
            snapshot_of(&[
                ("1", Marketplace::OpenSea, "0.05"),
                ("2", Marketplace::MagicEden, "0.03"),
            ]),
            report(),
        );

        let floor = store.floor().unwrap();
        assert_eq!(floor.price, "0.03".parse::<Decimal>().unwrap());
        assert_eq!(floor.marketplace, Marketplace::MagicEden);
    }

    #[test]
    fn test_all_failed_requires_every_source_erred() {
        let ok = SourceReport {
            marketplace: Marketplace::OpenSea,
            listings: 1,
            pages_fetched: 1,
            truncated: false,
            error: None,
        };
        let failed = SourceReport {
            marketplace: Marketplace::MagicEden,
            listings: 0,
            pages_fetched: 0,
            truncated: false,
            error: Some("http status 500".to_string()),
        };

        let mixed = CycleReport {
            completed_at: Utc::now(),
            sources: vec![ok.clone(), failed.clone()],
            error: Some("magiceden failed".to_string()),
        };
        assert!(!mixed.all_failed());

        let all = CycleReport {
            completed_at: Utc::now(),
            sources: vec![failed],
            error: Some("all sources failed".to_string()),
        };
        assert!(all.all_failed());
    }
}
