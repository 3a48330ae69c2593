//! Interval refresh scheduler.
//!
//! Drives the collect-aggregate-publish pipeline on a fixed interval, with
//! on-demand triggers coalesced by a single-flight guard: at most one
//! cycle runs at a time, and a trigger arriving while one is in flight is
//! dropped rather than queued.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::aggregate::aggregate;
use super::collector::collect_source;
use super::sources::ListingSource;
use super::store::{CycleReport, ListingsStore, SourceReport};
use crate::models::{Listing, Snapshot, TokenId};

enum Command {
    Refresh,
    Shutdown,
}

/// Remote control for a running [`RefreshScheduler`].
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<Command>,
    in_flight: Arc<AtomicBool>,
}

impl RefreshHandle {
    /// Request an immediate refresh. Returns false when a cycle is already
    /// in flight or the scheduler has stopped; the request is dropped, not
    /// queued.
    pub fn trigger(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("refresh already in flight, dropping trigger");
            return false;
        }
        if self.tx.send(Command::Refresh).is_err() {
            self.in_flight.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Stop the scheduler. An in-flight cycle completes and publishes
    /// before the loop exits.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

/// Run one full refresh cycle over the given sources.
///
/// Sources are fetched concurrently; per-source failures are absorbed into
/// the report and whatever each source managed to collect still feeds the
/// snapshot. This never fails: an all-sources-down cycle yields an empty
/// snapshot and a report saying so.
pub async fn run_refresh_cycle(
    sources: &[Arc<dyn ListingSource>],
    max_pages: usize,
) -> (Snapshot, CycleReport) {
    let outcomes = futures::future::join_all(
        sources
            .iter()
            .map(|source| collect_source(source.as_ref(), max_pages)),
    )
    .await;

    let reports: Vec<SourceReport> = outcomes.iter().map(SourceReport::from).collect();

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|outcome| outcome.failed())
        .map(|outcome| outcome.marketplace.as_str())
        .collect();

    let error = if failed.is_empty() {
        None
    } else if failed.len() == outcomes.len() && !outcomes.is_empty() {
        Some("all sources failed".to_string())
    } else {
        Some(format!("sources failed: {}", failed.join(", ")))
    };

    let per_source: Vec<BTreeMap<TokenId, Listing>> = outcomes
        .into_iter()
        .map(|outcome| outcome.listings)
        .collect();

    let snapshot = aggregate(&per_source);
    let report = CycleReport {
        completed_at: Utc::now(),
        sources: reports,
        error,
    };

    (snapshot, report)
}

/// Owns the refresh loop over a fixed set of sources.
pub struct RefreshScheduler {
    sources: Vec<Arc<dyn ListingSource>>,
    store: Arc<ListingsStore>,
    interval: Duration,
    max_pages: usize,
    in_flight: Arc<AtomicBool>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl RefreshScheduler {
    pub fn new(
        sources: Vec<Arc<dyn ListingSource>>,
        store: Arc<ListingsStore>,
        interval: Duration,
        max_pages: usize,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            sources,
            store,
            interval,
            max_pages,
            in_flight: Arc::new(AtomicBool::new(false)),
            cmd_tx,
            cmd_rx,
        }
    }

    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            tx: self.cmd_tx.clone(),
            in_flight: self.in_flight.clone(),
        }
    }

    /// Run until shutdown. Performs one cycle immediately on startup, then
    /// repeats every interval, counted from each cycle's completion.
    pub async fn run(mut self) {
        info!(
            sources = self.sources.len(),
            interval = ?self.interval,
            "refresh scheduler starting"
        );

        if self.try_claim() {
            self.run_cycle("startup").await;
        }

        loop {
            let sleep = tokio::time::sleep(self.interval);
            tokio::pin!(sleep);

            tokio::select! {
                _ = &mut sleep => {
                    // A failed claim means a trigger already queued a
                    // refresh; let that command run the cycle instead of
                    // stomping its claim.
                    if self.try_claim() {
                        self.run_cycle("scheduled").await;
                    }
                }
                Some(cmd) = self.cmd_rx.recv() => {
                    match cmd {
                        Command::Refresh => {
                            // The trigger holds the claim until the cycle
                            // releases it.
                            self.run_cycle("manual").await;
                        }
                        Command::Shutdown => {
                            info!("refresh scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Claim the in-flight flag. Fails when a cycle is running or a
    /// trigger has one pending on the command channel.
    fn try_claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn run_cycle(&self, reason: &str) {
        debug!(reason, "refresh cycle starting");
        self.store.set_refreshing(true);

        let (snapshot, report) = run_refresh_cycle(&self.sources, self.max_pages).await;

        match &report.error {
            None => info!(
                reason,
                tokens = snapshot.len(),
                "refresh cycle complete"
            ),
            Some(message) if report.all_failed() => {
                error!(reason, error = %message, "refresh cycle failed on every source");
            }
            Some(message) => {
                warn!(
                    reason,
                    tokens = snapshot.len(),
                    error = %message,
                    "refresh cycle completed with partial data"
                );
            }
        }

        self.store.publish(snapshot, report);
        self.in_flight.store(false, Ordering::SeqCst);
    }
}
