#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use floorwatch::listings::{ListingSource, Page, RawListing, SourceError};
use floorwatch::models::Marketplace;
use tokio::sync::Semaphore;

/// One scripted response for a [`StubSource`] page fetch.
pub enum Scripted {
    Page(Vec<RawListing>),
    Error,
}

/// In-memory listing source serving a scripted sequence of pages.
///
/// Cursors encode the index of the next scripted entry. The final scripted
/// page gets no cursor unless `endless` is set, in which case the cursor
/// chain never terminates (to exercise page bounds).
pub struct StubSource {
    marketplace: Marketplace,
    pages: Vec<Scripted>,
    endless: bool,
    /// When set, each page fetch waits for a permit before responding.
    gate: Option<Arc<Semaphore>>,
    fetch_count: Arc<AtomicUsize>,
}

impl StubSource {
    pub fn new(marketplace: Marketplace, pages: Vec<Scripted>) -> Self {
        Self {
            marketplace,
            pages,
            endless: false,
            gate: None,
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fetch_count(&self) -> Arc<AtomicUsize> {
        self.fetch_count.clone()
    }
}

#[async_trait]
impl ListingSource for StubSource {
    fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }

        let index: usize = match cursor {
            None => 0,
            Some(cursor) => cursor.parse().expect("stub cursor"),
        };

        let scripted = if self.endless {
            &self.pages[index % self.pages.len()]
        } else {
            &self.pages[index]
        };

        match scripted {
            Scripted::Error => Err(SourceError::MalformedResponse(
                "scripted failure".to_string(),
            )),
            Scripted::Page(items) => {
                let next_cursor = if self.endless || index + 1 < self.pages.len() {
                    Some((index + 1).to_string())
                } else {
                    None
                };
                Ok(Page {
                    items: items.clone(),
                    next_cursor,
                })
            }
        }
    }
}

pub fn raw(token_id: &str, amount: &str) -> RawListing {
    RawListing {
        token_id: token_id.to_string(),
        amount: amount.to_string(),
        decimals: Some(18),
        currency: Some("ETH".to_string()),
        url: format!("https://example.com/{token_id}"),
    }
}

/// Poll `check` until it returns true or the deadline passes.
pub async fn wait_for<F: Fn() -> bool>(check: F, deadline: Duration) {
    let start = tokio::time::Instant::now();
    while !check() {
        assert!(
            start.elapsed() < deadline,
            "condition not met within {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
