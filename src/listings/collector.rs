//! Per-source page collection.
//!
//! Walks one source's cursor chain, normalizes each entry, and reduces the
//! pages to a token-keyed map. Collection never fails outright: whatever
//! was gathered before an error is kept, and the error travels alongside
//! the listings in the outcome.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::price::normalize_price;
use super::sources::{ListingSource, Page, SourceError};
use crate::models::{Listing, Marketplace, TokenId};

/// Everything one source produced during a collection pass.
#[derive(Debug)]
pub struct SourceOutcome {
    pub marketplace: Marketplace,
    pub listings: BTreeMap<TokenId, Listing>,
    pub pages_fetched: usize,
    /// True when the page bound stopped collection before the cursor chain
    /// was exhausted.
    pub truncated: bool,
    pub error: Option<SourceError>,
}

impl SourceOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Collect all listings from one source, bounded by `max_pages`.
///
/// The seed request is best-effort: a seed failure is logged and
/// pagination proceeds from the first page. A pagination failure ends the
/// walk but keeps every listing collected so far. Within a source the
/// first listing seen for a token wins; feeds order cheapest-first, so
/// later duplicates are worse offers.
pub async fn collect_source(source: &dyn ListingSource, max_pages: usize) -> SourceOutcome {
    let marketplace = source.marketplace();
    let default_decimals = source.default_decimals();

    let mut listings = BTreeMap::new();
    let mut pages_fetched = 0;
    let mut truncated = false;
    let mut error = None;

    match source.fetch_seed().await {
        Ok(Some(page)) => absorb_page(&mut listings, page, marketplace, default_decimals),
        Ok(None) => {}
        Err(e) => {
            warn!(%marketplace, error = %e, "seed request failed, continuing with pagination");
        }
    }

    let mut cursor: Option<String> = None;
    loop {
        if pages_fetched >= max_pages {
            if cursor.is_some() {
                truncated = true;
                debug!(%marketplace, max_pages, "page bound reached, stopping collection");
            }
            break;
        }

        match source.fetch_page(cursor.as_deref()).await {
            Ok(page) => {
                pages_fetched += 1;
                cursor = page.next_cursor.clone();
                absorb_page(&mut listings, page, marketplace, default_decimals);
                if cursor.is_none() {
                    break;
                }
            }
            Err(e) => {
                warn!(%marketplace, error = %e, pages_fetched, "pagination failed, keeping collected listings");
                error = Some(e);
                break;
            }
        }
    }

    debug!(
        %marketplace,
        listings = listings.len(),
        pages_fetched,
        truncated,
        failed = error.is_some(),
        "collection pass finished"
    );

    SourceOutcome {
        marketplace,
        listings,
        pages_fetched,
        truncated,
        error,
    }
}

fn absorb_page(
    listings: &mut BTreeMap<TokenId, Listing>,
    page: Page,
    marketplace: Marketplace,
    default_decimals: u32,
) {
    for raw in page.items {
        let Some(price) = normalize_price(&raw.amount, raw.decimals, default_decimals) else {
            warn!(
                %marketplace,
                token_id = %raw.token_id,
                amount = %raw.amount,
                "unparseable price, skipping listing"
            );
            continue;
        };

        listings
            .entry(raw.token_id)
            .or_insert_with(|| Listing {
                price,
                currency: raw.currency.unwrap_or_else(|| "ETH".to_string()),
                url: raw.url,
                marketplace,
            });
    }
}
