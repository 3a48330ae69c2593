//! Marketplace feed adapters.
//!
//! Each adapter speaks one external feed's dialect and reduces it to the
//! shared [`Page`]/[`RawListing`] shape; everything downstream of the
//! trait is feed-agnostic.

pub mod magiceden;
pub mod opensea;

pub use magiceden::MagicEdenSource;
pub use opensea::OpenSeaSource;

use crate::models::Marketplace;

/// A failure talking to one marketplace feed.
///
/// Classified so the scheduler can report per-source failures without
/// aborting the whole refresh cycle.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("http status {status}")]
    Http { status: reqwest::StatusCode },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// One raw entry from a feed page, pre-normalization.
///
/// Carries enough to recover the token id, the price amount with its
/// exponent, and a deep link to the listing.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub token_id: String,
    /// Price amount as reported, either base units or a decimal string.
    pub amount: String,
    /// Decimal exponent for `amount`; the source's default applies when
    /// absent.
    pub decimals: Option<u32>,
    pub currency: Option<String>,
    pub url: String,
}

/// One page of raw listings plus the cursor for the next page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<RawListing>,
    pub next_cursor: Option<String>,
}

/// One marketplace feed, cursor-paginated.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    fn marketplace(&self) -> Marketplace;

    /// Exponent applied to entries that do not carry one.
    fn default_decimals(&self) -> u32 {
        18
    }

    /// Optional one-shot request issued before pagination starts (the
    /// offer-book feed's best-price seed).
    async fn fetch_seed(&self) -> Result<Option<Page>, SourceError> {
        Ok(None)
    }

    /// Fetch one page; `cursor` is `None` for the first page.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, SourceError>;
}
