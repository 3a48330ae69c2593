//! OpenSea listing feed adapter.
//!
//! Uses the v2 collection listings endpoints: a one-shot `best` seed
//! followed by cursor pagination over `all`.
//! Docs: https://docs.opensea.io/reference/api-overview

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use super::{ListingSource, Page, RawListing, SourceError};
use crate::models::Marketplace;

const OPENSEA_API_BASE: &str = "https://api.opensea.io/v2";

#[derive(Debug, Deserialize)]
struct ListingsResponse {
    #[serde(default)]
    listings: Vec<ListingEntry>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    protocol_data: Option<ProtocolData>,
    price: Option<PriceEnvelope>,
}

#[derive(Debug, Deserialize)]
struct ProtocolData {
    parameters: Option<ProtocolParameters>,
}

#[derive(Debug, Deserialize)]
struct ProtocolParameters {
    #[serde(default)]
    offer: Vec<OfferItem>,
}

#[derive(Debug, Deserialize)]
struct OfferItem {
    #[serde(rename = "identifierOrCriteria")]
    identifier_or_criteria: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceEnvelope {
    current: Option<CurrentPrice>,
}

#[derive(Debug, Deserialize)]
struct CurrentPrice {
    value: Option<String>,
    decimals: Option<u32>,
    currency: Option<String>,
}

/// OpenSea collection listings source.
pub struct OpenSeaSource {
    client: Client,
    api_base: String,
    slug: String,
    contract: String,
    api_key: Option<SecretString>,
    page_limit: usize,
}

impl OpenSeaSource {
    pub fn new(slug: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: OPENSEA_API_BASE.to_string(),
            slug: slug.into(),
            contract: contract.into(),
            api_key: None,
            page_limit: 100,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Override the API base URL (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into();
        self
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    async fn send_request(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ListingsResponse, SourceError> {
        let url = format!("{}{path}", self.api_base);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);

        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key.expose_secret());
        }

        let response = request.send().await.map_err(SourceError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http { status });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))
    }

    fn to_page(&self, response: ListingsResponse) -> Page {
        let items = response
            .listings
            .into_iter()
            .filter_map(|entry| self.to_raw(entry))
            .collect();
        Page {
            items,
            next_cursor: response.next,
        }
    }

    /// Reduce one listing entry to the shared raw shape, or drop it when
    /// the token identifier or price is missing.
    fn to_raw(&self, entry: ListingEntry) -> Option<RawListing> {
        let token_id = entry
            .protocol_data
            .and_then(|data| data.parameters)
            .and_then(|params| params.offer.into_iter().next())
            .and_then(|offer| offer.identifier_or_criteria);

        let Some(token_id) = token_id.filter(|id| !id.is_empty()) else {
            warn!(marketplace = "opensea", "listing entry without token identifier, skipping");
            return None;
        };

        let Some(current) = entry.price.and_then(|price| price.current) else {
            warn!(marketplace = "opensea", %token_id, "listing entry without price, skipping");
            return None;
        };

        let Some(value) = current.value else {
            warn!(marketplace = "opensea", %token_id, "listing entry without price value, skipping");
            return None;
        };

        let url = format!(
            "https://opensea.io/assets/ethereum/{}/{token_id}",
            self.contract
        );

        Some(RawListing {
            token_id,
            amount: value,
            decimals: current.decimals,
            currency: current.currency,
            url,
        })
    }
}

#[async_trait::async_trait]
impl ListingSource for OpenSeaSource {
    fn marketplace(&self) -> Marketplace {
        Marketplace::OpenSea
    }

    /// The `best` endpoint returns the cheapest listings per token in a
    /// single shot. Its cursor is ignored; pagination restarts from `all`.
    async fn fetch_seed(&self) -> Result<Option<Page>, SourceError> {
        let limit = self.page_limit.to_string();
        let path = format!("/listings/collection/{}/best", self.slug);
        let response = self.send_request(&path, &[("limit", limit.as_str())]).await?;

        let mut page = self.to_page(response);
        page.next_cursor = None;
        Ok(Some(page))
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, SourceError> {
        let limit = self.page_limit.to_string();
        let path = format!("/listings/collection/{}/all", self.slug);

        let mut query: Vec<(&str, &str)> = vec![("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            query.push(("next", cursor));
        }

        let response = self.send_request(&path, &query).await?;
        Ok(self.to_page(response))
    }
}
