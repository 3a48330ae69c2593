//! Magic Eden listing feed adapter.
//!
//! Uses the Reservoir-compatible `orders/asks/v5` endpoint on Magic Eden's
//! EVM API, filtered to asks placed on Magic Eden itself.
//! Docs: https://docs.magiceden.io/reference/evm-overview

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use super::{ListingSource, Page, RawListing, SourceError};
use crate::models::Marketplace;

const MAGICEDEN_API_BASE: &str = "https://api-mainnet.magiceden.dev/v3/rtp/ethereum";

#[derive(Debug, Deserialize)]
struct AsksResponse {
    #[serde(default)]
    orders: Vec<AskOrder>,
    continuation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AskOrder {
    criteria: Option<Criteria>,
    price: Option<AskPrice>,
    source: Option<OrderSource>,
}

#[derive(Debug, Deserialize)]
struct Criteria {
    data: Option<CriteriaData>,
}

#[derive(Debug, Deserialize)]
struct CriteriaData {
    token: Option<CriteriaToken>,
}

#[derive(Debug, Deserialize)]
struct CriteriaToken {
    #[serde(rename = "tokenId")]
    token_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AskPrice {
    amount: Option<AskAmount>,
}

#[derive(Debug, Deserialize)]
struct AskAmount {
    raw: Option<String>,
    decimal: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OrderSource {
    domain: Option<String>,
    url: Option<String>,
}

/// Magic Eden collection asks source.
pub struct MagicEdenSource {
    client: Client,
    api_base: String,
    contract: String,
    api_key: Option<SecretString>,
    page_limit: usize,
    source_domain: String,
}

impl MagicEdenSource {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: MAGICEDEN_API_BASE.to_string(),
            contract: contract.into(),
            api_key: None,
            page_limit: 200,
            source_domain: "magiceden.io".to_string(),
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

    pub fn with_source_domain(mut self, source_domain: impl Into<String>) -> Self {
        self.source_domain = source_domain.into();
        self
    }

    async fn send_request(&self, query: &[(&str, &str)]) -> Result<AsksResponse, SourceError> {
        let url = format!("{}/orders/asks/v5", self.api_base);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
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

    fn to_page(&self, response: AsksResponse) -> Page {
        let items = response
            .orders
            .into_iter()
            .filter_map(|order| self.to_raw(order))
            .collect();
        Page {
            items,
            next_cursor: response.continuation,
        }
    }

    /// Reduce one ask order to the shared raw shape. Orders placed on
    /// other marketplaces (the feed relays those too) and orders missing
    /// the token identifier or price are dropped.
    fn to_raw(&self, order: AskOrder) -> Option<RawListing> {
        let domain = order
            .source
            .as_ref()
            .and_then(|source| source.domain.as_deref());
        if domain != Some(self.source_domain.as_str()) {
            return None;
        }
        let source_url = order.source.and_then(|source| source.url);

        let token_id = order
            .criteria
            .and_then(|criteria| criteria.data)
            .and_then(|data| data.token)
            .and_then(|token| token.token_id);

        let Some(token_id) = token_id.filter(|id| !id.is_empty()) else {
            warn!(marketplace = "magiceden", "ask order without token identifier, skipping");
            return None;
        };

        // Prefer the raw base-unit amount; the decimal field is a float
        // rendering and only used when raw is absent.
        let (amount, decimals) = match order.price.and_then(|price| price.amount) {
            Some(AskAmount { raw: Some(raw), .. }) => (raw, None),
            Some(AskAmount {
                decimal: Some(decimal),
                ..
            }) => (decimal.to_string(), Some(0)),
            _ => {
                warn!(marketplace = "magiceden", %token_id, "ask order without price, skipping");
                return None;
            }
        };

        let url = source_url.unwrap_or_else(|| {
            format!(
                "https://magiceden.io/item-details/ethereum/{}/{token_id}",
                self.contract
            )
        });

        Some(RawListing {
            token_id,
            amount,
            decimals,
            currency: Some("ETH".to_string()),
            url,
        })
    }
}

#[async_trait::async_trait]
impl ListingSource for MagicEdenSource {
    fn marketplace(&self) -> Marketplace {
        Marketplace::MagicEden
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, SourceError> {
        let limit = self.page_limit.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("collection", self.contract.as_str()),
            ("source", self.source_domain.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("continuation", cursor));
        }

        let response = self.send_request(&query).await?;
        Ok(self.to_page(response))
    }
}
