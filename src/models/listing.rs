use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Marketplace;

/// One marketplace's current lowest ask for a token.
///
/// The price is already unit-normalized to the reference currency (ETH).
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price: Decimal,
    pub currency: String,
    pub url: String,
    pub marketplace: Marketplace,
}
