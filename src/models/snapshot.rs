use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Listing, Marketplace};

/// Canonical string form of a collection-relative token identifier.
pub type TokenId = String;

/// All known listings for one token, plus the cheapest of them.
///
/// Invariant: `best` is the minimum-price element of `per_source`, with
/// `Marketplace` order breaking exact ties, and is `None` iff `per_source`
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedListing {
    pub per_source: BTreeMap<Marketplace, Listing>,
    pub best: Option<Listing>,
}

impl AggregatedListing {
    pub fn from_per_source(per_source: BTreeMap<Marketplace, Listing>) -> Self {
        let best = per_source
            .values()
            .min_by_key(|listing| (listing.price, listing.marketplace))
            .cloned();
        Self { per_source, best }
    }
}

/// One complete, internally consistent aggregation result for all tokens.
///
/// Snapshots contain no timestamps or other nondeterministic fields, so
/// aggregation over identical inputs reproduces an identical snapshot.
/// A snapshot is replaced wholesale on each refresh cycle, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tokens: BTreeMap<TokenId, AggregatedListing>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn get(&self, token_id: &str) -> Option<&AggregatedListing> {
        self.tokens.get(token_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn listing(marketplace: Marketplace, price: &str) -> Listing {
        Listing {
            price: price.parse::<Decimal>().unwrap(),
            currency: "ETH".to_string(),
            url: format!("https://example.com/{marketplace}"),
            marketplace,
        }
    }

    #[test]
    fn test_best_is_cheapest() {
        let mut per_source = BTreeMap::new();
        per_source.insert(Marketplace::OpenSea, listing(Marketplace::OpenSea, "0.05"));
        per_source.insert(
            Marketplace::MagicEden,
            listing(Marketplace::MagicEden, "0.04"),
        );

        let aggregated = AggregatedListing::from_per_source(per_source);
        let best = aggregated.best.expect("non-empty per_source must have best");
        assert_eq!(best.marketplace, Marketplace::MagicEden);
        assert_eq!(best.price, "0.04".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_exact_tie_goes_to_lower_ordered_marketplace() {
        let mut per_source = BTreeMap::new();
        per_source.insert(Marketplace::OpenSea, listing(Marketplace::OpenSea, "0.05"));
        per_source.insert(
            Marketplace::MagicEden,
            listing(Marketplace::MagicEden, "0.05"),
        );

        let aggregated = AggregatedListing::from_per_source(per_source);
        assert_eq!(
            aggregated.best.unwrap().marketplace,
            Marketplace::OpenSea
        );
    }

    #[test]
    fn test_best_absent_iff_no_sources() {
        let aggregated = AggregatedListing::from_per_source(BTreeMap::new());
        assert!(aggregated.per_source.is_empty());
        assert!(aggregated.best.is_none());
    }
}
