//! Cross-source aggregation into a snapshot.

use std::collections::BTreeMap;

use crate::models::{AggregatedListing, Listing, Marketplace, Snapshot, TokenId};

/// Merge per-source listing maps into a snapshot.
///
/// The result covers the union of tokens across all inputs; a token absent
/// from every input is absent from the snapshot (absence means "not
/// listed", never a zero price). Pure over its inputs, so identical maps
/// always aggregate to an identical snapshot.
pub fn aggregate(per_source: &[BTreeMap<TokenId, Listing>]) -> Snapshot {
    let mut merged: BTreeMap<TokenId, BTreeMap<Marketplace, Listing>> = BTreeMap::new();

    for listings in per_source {
        for (token_id, listing) in listings {
            merged
                .entry(token_id.clone())
                .or_default()
                .insert(listing.marketplace, listing.clone());
        }
    }

    let tokens = merged
        .into_iter()
        .map(|(token_id, sources)| (token_id, AggregatedListing::from_per_source(sources)))
        .collect();

    Snapshot { tokens }
}
