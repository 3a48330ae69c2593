mod listing;
mod marketplace;
mod snapshot;

pub use listing::Listing;
pub use marketplace::Marketplace;
pub use snapshot::{AggregatedListing, Snapshot, TokenId};
