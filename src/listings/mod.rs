//! The listing aggregation engine.
//!
//! Per-marketplace fetchers pull cursor-paginated offer data, the
//! normalizer converts raw price encodings into decimal ETH, the collector
//! reduces each source to a token-keyed map, and the aggregator merges
//! those maps into a [`Snapshot`](crate::models::Snapshot) published
//! through the read-only store. A scheduler drives the whole pipeline on a
//! fixed interval with single-flight protection.

pub mod aggregate;
pub mod collector;
pub mod price;
pub mod scheduler;
pub mod sources;
pub mod store;

pub use aggregate::aggregate;
pub use collector::{collect_source, SourceOutcome};
pub use scheduler::{run_refresh_cycle, RefreshHandle, RefreshScheduler};
pub use sources::{ListingSource, MagicEdenSource, OpenSeaSource, Page, RawListing, SourceError};
pub use store::{CycleReport, ListingsStore, SourceReport};
