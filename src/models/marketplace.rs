use std::fmt;

use serde::{Deserialize, Serialize};

/// The marketplaces listings are aggregated from.
///
/// Declaration order doubles as the tie-break priority: when two sources
/// quote exactly the same price for a token, the lower-ordered variant wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    OpenSea,
    MagicEden,
}

impl Marketplace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marketplace::OpenSea => "opensea",
            Marketplace::MagicEden => "magiceden",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
