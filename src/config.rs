use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

fn default_contract() -> String {
    "0xb8ea78fcacef50d41375e44e6814ebba36bb33c4".to_string()
}

fn default_slug() -> String {
    "good-vibes-club".to_string()
}

/// The tracked collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// EVM contract address, used by the Magic Eden feed and for deep links.
    pub contract: String,

    /// OpenSea collection slug.
    pub slug: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            contract: default_contract(),
            slug: default_slug(),
        }
    }
}

fn default_opensea_api_base() -> String {
    "https://api.opensea.io/v2".to_string()
}

/// OpenSea feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSeaConfig {
    pub api_base: String,

    /// Sent as the X-API-KEY header when present.
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,
}

impl Default for OpenSeaConfig {
    fn default() -> Self {
        Self {
            api_base: default_opensea_api_base(),
            api_key: None,
        }
    }
}

fn default_magiceden_api_base() -> String {
    "https://api-mainnet.magiceden.dev/v3/rtp/ethereum".to_string()
}

fn default_source_domain() -> String {
    "magiceden.io".to_string()
}

/// Magic Eden feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MagicEdenConfig {
    pub api_base: String,

    /// Sent as a bearer token when present.
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Only asks placed on this marketplace domain are kept; the feed
    /// relays orders from other venues too.
    pub source_domain: String,
}

impl Default for MagicEdenConfig {
    fn default() -> Self {
        Self {
            api_base: default_magiceden_api_base(),
            api_key: None,
            source_domain: default_source_domain(),
        }
    }
}

/// Default refresh interval (3 minutes).
fn default_interval() -> Duration {
    Duration::from_secs(3 * 60)
}

fn default_max_pages() -> usize {
    30
}

fn default_page_limit() -> usize {
    100
}

/// Refresh cadence and pagination bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Time between the end of one refresh cycle and the start of the next.
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub interval: Duration,

    /// Upper bound on pages fetched per source per cycle.
    pub max_pages: usize,

    /// Listings requested per page.
    pub page_limit: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_pages: default_max_pages(),
            page_limit: default_page_limit(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collection being tracked.
    pub collection: CollectionConfig,

    /// OpenSea feed settings.
    pub opensea: OpenSeaConfig,

    /// Magic Eden feed settings.
    pub magiceden: MagicEdenConfig,

    /// Refresh cadence settings.
    pub refresh: RefreshConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collection.slug, "good-vibes-club");
        assert_eq!(
            config.collection.contract,
            "0xb8ea78fcacef50d41375e44e6814ebba36bb33c4"
        );
        assert_eq!(config.opensea.api_base, "https://api.opensea.io/v2");
        assert!(config.opensea.api_key.is_none());
        assert_eq!(config.magiceden.source_domain, "magiceden.io");
        assert_eq!(config.refresh.interval, Duration::from_secs(180));
        assert_eq!(config.refresh.max_pages, 30);
        assert_eq!(config.refresh.page_limit, 100);
    }

    #[test]
    fn test_load_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("floorwatch.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "[collection]")?;
        writeln!(file, "contract = \"0xabc\"")?;
        writeln!(file, "slug = \"my-collection\"")?;
        writeln!(file, "[opensea]")?;
        writeln!(file, "api_key = \"sekrit\"")?;
        writeln!(file, "[refresh]")?;
        writeln!(file, "interval = \"5m\"")?;
        writeln!(file, "max_pages = 10")?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.collection.contract, "0xabc");
        assert_eq!(config.collection.slug, "my-collection");
        assert_eq!(
            config.opensea.api_key.as_ref().unwrap().expose_secret(),
            "sekrit"
        );
        assert_eq!(config.refresh.interval, Duration::from_secs(300));
        assert_eq!(config.refresh.max_pages, 10);
        // Unset values fall back to defaults.
        assert_eq!(config.refresh.page_limit, 100);
        assert_eq!(config.magiceden.source_domain, "magiceden.io");

        Ok(())
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("floorwatch.toml");

        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.collection.slug, "good-vibes-club");

        Ok(())
    }

    #[test]
    fn test_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("missing.toml");

        let config = Config::load_or_default(&config_path)?;
        assert_eq!(config.refresh.max_pages, 30);

        Ok(())
    }

    #[test]
    fn test_api_keys_never_serialized() {
        let mut config = Config::default();
        config.opensea.api_key = Some(SecretString::from("sekrit"));
        config.magiceden.api_key = Some(SecretString::from("sekrit2"));

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("sekrit"));
    }
}
