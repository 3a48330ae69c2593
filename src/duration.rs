//! Parsing for human-readable durations like "3m", "90s", "1h".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string such as "3m", "90s", "2h", or "1d".
///
/// The value is a whole number followed by a single unit suffix
/// (`s`, `m`, `h`, or `d`). Case-insensitive, surrounding whitespace
/// is ignored.
///
/// # Examples
///
/// ```
/// use floorwatch::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
/// assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Empty duration");
    };

    let per_unit: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => anyhow::bail!("Duration must end with s, m, h, or d"),
    };

    let count: u64 = s[..s.len() - 1]
        .parse()
        .context("Invalid number in duration")?;
    let secs = count.checked_mul(per_unit).context("Duration is too large")?;

    Ok(Duration::from_secs(secs))
}

/// Render a duration using the largest unit that divides it evenly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    for (per_unit, suffix) in [(24 * 60 * 60, 'd'), (60 * 60, 'h'), (60, 'm')] {
        if secs >= per_unit && secs % per_unit == 0 {
            return format!("{}{}", secs / per_unit, suffix);
        }
    }
    format!("{secs}s")
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
