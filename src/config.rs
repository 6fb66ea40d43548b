//! Endpoint and camera configuration, read from the environment.
//!
//! | Variable                    | Default                                           |
//! |-----------------------------|---------------------------------------------------|
//! | `VEHICLE_COUNT_URL`         | `http://localhost:5678/webhook/vehicle_count/all` |
//! | `VEHICLE_COUNT_SOURCES`     | `1,2,3,4`                                         |
//! | `VEHICLE_COUNT_SOURCE_TYPE` | `camera`                                          |

use anyhow::{Context, Result, bail};

use crate::model::SourceId;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5678/webhook/vehicle_count/all";
pub const DEFAULT_SOURCE_TYPE: &str = "camera";
pub const DEFAULT_SOURCES: [u32; 4] = [1, 2, 3, 4];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub source_type: String,
    /// Queried in this order; fixed for the session.
    pub sources: Vec<SourceId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
            sources: DEFAULT_SOURCES.iter().copied().map(SourceId).collect(),
        }
    }
}

impl Config {
    /// Loads from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("VEHICLE_COUNT_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(kind) = lookup("VEHICLE_COUNT_SOURCE_TYPE").filter(|v| !v.trim().is_empty()) {
            config.source_type = kind.trim().to_string();
        }

        if let Some(raw) = lookup("VEHICLE_COUNT_SOURCES") {
            config.sources =
                parse_sources(&raw).context("Invalid VEHICLE_COUNT_SOURCES")?;
        }

        Ok(config)
    }
}

/// Parses a comma-separated list of camera ids. Duplicates are dropped,
/// keeping the first occurrence.
pub fn parse_sources(raw: &str) -> Result<Vec<SourceId>> {
    let mut sources = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: SourceId = part
            .parse()
            .with_context(|| format!("'{part}' is not a camera id"))?;
        if !sources.contains(&id) {
            sources.push(id);
        }
    }

    if sources.is_empty() {
        bail!("at least one camera id is required");
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.sources,
            vec![SourceId(1), SourceId(2), SourceId(3), SourceId(4)]
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("VEHICLE_COUNT_URL", "https://counts.example.com/all"),
            ("VEHICLE_COUNT_SOURCES", "7, 3"),
            ("VEHICLE_COUNT_SOURCE_TYPE", "sensor"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://counts.example.com/all");
        assert_eq!(config.sources, vec![SourceId(7), SourceId(3)]);
        assert_eq!(config.source_type, "sensor");
    }

    #[test]
    fn test_blank_url_keeps_default() {
        let config = Config::from_lookup(lookup(&[("VEHICLE_COUNT_URL", "  ")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_parse_sources_dedups() {
        assert_eq!(
            parse_sources("2,1,2,,3").unwrap(),
            vec![SourceId(2), SourceId(1), SourceId(3)]
        );
    }

    #[test]
    fn test_parse_sources_rejects_bad_input() {
        assert!(parse_sources("1,two").is_err());
        assert!(parse_sources("-1").is_err());
        assert!(parse_sources(" , ").is_err());
        assert!(Config::from_lookup(lookup(&[("VEHICLE_COUNT_SOURCES", "")])).is_err());
    }
}
