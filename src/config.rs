use std::{fs, path::{Path, PathBuf}, time::Duration};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

/// Interactive region map: pick a region, inspect its statistics
#[derive(Debug, Parser)]
#[command(name = "region-atlas", version)]
pub struct Args {
    /// Backend serving `region/{gid}`
    #[arg(long, env = "REGION_ATLAS_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// TOML file with the list of selectable regions
    #[arg(long, env = "REGION_ATLAS_REGIONS", default_value = "data/regions.toml")]
    pub regions: PathBuf,

    /// HTTP timeout for a single region request
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Args {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid region catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("region catalog has no entries")]
    NoRegions,
}

/// Jedna pozycja menu wyboru regionu
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RegionEntry {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default, rename = "region")]
    regions: Vec<RegionEntry>,
}

/// Wczytuje listę regionów z pliku TOML (`[[region]]` z `gid` i `name`)
pub fn load_regions<P: AsRef<Path>>(path: P) -> Result<Vec<RegionEntry>, ConfigError> {
    let path = path.as_ref();
    let txt = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_regions(&txt)
}

pub fn parse_regions(txt: &str) -> Result<Vec<RegionEntry>, ConfigError> {
    let catalog: Catalog = toml::from_str(txt)?;
    if catalog.regions.is_empty() {
        return Err(ConfigError::NoRegions);
    }
    Ok(catalog.regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog() {
        let regions = parse_regions(
            r#"
            [[region]]
            gid = "42"
            name = "Styria"

            [[region]]
            gid = "7"
            name = "Tyrol"
            "#,
        )
        .unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0], RegionEntry { gid: "42".into(), name: "Styria".into() });
    }

    #[test]
    fn empty_catalog_is_an_error() {
        assert!(matches!(parse_regions(""), Err(ConfigError::NoRegions)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_regions("does/not/exist.toml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["region-atlas"]);
        assert_eq!(args.timeout(), Duration::from_secs(10));
        assert_eq!(args.regions, PathBuf::from("data/regions.toml"));
    }
}
