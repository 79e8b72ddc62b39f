use crate::domain::{NewDevice, DEFAULT_LOCATION};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Seed record as written in a JSON seed file
///
/// Omitted fields take the store defaults, so `{"name": "RVM-1"}` is a valid
/// entry describing an active, never-used machine in Cairo.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSeed {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_usage: Option<DateTime<Utc>>,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_is_active() -> bool {
    true
}

impl From<DeviceSeed> for NewDevice {
    fn from(seed: DeviceSeed) -> Self {
        NewDevice {
            name: seed.name,
            location: seed.location,
            is_active: seed.is_active,
            last_usage: seed.last_usage,
        }
    }
}

/// Parse a JSON array of seed records
pub fn parse_seed(json: &str) -> Result<Vec<NewDevice>> {
    let seeds: Vec<DeviceSeed> =
        serde_json::from_str(json).context("Failed to parse device seed JSON")?;
    Ok(seeds.into_iter().map(NewDevice::from).collect())
}

/// Read and parse a seed file
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<NewDevice>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed(&json)
}
