//! Shared configuration loading helpers
//!
//! Every parla crate describes its settings as a serde struct with
//! `#[serde(default)]`; these helpers turn a TOML document or an environment
//! variable into those values and map failures onto [`Error`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Parse a TOML document into `T`
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Deserialization(e.to_string()))
}

/// Read and parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading configuration from: {}", path.display());

    if !path.exists() {
        return Err(Error::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    parse_toml(&content)
}

/// Render `value` as a TOML document
pub fn to_toml<T: Serialize>(value: &T) -> Result<String> {
    toml::to_string_pretty(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Read `key` from the environment and parse it.
///
/// Missing variables yield `None`. Values that fail to parse are logged and
/// ignored so a typo never prevents startup.
pub fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}
