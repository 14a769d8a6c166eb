//! Credential, hint and output documents on disk.
//!
//! Files ending in `.yaml`/`.yml` are YAML; anything else is read as JSON.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

use crate::{credentials::ProviderCredentials, metadata::is_yaml_path, schema::FormatHints};

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
    if is_yaml_path(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing YAML file {path:?}"))
    } else {
        serde_json::from_str(&raw).with_context(|| format!("Parsing JSON file {path:?}"))
    }
}

pub fn save_to_path<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let serialized = if is_yaml_path(path) {
        serde_yaml::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    fs::write(path, serialized).with_context(|| format!("Writing config file {path:?}"))
}

pub fn load_credentials(path: &Path) -> Result<ProviderCredentials> {
    load_from_path(path).with_context(|| format!("Loading provider credentials from {path:?}"))
}

pub fn load_hints(path: &Path) -> Result<FormatHints> {
    load_from_path(path).with_context(|| format!("Loading format hints from {path:?}"))
}

pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
