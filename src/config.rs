use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::SimConfig;

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        Some("json") => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        Some(other) => Err(Error::UnsupportedConfigFormat(other.to_string())),
        None => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
    }
}
