use ::config::{Config, File};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{Result, VanirError};

/// Loads configuration from a file into a struct.
/// Supports TOML, YAML, JSON, etc. based on file extension.
pub fn load_config<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path_str = path
        .as_ref()
        .to_str()
        .ok_or_else(|| VanirError::Config("Invalid config path".to_string()))?;

    let settings = Config::builder()
        .add_source(File::with_name(path_str))
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
