use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use vanir_common::error::{Result, VanirError};
use vanir_common::utils::config::load_config;
use vanir_common::utils::logging::LoggingConfig;

// Singleton config instance
static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();

#[derive(Debug, Deserialize, Clone)]
pub struct MempoolConfig {
    /// Depth of the chain event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CoreConfig {
    #[serde(default)]
    pub mempool: MempoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub fn init_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config: CoreConfig = load_config(path)?;
    CORE_CONFIG
        .set(config)
        .map_err(|_| VanirError::Config("Config already initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static CoreConfig {
    CORE_CONFIG.get().expect("Config not initialized")
}
