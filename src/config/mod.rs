use serde::Deserialize;
use std::{fs, path::Path};

use crate::core::options::PublishOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub publisher: PublishOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Publisher-wide defaults for [`crate::Publisher::new`].
    pub fn publish_options(&self) -> PublishOptions {
        self.publisher.clone()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}
