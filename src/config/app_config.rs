use std::env;
use std::fs;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub session_file: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = AppConfig::get_config_directory()?;

        let mut config = Config::builder();
        if config_dir.join("config.yml").exists() {
            config = config.add_source(File::from(config_dir.join("config.yml")))
        }

        config = config.add_source(Environment::with_prefix("shelf"))
            .set_default("api_url", "http://localhost:3000/api")?
            .set_default("session_file", "session.yml")?
            .set_default("request_timeout_secs", "0")?;

        config.build()?.try_deserialize()
    }

    pub fn write_config(config: &AppConfig) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(config)
            .map_err(|err| ConfigError::Foreign(Box::new(err)))?;
        let config_path = AppConfig::get_config_directory()?.join("config.yml");
        fs::write(config_path, yaml).map_err(|err| ConfigError::Foreign(Box::new(err)))
    }

    /// Where the bearer token is persisted. Relative paths live in the config directory.
    pub fn session_path(&self) -> Result<PathBuf, ConfigError> {
        let path = PathBuf::from(&self.session_file);
        if path.is_absolute() {
            return Ok(path);
        }
        Ok(AppConfig::get_config_directory()?.join(path))
    }

    fn get_config_directory() -> Result<PathBuf, ConfigError> {
        let config_dir = match env::var("SHELF_CONF_DIR") {
            Ok(path) => PathBuf::from(path),
            Err(_) => env::current_dir().map_err(|err| ConfigError::Foreign(Box::new(err)))?,
        };

        fs::create_dir_all(&config_dir).map_err(|err| ConfigError::Foreign(Box::new(err)))?;

        Ok(config_dir)
    }
}
