use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Settings shared by every gateway process.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseConfig {
    pub bind_address: String,
    pub operator_host: String,
    pub watchdog_timeout_ms: u64,
}

pub trait LoadConfig {
    fn load_config(service_name: &str) -> Result<Self, ConfigError>
    where
        Self: Sized + serde::de::DeserializeOwned,
    {
        // Development tree first, installed location second.
        let dev_path = PathBuf::from("config");
        let prod_path = PathBuf::from("/etc/uuvlink");

        let config_dir = if dev_path.join(format!("{}.toml", service_name)).exists() {
            dev_path
        } else if prod_path.join(format!("{}.toml", service_name)).exists() {
            prod_path
        } else {
            return Err(ConfigError::NotFound(format!(
                "Config file not found in {:?}",
                prod_path.join(format!("{}.toml", service_name))
            )));
        };

        let config = Config::builder()
            .add_source(File::from(config_dir.join("base.toml")).required(false))
            .add_source(File::from(
                config_dir.join(format!("{}.toml", service_name)),
            ))
            // Environment variables override, e.g. UUVLINK_OPERATOR_HOST
            .add_source(Environment::with_prefix("UUVLINK"))
            .build()?;

        config.try_deserialize()
    }
}
