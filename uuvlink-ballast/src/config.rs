use once_cell::sync::Lazy;
use serde::Deserialize;
use uuvlink_common::config::{BaseConfig, LoadConfig};

pub static CONFIG: Lazy<BallastConfig> =
    Lazy::new(|| BallastConfig::load_config("ballast").expect("Failed to load configuration"));

#[derive(Debug, Deserialize)]
pub struct BallastConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub log_level: String,

    pub network: NetworkConfig,
    pub serial: SerialConfig,
    pub rates: RateConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    pub ballast_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct SerialConfig {
    pub device: String,
    pub baud: u32,
    pub boot_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RateConfig {
    pub serial_interval_ms: u64,
}

impl LoadConfig for BallastConfig {}
