use once_cell::sync::Lazy;
use serde::Deserialize;
use uuvlink_common::config::{BaseConfig, LoadConfig};

pub static CONFIG: Lazy<MotorConfig> =
    Lazy::new(|| MotorConfig::load_config("motor").expect("Failed to load configuration"));

#[derive(Debug, Deserialize)]
pub struct MotorConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub log_level: String,

    pub network: NetworkConfig,
    pub serial: SerialConfig,
    pub rates: RateConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    pub command_port: u16,
    pub telemetry_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct SerialConfig {
    pub device: String,
    pub baud: u32,
    /// How long the microcontroller needs after the port opens before it
    /// accepts commands.
    pub boot_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RateConfig {
    pub serial_interval_ms: u64,
    pub telemetry_interval_ms: u64,
}

impl LoadConfig for MotorConfig {}
