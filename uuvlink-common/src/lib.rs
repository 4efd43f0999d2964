pub mod command;
pub mod config;
pub mod gate;
pub mod pacer;
pub mod serial;
pub mod telemetry;
pub mod util;
