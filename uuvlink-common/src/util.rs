use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().expect("invalid log level directive")),
        )
        .try_init()
        .expect("Failed to initialize logging");
}

/// Wall-clock seconds since the UNIX epoch, the timestamp the operator
/// console expects in telemetry packets.
pub fn unix_time() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
