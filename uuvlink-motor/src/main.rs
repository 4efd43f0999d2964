use anyhow::Result;
use std::sync::atomic::Ordering;
use tokio::signal;
use tracing::{error, info};

use uuvlink_common::util::setup_logging;
use uuvlink_motor::config::CONFIG;
use uuvlink_motor::gateway::MotorGateway;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(&CONFIG.log_level);
    info!("Motor gateway starting...");

    let gateway = MotorGateway::new()?;
    let running = gateway.running_handle();

    let loop_handle = tokio::task::spawn_blocking(move || gateway.run());

    let shutdown_signal = async {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping motor gateway...");
                running.store(false, Ordering::SeqCst);
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    };

    shutdown_signal.await;

    match loop_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Motor gateway error: {e}"),
        Err(e) => error!("Motor gateway join error: {e}"),
    }

    info!("Shutdown complete");
    Ok(())
}
