use anyhow::Result;
use std::sync::atomic::Ordering;
use tokio::signal;
use tracing::{error, info};

use uuvlink_ballast::config::CONFIG;
use uuvlink_ballast::gateway::BallastGateway;
use uuvlink_common::util::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(&CONFIG.log_level);
    info!("Ballast gateway starting...");

    let gateway = BallastGateway::new()?;
    let running = gateway.running_handle();

    let loop_handle = tokio::task::spawn_blocking(move || gateway.run());

    let shutdown_signal = async {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping ballast gateway...");
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
        Ok(Err(e)) => error!("Ballast gateway error: {e}"),
        Err(e) => error!("Ballast gateway join error: {e}"),
    }

    info!("Shutdown complete");
    Ok(())
}
