use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use uuvlink_common::command::BallastCommand;
use uuvlink_common::gate::FreshnessGate;
use uuvlink_common::pacer::Pacer;
use uuvlink_common::serial::SerialConsole;

use crate::config::CONFIG;

const IO_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Active,
    Timeout,
}

/// Relays 4-bit valve vectors from the operator to the ballast board.
/// Same loop shape as the motor gateway, minus mixing and telemetry: a
/// valid command holds until the watchdog trips, after which the board
/// receives the all-closed vector.
pub struct BallastGateway {
    socket: UdpSocket,
    console: SerialConsole,
    gate: FreshnessGate<BallastCommand>,
    serial_pacer: Pacer,
    state: LinkState,
    running: Arc<AtomicBool>,
}

impl BallastGateway {
    pub fn new() -> Result<Self> {
        let bind = format!("{}:{}", CONFIG.base.bind_address, CONFIG.network.ballast_port);
        let socket = UdpSocket::bind(&bind).with_context(|| format!("failed to bind {bind}"))?;
        socket.set_read_timeout(Some(IO_TIMEOUT))?;

        let mut console = SerialConsole::open(&CONFIG.serial.device, CONFIG.serial.baud, IO_TIMEOUT)?;
        console.settle(Duration::from_millis(CONFIG.serial.boot_delay_ms))?;

        info!("Ballast listen udp://{}", bind);

        Ok(Self {
            socket,
            console,
            gate: FreshnessGate::new(Duration::from_millis(CONFIG.base.watchdog_timeout_ms)),
            serial_pacer: Pacer::new(Duration::from_millis(CONFIG.rates.serial_interval_ms)),
            state: LinkState::Timeout,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn running_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn run(mut self) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            self.tick();
        }

        // Close every valve on the way out.
        if let Err(e) = self.console.write_line(BallastCommand::CLOSED.as_str()) {
            error!("Failed to write final all-closed vector: {e}");
        }
        info!("Ballast gateway stopped");
        Ok(())
    }

    fn tick(&mut self) {
        self.receive_command();

        let now = Instant::now();
        let effective = self.effective_command(now);

        if self.serial_pacer.due(now) {
            if let Err(e) = self.console.write_line(effective.as_str()) {
                error!("Serial write failed: {e}");
            }
        }
    }

    /// Invalid payloads never touch the stored command or its timer.
    fn receive_command(&mut self) {
        let mut buf = [0u8; 64];
        match self.socket.recv_from(&mut buf) {
            Ok((len, _)) => match BallastCommand::parse(&buf[..len]) {
                Some(cmd) => self.gate.accept(cmd, Instant::now()),
                None => debug!("Discarding invalid ballast datagram ({len} bytes)"),
            },
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => warn!("Ballast receive failed: {e}"),
        }
    }

    fn effective_command(&mut self, now: Instant) -> BallastCommand {
        let (state, effective) = effective_output(self.gate.effective(now));
        if state != self.state {
            match state {
                LinkState::Active => info!("ACTIVE  ballast={}", effective),
                LinkState::Timeout => info!("TIMEOUT ballast forced to {}", effective),
            }
            self.state = state;
        }
        effective
    }
}

/// What the board receives: the stored command while fresh, every valve
/// closed once the watchdog trips. `command` is the freshness gate's
/// output, so no stale vector is ever extrapolated here.
pub fn effective_output(command: Option<&BallastCommand>) -> (LinkState, BallastCommand) {
    match command {
        Some(cmd) => (LinkState::Active, *cmd),
        None => (LinkState::Timeout, BallastCommand::CLOSED),
    }
}
