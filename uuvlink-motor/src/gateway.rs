use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, warn};

use uuvlink_common::command::Command;
use uuvlink_common::gate::FreshnessGate;
use uuvlink_common::pacer::Pacer;
use uuvlink_common::serial::SerialConsole;
use uuvlink_common::telemetry::{GatewayStatus, TelemetryPacket, TelemetrySample};
use uuvlink_common::util::unix_time;

use crate::config::CONFIG;
use crate::mixer::{mix, ActuatorFrame};

/// Upper bound on any single blocking I/O step, so one quiet peripheral
/// cannot stall the whole tick.
const IO_TIMEOUT: Duration = Duration::from_millis(50);

/// Sized for the largest UDP payload, so an oversized-but-valid command
/// datagram is never truncated into a malformed one.
const RECV_BUFFER_LEN: usize = 65535;

/// Bridges the operator's UDP command link to the motor controller's
/// serial protocol, and telemetry back the other way. One synchronous
/// loop owns all state; each tick receives at most one datagram, applies
/// the watchdog, paces a serial write, polls one telemetry line, and
/// paces a telemetry forward.
pub struct MotorGateway {
    socket: UdpSocket,
    operator: SocketAddr,
    console: SerialConsole,
    gate: FreshnessGate<Command>,
    serial_pacer: Pacer,
    telemetry_pacer: Pacer,
    sample: Option<TelemetrySample>,
    was_armed: bool,
    running: Arc<AtomicBool>,
}

impl MotorGateway {
    /// Bind the command socket and open the serial link. Failure here is
    /// the only fatal class: without either resource the gateway cannot
    /// do its job.
    pub fn new() -> Result<Self> {
        let bind = format!("{}:{}", CONFIG.base.bind_address, CONFIG.network.command_port);
        let socket = UdpSocket::bind(&bind).with_context(|| format!("failed to bind {bind}"))?;
        socket.set_read_timeout(Some(IO_TIMEOUT))?;

        let operator_addr = format!(
            "{}:{}",
            CONFIG.base.operator_host, CONFIG.network.telemetry_port
        );
        let operator = operator_addr
            .to_socket_addrs()
            .with_context(|| format!("invalid operator address {operator_addr}"))?
            .next()
            .ok_or_else(|| anyhow!("operator address {operator_addr} did not resolve"))?;

        let mut console = SerialConsole::open(&CONFIG.serial.device, CONFIG.serial.baud, IO_TIMEOUT)?;
        console.settle(Duration::from_millis(CONFIG.serial.boot_delay_ms))?;

        info!("Command listen  udp://{}", bind);
        info!("Telemetry send  udp://{}", operator);

        Ok(Self {
            socket,
            operator,
            console,
            gate: FreshnessGate::new(Duration::from_millis(CONFIG.base.watchdog_timeout_ms)),
            serial_pacer: Pacer::new(Duration::from_millis(CONFIG.rates.serial_interval_ms)),
            telemetry_pacer: Pacer::new(Duration::from_millis(CONFIG.rates.telemetry_interval_ms)),
            sample: None,
            was_armed: false,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Flag shared with the shutdown handler; clearing it ends the loop
    /// after the current tick.
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn run(mut self) -> Result<()> {
        info!("Waiting for commands...");
        while self.running.load(Ordering::SeqCst) {
            self.tick();
        }

        // Leave the thrusters in a known-safe state on the way out.
        if let Err(e) = self.console.write_line(&ActuatorFrame::NEUTRAL.encode_line()) {
            error!("Failed to write final neutral frame: {e}");
        }
        info!("Motor gateway stopped");
        Ok(())
    }

    fn tick(&mut self) {
        self.receive_command();

        let now = Instant::now();
        let stale = self.gate.is_stale(now);
        let frame = mix(self.gate.effective(now));
        self.log_transition(&frame, stale);

        if self.serial_pacer.due(now) {
            self.write_actuators(&frame);
        }

        self.read_telemetry();

        if self.telemetry_pacer.due(now) {
            self.forward_telemetry(&frame, stale);
        }
    }

    /// One bounded receive per tick. No datagram within the timeout is the
    /// normal idle case; a malformed payload is dropped without touching
    /// the stored command or its timer.
    fn receive_command(&mut self) {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        match self.socket.recv_from(&mut buf) {
            Ok((len, _)) => match Command::decode(&buf[..len]) {
                Some(cmd) => self.gate.accept(cmd, Instant::now()),
                None => debug!("Discarding malformed command datagram ({len} bytes)"),
            },
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => warn!("Command receive failed: {e}"),
        }
    }

    fn write_actuators(&mut self, frame: &ActuatorFrame) {
        // Drop anything the controller sent before this command so we never
        // act on stale acknowledgements.
        if let Err(e) = self.console.drain_input() {
            warn!("Failed to drain serial input: {e}");
        }
        if let Err(e) = self.console.write_line(&frame.encode_line()) {
            // Non-fatal; the next paced tick retries naturally.
            error!("Serial write failed: {e}");
        }
    }

    fn read_telemetry(&mut self) {
        match self.console.poll_line() {
            Ok(Some(line)) => apply_telemetry_line(&mut self.sample, &line),
            Ok(None) => {}
            Err(e) => warn!("Serial read failed: {e}"),
        }
    }

    fn forward_telemetry(&mut self, frame: &ActuatorFrame, stale: bool) {
        let packet = TelemetryPacket::build(
            unix_time(),
            self.sample.as_ref(),
            GatewayStatus {
                arm: frame.armed,
                timeout: stale,
                left: frame.left,
                right: frame.right,
            },
        );
        match serde_json::to_vec(&packet) {
            Ok(payload) => {
                if let Err(e) = self.socket.send_to(&payload, self.operator) {
                    warn!("Telemetry send failed: {e}");
                }
            }
            Err(e) => error!("Telemetry encode failed: {e}"),
        }
    }

    fn log_transition(&mut self, frame: &ActuatorFrame, stale: bool) {
        if frame.armed != self.was_armed {
            if frame.armed {
                info!("ARMED  L={:+.2} R={:+.2}", frame.left, frame.right);
            } else {
                info!("SAFE   outputs neutral (stale={stale})");
            }
            self.was_armed = frame.armed;
        }
    }
}

/// Replace the stored sample only on a well-formed line; anything else is
/// dropped and the previous sample stays in force.
fn apply_telemetry_line(sample: &mut Option<TelemetrySample>, line: &str) {
    match TelemetrySample::parse_line(line) {
        Some(parsed) => *sample = Some(parsed),
        None => debug!("Ignoring unparsable telemetry line: {line:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_line_retains_previous_sample() {
        let mut sample = None;
        apply_telemetry_line(&mut sample, "T {\"p1_psi\": 14.7}");
        assert_eq!(sample.unwrap().p1, Some(14.7));

        apply_telemetry_line(&mut sample, "T {\"p1_psi\": 99.");
        assert_eq!(sample.unwrap().p1, Some(14.7));

        apply_telemetry_line(&mut sample, "booting...");
        assert_eq!(sample.unwrap().p1, Some(14.7));
    }

    #[test]
    fn well_formed_line_replaces_sample_wholesale() {
        let mut sample = None;
        apply_telemetry_line(&mut sample, "T {\"p1_psi\": 14.7, \"dist1_cm\": 85.0}");
        apply_telemetry_line(&mut sample, "T {\"p2_psi\": 3.2}");

        let current = sample.unwrap();
        assert_eq!(current.p2, Some(3.2));
        // No merging with the previous sample.
        assert_eq!(current.p1, None);
        assert_eq!(current.laser1, None);
    }

    #[test]
    fn oversized_command_datagram_survives_receive() {
        let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
        let tx = UdpSocket::bind("127.0.0.1:0").unwrap();

        let padding = "x".repeat(8192);
        let payload =
            format!("{{\"arm\": true, \"surge\": 0.5, \"yaw\": 0.0, \"pad\": \"{padding}\"}}");
        tx.send_to(payload.as_bytes(), rx.local_addr().unwrap())
            .unwrap();

        let mut buf = [0u8; RECV_BUFFER_LEN];
        let (len, _) = rx.recv_from(&mut buf).unwrap();
        assert_eq!(len, payload.len());

        let cmd = Command::decode(&buf[..len]).unwrap();
        assert!(cmd.arm);
        assert_eq!(cmd.surge, 0.5);
    }
}
