use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use serialport::{ClearBuffer, SerialPort};
use tracing::info;

/// Longest line the framer will buffer while waiting for a terminator.
/// Telemetry lines are well under 256 bytes; anything bigger is a device
/// fault streaming garbage, and holding onto it would grow the buffer for
/// the life of the process.
const MAX_PENDING_LINE: usize = 4096;

/// Accumulates raw serial bytes and yields complete newline-terminated
/// lines. Partial lines stay buffered until their terminator arrives;
/// carriage returns and stray non-UTF8 bytes are dropped. An unterminated
/// run longer than `MAX_PENDING_LINE` is discarded wholesale, the same as
/// any other malformed line.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > MAX_PENDING_LINE && !self.buffer.contains(&b'\n') {
            self.buffer.clear();
        }
    }

    /// Pop the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
        let line: String = String::from_utf8_lossy(&raw)
            .chars()
            .filter(|&c| c != '\u{fffd}')
            .collect();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Line-oriented console over a serial device. Reads are bounded by the
/// port's timeout so the gateway loop never stalls on a quiet device.
pub struct SerialConsole {
    port: Box<dyn SerialPort>,
    framer: LineFramer,
}

impl SerialConsole {
    /// Open the device with a bounded read timeout. Failure here is fatal:
    /// the gateway is useless without its serial link.
    pub fn open(path: &str, baud: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(read_timeout)
            .open()
            .with_context(|| format!("failed to open serial device {path}"))?;
        info!("Serial open {} @ {}", path, baud);
        Ok(Self {
            port,
            framer: LineFramer::new(),
        })
    }

    /// Wait out the device's boot, then drop whatever it printed while
    /// booting so the first real exchange starts clean.
    pub fn settle(&mut self, boot_delay: Duration) -> Result<()> {
        info!("Waiting {:?} for device to initialize...", boot_delay);
        std::thread::sleep(boot_delay);
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }

    /// Discard unread input so the next write is not answered with stale
    /// data queued from before.
    pub fn drain_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        Ok(())
    }

    /// One bounded read, returning the last complete line received so far.
    /// `None` means no full line arrived within the timeout; that is the
    /// expected steady state, not an error.
    pub fn poll_line(&mut self) -> Result<Option<String>> {
        let mut chunk = [0u8; 256];
        match self.port.read(&mut chunk) {
            Ok(n) if n > 0 => self.framer.push(&chunk[..n]),
            Ok(_) => {}
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }

        let mut last = None;
        while let Some(line) = self.framer.next_line() {
            last = Some(line);
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framer_yields_complete_lines_only() {
        let mut framer = LineFramer::new();
        framer.push(b"T {\"p1_psi\"");
        assert!(framer.next_line().is_none());

        framer.push(b": 1.5}\nT {");
        assert_eq!(framer.next_line().unwrap(), "T {\"p1_psi\": 1.5}");
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn framer_strips_carriage_return() {
        let mut framer = LineFramer::new();
        framer.push(b"ok\r\n");
        assert_eq!(framer.next_line().unwrap(), "ok");
    }

    #[test]
    fn framer_discards_endless_unterminated_noise() {
        let mut framer = LineFramer::new();
        for _ in 0..10_000 {
            framer.push(&[b'x'; 1024]);
            assert!(framer.next_line().is_none());
            assert!(framer.buffer.len() <= MAX_PENDING_LINE + 1024);
        }

        // Terminating the noise surfaces the remainder as one junk line...
        framer.push(b"\n");
        let junk = framer.next_line().unwrap();
        assert!(junk.chars().all(|c| c == 'x'));

        // ...and a well-formed line still gets through afterwards.
        framer.push(b"T {\"p1_psi\": 1.0}\n");
        assert_eq!(framer.next_line().unwrap(), "T {\"p1_psi\": 1.0}");
    }

    #[test]
    fn framer_handles_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        framer.push(b"one\ntwo\nthree");
        assert_eq!(framer.next_line().unwrap(), "one");
        assert_eq!(framer.next_line().unwrap(), "two");
        assert!(framer.next_line().is_none());
        framer.push(b"\n");
        assert_eq!(framer.next_line().unwrap(), "three");
    }
}
