use serde_json::Value;

/// Operator intent for the motor gateway.
///
/// Decoding is deliberately permissive: the operator link is the least
/// reliable part of the system, and a half-filled command must degrade to
/// a safe one instead of being dropped as an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub arm: bool,
    pub surge: f64,
    pub yaw: f64,
}

impl Command {
    pub const NEUTRAL: Command = Command {
        arm: false,
        surge: 0.0,
        yaw: 0.0,
    };

    /// Decode a command datagram.
    ///
    /// Returns `None` only when the payload is not a JSON object at all.
    /// Missing or non-boolean `arm` defaults to false; missing, non-numeric
    /// or NaN axes default to 0; out-of-range axes clamp to [-1, 1].
    /// Unknown fields are ignored.
    pub fn decode(payload: &[u8]) -> Option<Command> {
        let value: Value = serde_json::from_slice(payload).ok()?;
        let obj = value.as_object()?;

        Some(Command {
            arm: obj.get("arm").and_then(Value::as_bool).unwrap_or(false),
            surge: clamp(obj.get("surge").and_then(Value::as_f64).unwrap_or(0.0)),
            yaw: clamp(obj.get("yaw").and_then(Value::as_f64).unwrap_or(0.0)),
        })
    }
}

/// Clamp an axis value to [-1, 1]; NaN maps to 0.
pub fn clamp(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(-1.0, 1.0)
}

/// 4-bit ballast valve vector, one bit per valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallastCommand([u8; 4]);

impl BallastCommand {
    /// All valves closed. This is what the board receives on watchdog timeout.
    pub const CLOSED: BallastCommand = BallastCommand(*b"0000");

    /// Parse a ballast datagram: exactly four characters from {0,1} after
    /// trimming surrounding whitespace. Anything else is rejected.
    pub fn parse(payload: &[u8]) -> Option<BallastCommand> {
        let text = std::str::from_utf8(payload).ok()?.trim();
        let bytes = text.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|&b| matches!(b, b'0' | b'1')) {
            return None;
        }
        let mut bits = [0u8; 4];
        bits.copy_from_slice(bytes);
        Some(BallastCommand(bits))
    }

    pub fn as_str(&self) -> &str {
        // Validated as ASCII 0/1 at construction.
        std::str::from_utf8(&self.0).unwrap_or("0000")
    }
}

impl std::fmt::Display for BallastCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
