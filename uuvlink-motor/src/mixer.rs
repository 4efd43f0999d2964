use uuvlink_common::command::{clamp, Command};

/// Per-tick actuator output, recomputed from the gated command and never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorFrame {
    pub left: f64,
    pub right: f64,
    pub armed: bool,
}

impl ActuatorFrame {
    pub const NEUTRAL: ActuatorFrame = ActuatorFrame {
        left: 0.0,
        right: 0.0,
        armed: false,
    };

    /// Encode the ASCII command line the motor controller expects:
    /// `C <left_us> <right_us> <0|1>`.
    pub fn encode_line(&self) -> String {
        format!(
            "C {} {} {}",
            pulse_us(self.left),
            pulse_us(self.right),
            u8::from(self.armed)
        )
    }
}

/// Differential mix of the effective command. `command` is the output of
/// the freshness gate: `None` when stale, so staleness and a disarmed
/// operator both collapse to the neutral frame here.
pub fn mix(command: Option<&Command>) -> ActuatorFrame {
    match command {
        Some(cmd) if cmd.arm => ActuatorFrame {
            left: clamp(cmd.surge + cmd.yaw),
            right: clamp(cmd.surge - cmd.yaw),
            armed: true,
        },
        _ => ActuatorFrame::NEUTRAL,
    }
}

/// Map a [-1, 1] fraction onto the ESC pulse width range [1100, 1900] µs,
/// centered at 1500.
fn pulse_us(value: f64) -> i32 {
    (1500.0 + value * 400.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed(surge: f64, yaw: f64) -> Command {
        Command {
            arm: true,
            surge,
            yaw,
        }
    }

    #[test]
    fn differential_mix() {
        let frame = mix(Some(&armed(0.5, 0.2)));
        assert!((frame.left - 0.7).abs() < 1e-9);
        assert!((frame.right - 0.3).abs() < 1e-9);
        assert!(frame.armed);
    }

    #[test]
    fn mix_saturates_at_full_deflection() {
        let frame = mix(Some(&armed(1.0, 1.0)));
        assert_eq!(frame.left, 1.0);
        assert_eq!(frame.right, 0.0);

        let frame = mix(Some(&armed(-1.0, 1.0)));
        assert_eq!(frame.left, 0.0);
        assert_eq!(frame.right, -1.0);
    }

    #[test]
    fn disarmed_command_is_neutral() {
        let cmd = Command {
            arm: false,
            surge: 0.9,
            yaw: 0.4,
        };
        assert_eq!(mix(Some(&cmd)), ActuatorFrame::NEUTRAL);
    }

    #[test]
    fn stale_is_neutral_regardless_of_content() {
        assert_eq!(mix(None), ActuatorFrame::NEUTRAL);
    }

    #[test]
    fn encodes_armed_frame() {
        let frame = mix(Some(&armed(0.5, 0.2)));
        assert_eq!(frame.encode_line(), "C 1780 1620 1");
    }

    #[test]
    fn encodes_neutral_frame() {
        assert_eq!(ActuatorFrame::NEUTRAL.encode_line(), "C 1500 1500 0");
    }

    #[test]
    fn pulse_range_is_bounded() {
        let full = mix(Some(&armed(1.0, 0.0)));
        assert_eq!(full.encode_line(), "C 1900 1900 1");

        let reverse = mix(Some(&armed(-1.0, 0.0)));
        assert_eq!(reverse.encode_line(), "C 1100 1100 1");
    }

    #[test]
    fn identical_commands_encode_identically() {
        let a = mix(Some(&armed(0.25, -0.5))).encode_line();
        let b = mix(Some(&armed(0.25, -0.5))).encode_line();
        assert_eq!(a, b);
    }
}
