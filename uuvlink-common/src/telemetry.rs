use serde::{Deserialize, Serialize};

/// Latest sensor snapshot from the motor/sensor microcontroller. Any subset
/// of fields may be present; the sample is replaced wholesale on each
/// well-formed line, never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct TelemetrySample {
    #[serde(rename = "p1_psi")]
    pub p1: Option<f64>,
    #[serde(rename = "p2_psi")]
    pub p2: Option<f64>,
    #[serde(rename = "dist1_cm")]
    pub laser1: Option<f64>,
    #[serde(rename = "dist2_cm")]
    pub laser2: Option<f64>,
}

impl TelemetrySample {
    /// Parse one serial telemetry line: an optional `T ` sentinel followed
    /// by a complete JSON object. Returns `None` for anything else; the
    /// caller keeps its previous sample in that case.
    pub fn parse_line(line: &str) -> Option<TelemetrySample> {
        let body = line.trim();
        let body = body.strip_prefix("T ").unwrap_or(body);
        if !(body.starts_with('{') && body.ends_with('}')) {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}

/// Gateway-side state echoed back to the operator with every packet.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GatewayStatus {
    pub arm: bool,
    pub timeout: bool,
    pub left: f64,
    pub right: f64,
}

/// Outbound telemetry envelope, one per forward tick.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryPacket {
    /// Wall-clock seconds since the UNIX epoch.
    pub t: f64,
    pub sens: SensorFields,
    pub state: GatewayStatus,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensorFields {
    pub p1: Option<f64>,
    pub p2: Option<f64>,
    pub laser1: Option<f64>,
    pub laser2: Option<f64>,
}

impl TelemetryPacket {
    /// `sample` is `None` until the first well-formed line arrives; the
    /// operator sees nulls rather than invented readings.
    pub fn build(t: f64, sample: Option<&TelemetrySample>, state: GatewayStatus) -> Self {
        let sens = match sample {
            Some(s) => SensorFields {
                p1: s.p1,
                p2: s.p2,
                laser1: s.laser1,
                laser2: s.laser2,
            },
            None => SensorFields {
                p1: None,
                p2: None,
                laser1: None,
                laser2: None,
            },
        };
        Self { t, sens, state }
    }
}
