use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::error::FetchError;

/// Native threshold values arrive in tenths of the canonical unit (mm → cm).
pub const DEFAULT_THRESHOLD_DIVISOR: f64 = 10.0;
/// Point distances are already canonical in the reference snapshot format.
pub const DEFAULT_DISTANCE_DIVISOR: f64 = 1.0;

/// Conversion factors from the sensor-native unit to the canonical rendering unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub threshold_divisor: f64,
    pub distance_divisor: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            threshold_divisor: DEFAULT_THRESHOLD_DIVISOR,
            distance_divisor: DEFAULT_DISTANCE_DIVISOR,
        }
    }
}

impl UnitScale {
    pub fn threshold(self, native: f64) -> f64 {
        native / self.threshold_divisor
    }

    pub fn distance(self, native: f64) -> f64 {
        native / self.distance_divisor
    }
}

/// One detection, already expressed in canonical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPoint {
    pub angle_deg: f64,
    pub distance: f64,
    /// Precomputed Cartesian offset, used for placement only.
    pub offset: Option<(f64, f64)>,
}

impl ScanPoint {
    pub const fn polar(angle_deg: f64, distance: f64) -> Self {
        Self {
            angle_deg,
            distance,
            offset: None,
        }
    }

    pub const fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Some((x, y));
        self
    }
}

/// A whole scan plus the gate threshold that was active when it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSnapshot {
    pub points: Vec<ScanPoint>,
    pub gate_threshold: f64,
    pub received_at: DateTime<Local>,
}

impl ScanSnapshot {
    pub fn new(points: Vec<ScanPoint>, gate_threshold: f64) -> Self {
        Self {
            points,
            gate_threshold,
            received_at: Local::now(),
        }
    }
}

/// JSON body served by the scan endpoint.
#[derive(Debug, Deserialize)]
pub struct ScanPayload {
    #[serde(default)]
    pub scan: Vec<serde_json::Value>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    angle: Option<f64>,
    distance: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
}

impl RawPoint {
    fn normalize(self, units: UnitScale) -> Option<ScanPoint> {
        let angle = self.angle.filter(|value| value.is_finite())?;
        let distance = self.distance.filter(|value| value.is_finite())?;
        let mut point = ScanPoint::polar(angle, units.distance(distance));
        if let (Some(x), Some(y)) = (self.x, self.y) {
            if x.is_finite() && y.is_finite() {
                point = point.with_offset(units.distance(x), units.distance(y));
            }
        }
        Some(point)
    }
}

impl ScanPayload {
    /// Converts the wire payload into a canonical snapshot.
    ///
    /// An `error` field always wins over any data in the same payload. Point
    /// records that are missing `angle`/`distance` or carry non-numeric values
    /// are dropped individually.
    pub fn into_snapshot(self, units: UnitScale) -> Result<ScanSnapshot, FetchError> {
        if let Some(message) = self.error {
            return Err(FetchError::Server(message));
        }

        let threshold = self
            .threshold
            .filter(|value| value.is_finite())
            .ok_or_else(|| FetchError::Decode("missing threshold".to_string()))?;

        let total = self.scan.len();
        let points: Vec<ScanPoint> = self
            .scan
            .into_iter()
            .filter_map(|value| serde_json::from_value::<RawPoint>(value).ok())
            .filter_map(|raw| raw.normalize(units))
            .collect();

        if points.len() < total {
            tracing::debug!(
                skipped = total - points.len(),
                "Skipped malformed scan points"
            );
        }

        Ok(ScanSnapshot::new(points, units.threshold(threshold)))
    }
}
