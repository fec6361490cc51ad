//! Pure conversions from sensor space to the radar canvas.
//!
//! Render space is centred on the sensor with y pointing up. Device bearings
//! increase clockwise, so every point is reflected across the horizontal axis
//! exactly once after scaling, whether it was placed from its polar reading
//! or from a precomputed offset.
//!
//! Bearing 0° (forward) lands on the +x axis, to the right of centre, and
//! 180° to the left. Bearing 90° lands below centre, as does a positive
//! device `y` offset: `render_y = -(y * scale)`. Nothing is drawn "up" for
//! forward; the gate arcs sit on the horizontal axis.

use crate::domain::{ScanPoint, ScanSnapshot};

/// Half-width of the detection cone, in degrees.
pub const CONE_HALF_ANGLE_DEG: f64 = 10.0;
/// Bearings the gate arcs are drawn around (forward and backward).
pub const GATE_ARC_CENTERS_DEG: [f64; 2] = [0.0, 180.0];
/// Calibration margin applied to the closest forward reading.
pub const CALIBRATION_MARGIN: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPoint {
    pub x: f64,
    pub y: f64,
}

/// A scan point placed on the canvas together with its gate classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlottedPoint {
    pub position: RenderPoint,
    pub in_zone: bool,
}

pub fn to_render_space(point: &ScanPoint, scale: f64) -> RenderPoint {
    let (x, y) = point.offset.unwrap_or_else(|| {
        let angle = point.angle_deg.to_radians();
        (point.distance * angle.cos(), point.distance * angle.sin())
    });

    RenderPoint {
        x: x * scale,
        y: -(y * scale),
    }
}

/// True when the point is inside the gate radius and the forward cone.
///
/// Both comparisons are strict: a point exactly on the radius or exactly on a
/// cone edge is outside.
pub fn is_in_gate_zone(point: &ScanPoint, gate_threshold: f64) -> bool {
    let in_cone = point.angle_deg < CONE_HALF_ANGLE_DEG
        || point.angle_deg > 360.0 - CONE_HALF_ANGLE_DEG;
    in_cone && point.distance < gate_threshold
}

pub fn classify(snapshot: &ScanSnapshot, scale: f64) -> Vec<PlottedPoint> {
    snapshot
        .points
        .iter()
        .map(|point| PlottedPoint {
            position: to_render_space(point, scale),
            in_zone: is_in_gate_zone(point, snapshot.gate_threshold),
        })
        .collect()
}

/// Samples an arc of `radius` centred on `center_deg` spanning `±half_span_deg`.
pub fn arc_points(
    center_deg: f64,
    half_span_deg: f64,
    radius: f64,
    steps: usize,
) -> Vec<RenderPoint> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / steps as f64;
            let bearing = (center_deg - half_span_deg) + t * 2.0 * half_span_deg;
            to_render_space(&ScanPoint::polar(bearing, radius), 1.0)
        })
        .collect()
}

/// Both gate arcs at the given radius, already in render space.
pub fn gate_arcs(gate_radius: f64, steps: usize) -> Vec<Vec<RenderPoint>> {
    GATE_ARC_CENTERS_DEG
        .iter()
        .map(|&center| arc_points(center, CONE_HALF_ANGLE_DEG, gate_radius, steps))
        .collect()
}

pub fn count_in_zone(snapshot: &ScanSnapshot) -> usize {
    snapshot
        .points
        .iter()
        .filter(|point| is_in_gate_zone(point, snapshot.gate_threshold))
        .count()
}

/// Threshold suggestion: the closest reading inside the forward cone plus a margin.
pub fn suggest_threshold(points: &[ScanPoint]) -> Option<f64> {
    points
        .iter()
        .filter(|point| is_in_gate_zone(point, f64::INFINITY))
        .map(|point| point.distance)
        .fold(None, |closest: Option<f64>, distance| {
            Some(closest.map_or(distance, |current| current.min(distance)))
        })
        .map(|closest| closest * CALIBRATION_MARGIN)
}
