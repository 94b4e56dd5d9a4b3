// Hydraulic profile domain models
use crate::domain::trace::TracePoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Flat,
    Ascending,
    Descending,
}

impl Direction {
    pub fn from_rise(rise_m: f64) -> Self {
        if rise_m > 0.0 {
            Direction::Ascending
        } else if rise_m < 0.0 {
            Direction::Descending
        } else {
            Direction::Flat
        }
    }
}

/// A trace point with the metrics derived by the profile pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedPoint {
    #[serde(flatten)]
    pub point: TracePoint,
    /// Friction loss accumulated from the injection point (K).
    pub friction_loss_kgcm2: f64,
    /// Elevation direction against the previous point (M).
    pub direction: Direction,
    /// Friction loss since the last pump or valve (N).
    pub segment_friction_kgcm2: f64,
    /// Pressure arriving at the point before any mitigation (O).
    pub pressure_head_kgcm2: f64,
    /// Boost (positive) or throttle (negative) applied at the point (P).
    pub pressure_delta_kgcm2: f64,
    pub outlet_pressure_kgcm2: f64,
    pub is_pump: bool,
    pub is_valve: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alarm {
    pub point_index: usize,
    pub message: String,
    pub value_psi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub total_distance_km: f64,
    pub elevation_difference_m: f64,
    pub total_pumps: usize,
    pub total_valves: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationOrigin {
    FromFile,
    FromService,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub points: Vec<AnnotatedPoint>,
    pub pumps: Vec<AnnotatedPoint>,
    pub valves: Vec<AnnotatedPoint>,
    pub alarms: Vec<Alarm>,
    pub warnings: Vec<String>,
    pub summary: ProfileSummary,
    pub elevation_origin: ElevationOrigin,
    pub line_normalized_flow_bpm: f64,
    pub friction_coefficient: f64,
}
