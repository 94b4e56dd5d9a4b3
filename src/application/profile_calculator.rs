// Hydraulic profile calculator - Single forward pass placing pumps and valves
use crate::domain::error::ProfileError;
use crate::domain::friction::{boundary_coefficient, interpolate};
use crate::domain::parameters::HydraulicParameters;
use crate::domain::profile::{Alarm, AnnotatedPoint, Direction};
use crate::domain::trace::TracePoint;

/// Arrival pressure below which a pump is required.
pub const MIN_SERVICE_PRESSURE_KGCM2: f64 = 1.0;
/// Hose rating; pressures above this raise an alarm.
pub const PRESSURE_ALARM_LIMIT_PSI: f64 = 200.0;
pub const KGCM2_TO_PSI: f64 = 14.223_343;
const WATER_COLUMN_M_PER_KGCM2: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HydraulicProfile {
    pub points: Vec<AnnotatedPoint>,
    pub alarms: Vec<Alarm>,
    pub warnings: Vec<String>,
    pub line_normalized_flow_bpm: f64,
    pub friction_coefficient: f64,
}

/// Friction loss in kg/cm² over `distance_m` of line.
pub fn friction_loss(coefficient: f64, distance_m: f64) -> f64 {
    coefficient * (distance_m / 1000.0)
}

#[derive(Debug, Clone, Copy)]
struct Upstream {
    friction: f64,
    elevation: f64,
    outlet: f64,
}

#[derive(Debug, Default)]
struct PassState {
    upstream: Option<Upstream>,
    station_friction: f64,
    points: Vec<AnnotatedPoint>,
    alarms: Vec<Alarm>,
}

impl PassState {
    fn advance(mut self, point: &TracePoint, coefficient: f64, pumping_pressure: f64) -> Self {
        let friction = friction_loss(coefficient, point.distance_from_start_m);

        let (direction, arrival) = match self.upstream {
            None => (Direction::Flat, 0.0),
            Some(up) => {
                let rise = point.elevation_m - up.elevation;
                let arrival =
                    up.outlet - (friction - up.friction) - rise / WATER_COLUMN_M_PER_KGCM2;
                (Direction::from_rise(rise), arrival)
            }
        };

        // The injection point always hosts the first pump.
        let is_pump = self.upstream.is_none() || arrival < MIN_SERVICE_PRESSURE_KGCM2;
        let is_valve = !is_pump && direction == Direction::Descending && arrival > pumping_pressure;
        let outlet = if is_pump || is_valve { pumping_pressure } else { arrival };

        let segment_friction = friction - self.station_friction;
        if is_pump || is_valve {
            self.station_friction = friction;
        }

        let peak_psi = arrival.abs().max(outlet.abs()) * KGCM2_TO_PSI;
        if peak_psi > PRESSURE_ALARM_LIMIT_PSI {
            self.alarms.push(Alarm {
                point_index: point.index,
                message: format!(
                    "pressure of {:.1} psi at {:.0} m exceeds the {} psi hose rating",
                    peak_psi, point.distance_from_start_m, PRESSURE_ALARM_LIMIT_PSI
                ),
                value_psi: peak_psi,
            });
        }

        self.points.push(AnnotatedPoint {
            point: point.clone(),
            friction_loss_kgcm2: friction,
            direction,
            segment_friction_kgcm2: segment_friction,
            pressure_head_kgcm2: arrival,
            pressure_delta_kgcm2: outlet - arrival,
            outlet_pressure_kgcm2: outlet,
            is_pump,
            is_valve,
        });
        self.upstream = Some(Upstream {
            friction,
            elevation: point.elevation_m,
            outlet,
        });
        self
    }
}

/// Run the profile pass over an ordered trace.
pub fn calculate_profile(
    points: &[TracePoint],
    parameters: &HydraulicParameters,
) -> Result<HydraulicProfile, ProfileError> {
    if points.is_empty() {
        return Err(ProfileError::EmptyPoints);
    }

    let bpm = parameters.line_normalized_flow();
    let mut warnings = Vec::new();

    // Constant for the run: it depends only on flow and diameter.
    let lookup = interpolate(parameters.diameter(), bpm);
    let coefficient = match lookup.coefficient {
        Some(coefficient) => coefficient,
        None => {
            let message = lookup
                .message
                .unwrap_or_else(|| format!("no friction coefficient for {:.2} bpm", bpm));
            tracing::warn!("{}", message);
            warnings.push(message);
            boundary_coefficient(parameters.diameter(), bpm).unwrap_or(0.0)
        }
    };
    tracing::debug!(
        "Friction coefficient {} for {:.3} bpm on {} line",
        coefficient,
        bpm,
        parameters.diameter()
    );

    if let Some(warning) = interval_warning(points, parameters.calculation_interval_m()) {
        warnings.push(warning);
    }

    let pumping_pressure = parameters.pumping_pressure_kgcm2();
    let state = points.iter().fold(PassState::default(), |state, point| {
        state.advance(point, coefficient, pumping_pressure)
    });

    Ok(HydraulicProfile {
        points: state.points,
        alarms: state.alarms,
        warnings,
        line_normalized_flow_bpm: bpm,
        friction_coefficient: coefficient,
    })
}

fn interval_warning(points: &[TracePoint], interval_m: f64) -> Option<String> {
    let spans: Vec<f64> = points
        .windows(2)
        .map(|w| w[1].distance_from_start_m - w[0].distance_from_start_m)
        .filter(|span| *span > interval_m)
        .collect();
    let longest = spans.iter().copied().fold(f64::NAN, f64::max);

    (!spans.is_empty()).then(|| {
        format!(
            "{} segment(s) exceed the {} m calculation interval (longest {:.0} m)",
            spans.len(),
            interval_m,
            longest
        )
    })
}
