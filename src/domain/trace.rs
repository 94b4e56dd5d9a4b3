// Trace domain model - Raw coordinates and distance-annotated trace points
use crate::domain::error::ProfileError;
use crate::domain::geodesy::haversine_distance;
use serde::{Deserialize, Serialize};

/// A vertex of the pipeline path as read from the trace document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

impl RawCoordinate {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Altitude with the producer default of 0 m when absent.
    pub fn altitude_or_zero(&self) -> f64 {
        self.altitude.unwrap_or(0.0)
    }

    pub fn distance_to(&self, other: &RawCoordinate) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracePoint {
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub distance_from_start_m: f64,
}

/// Caller-supplied point, validated into a [`TracePoint`] by position.
#[derive(Debug, Clone, Deserialize)]
pub struct TracePointInput {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub distance_from_start_m: f64,
}

impl TracePoint {
    fn validated(
        index: usize,
        latitude: f64,
        longitude: f64,
        elevation_m: f64,
        distance_from_start_m: f64,
    ) -> Result<Self, ProfileError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ProfileError::point(index, format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ProfileError::point(index, format!("longitude {longitude} out of range")));
        }
        if !elevation_m.is_finite() {
            return Err(ProfileError::point(index, "elevation is not finite"));
        }
        if !distance_from_start_m.is_finite() || distance_from_start_m < 0.0 {
            return Err(ProfileError::point(index, "distance is not a finite non-negative value"));
        }
        Ok(Self {
            index,
            latitude,
            longitude,
            elevation_m,
            distance_from_start_m,
        })
    }
}

/// Build the ordered trace from raw coordinates and a parallel elevation array.
///
/// Point 0 sits at distance 0; every later point adds the great-circle distance
/// from its predecessor to the running total.
pub fn build_trace_points(
    coordinates: &[RawCoordinate],
    elevations: &[f64],
) -> Result<Vec<TracePoint>, ProfileError> {
    let mut points = Vec::with_capacity(coordinates.len());
    let mut cumulative = 0.0;
    let mut previous: Option<&RawCoordinate> = None;

    for (index, coordinate) in coordinates.iter().enumerate() {
        let elevation = *elevations
            .get(index)
            .ok_or_else(|| ProfileError::point(index, "no elevation for coordinate"))?;

        if let Some(prev) = previous {
            cumulative += prev.distance_to(coordinate);
        }

        points.push(TracePoint::validated(
            index,
            coordinate.latitude,
            coordinate.longitude,
            elevation,
            cumulative,
        )?);
        previous = Some(coordinate);
    }

    Ok(points)
}

/// Validate caller-supplied points whose distances were computed elsewhere.
pub fn trace_points_from_inputs(
    inputs: Vec<TracePointInput>,
) -> Result<Vec<TracePoint>, ProfileError> {
    let mut points: Vec<TracePoint> = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let point = TracePoint::validated(
            index,
            input.latitude,
            input.longitude,
            input.elevation_m,
            input.distance_from_start_m,
        )?;

        match points.last() {
            None if point.distance_from_start_m != 0.0 => {
                return Err(ProfileError::point(index, "first point must start at distance 0"));
            }
            Some(prev) if point.distance_from_start_m < prev.distance_from_start_m => {
                return Err(ProfileError::point(index, "distance decreases along the trace"));
            }
            _ => {}
        }
        points.push(point);
    }

    Ok(points)
}
