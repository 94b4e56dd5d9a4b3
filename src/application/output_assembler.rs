// Output assembler - Partitions the annotated profile and summarizes the trip
use crate::application::profile_calculator::HydraulicProfile;
use crate::domain::profile::{CalculationResult, ElevationOrigin, ProfileSummary};

pub fn assemble(profile: HydraulicProfile, elevation_origin: ElevationOrigin) -> CalculationResult {
    let pumps: Vec<_> = profile.points.iter().filter(|p| p.is_pump).cloned().collect();
    let valves: Vec<_> = profile.points.iter().filter(|p| p.is_valve).cloned().collect();

    let (total_distance_km, elevation_difference_m) =
        match (profile.points.first(), profile.points.last()) {
            (Some(first), Some(last)) => (
                last.point.distance_from_start_m / 1000.0,
                (last.point.elevation_m - first.point.elevation_m).abs(),
            ),
            _ => (0.0, 0.0),
        };

    let summary = ProfileSummary {
        total_distance_km,
        elevation_difference_m,
        total_pumps: pumps.len(),
        total_valves: valves.len(),
    };

    tracing::info!(
        "Profile of {:.3} km: {} pumps, {} valves, {} alarms",
        summary.total_distance_km,
        summary.total_pumps,
        summary.total_valves,
        profile.alarms.len()
    );

    CalculationResult {
        points: profile.points,
        pumps,
        valves,
        alarms: profile.alarms,
        warnings: profile.warnings,
        summary,
        elevation_origin,
        line_normalized_flow_bpm: profile.line_normalized_flow_bpm,
        friction_coefficient: profile.friction_coefficient,
    }
}
