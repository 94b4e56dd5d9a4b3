// Great-circle distance between geographic coordinates

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two (lat, lon) pairs given in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let to_rad = |deg: f64| deg.to_radians();
    let dlat = to_rad(lat2 - lat1);
    let dlon = to_rad(lon2 - lon1);
    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_at_equator() {
        let dist = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((dist - 111_195.0).abs() < 200.0);
    }

    #[test]
    fn test_symmetric_and_zero() {
        let pairs = [
            ((-38.233023, -68.629742), (-38.23531, -68.627113)),
            ((51.5, -0.12), (40.71, -74.0)),
            ((89.9, 179.9), (-89.9, -179.9)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            assert_eq!(
                haversine_distance(lat1, lon1, lat2, lon2),
                haversine_distance(lat2, lon2, lat1, lon1)
            );
            assert_eq!(haversine_distance(lat1, lon1, lat1, lon1), 0.0);
        }
    }

    #[test]
    fn test_short_pipeline_segment() {
        let dist = haversine_distance(-38.233023, -68.629742, -38.23531, -68.627113);
        assert!((dist - 342.6).abs() < 1.0);
    }
}
