// Elevation resolver port for traces that carry no usable altitudes
use crate::domain::trace::RawCoordinate;
use async_trait::async_trait;

#[async_trait]
pub trait ElevationResolver: Send + Sync {
    /// Elevations in meters, one per coordinate, in input order.
    async fn get_elevations(&self, coordinates: &[RawCoordinate]) -> anyhow::Result<Vec<f64>>;
}
