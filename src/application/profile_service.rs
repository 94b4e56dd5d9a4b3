// Profile service - Use case composing trace extraction, elevation and the profile pass
use crate::application::elevation_resolver::ElevationResolver;
use crate::application::output_assembler::assemble;
use crate::application::profile_calculator::calculate_profile;
use crate::domain::error::ProfileError;
use crate::domain::parameters::{HydraulicParameters, HydraulicParametersInput};
use crate::domain::profile::{CalculationResult, ElevationOrigin};
use crate::domain::trace::{
    build_trace_points, trace_points_from_inputs, TracePoint, TracePointInput,
};
use crate::infrastructure::kmz_reader::{self, ParsedTrace, ValidationReport};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProfileService {
    resolver: Arc<dyn ElevationResolver>,
    max_document_bytes: u64,
}

impl ProfileService {
    pub fn new(resolver: Arc<dyn ElevationResolver>) -> Self {
        Self {
            resolver,
            max_document_bytes: kmz_reader::DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    /// Cap on the inflated KML document read from uploaded containers.
    pub fn with_max_document_bytes(mut self, max_document_bytes: u64) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    pub fn validate(&self, container: &[u8]) -> ValidationReport {
        kmz_reader::validate_within(container, self.max_document_bytes)
    }

    pub fn parse(&self, container: &[u8]) -> Result<ParsedTrace, ProfileError> {
        kmz_reader::parse_within(container, self.max_document_bytes)
    }

    /// Full pipeline: KMZ bytes in, hydraulic profile out.
    pub async fn execute(
        &self,
        container: &[u8],
        parameters: &HydraulicParameters,
    ) -> Result<CalculationResult, ProfileError> {
        let trace = self.parse(container)?;
        let (elevations, origin) = self.resolve_elevations(&trace).await?;
        let points = build_trace_points(&trace.coordinates, &elevations)?;

        let mut result = assemble(calculate_profile(&points, parameters)?, origin);
        let mut warnings = trace.warnings;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }

    /// Profile points whose distances and elevations are already known.
    pub fn calculate(
        &self,
        points: &[TracePoint],
        parameters: &HydraulicParameters,
    ) -> Result<CalculationResult, ProfileError> {
        Ok(assemble(calculate_profile(points, parameters)?, ElevationOrigin::FromFile))
    }

    /// Profile a `{ "points": [...], "parameters": {...} }` request body.
    pub fn calculate_from_json(&self, request: &Value) -> Result<CalculationResult, ProfileError> {
        let raw_points = request
            .get("points")
            .and_then(Value::as_array)
            .ok_or(ProfileError::NonArrayInput)?;
        let raw_parameters = match request.get("parameters") {
            None | Some(Value::Null) => return Err(ProfileError::MissingParameters),
            Some(value) => value,
        };
        if raw_points.is_empty() {
            return Err(ProfileError::EmptyPoints);
        }

        let input: HydraulicParametersInput = serde_json::from_value(raw_parameters.clone())
            .map_err(|e| ProfileError::InvalidParameters(e.to_string()))?;
        let parameters = HydraulicParameters::try_from(input)?;

        let inputs = raw_points
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                serde_json::from_value::<TracePointInput>(raw.clone())
                    .map_err(|e| ProfileError::point(index, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let points = trace_points_from_inputs(inputs)?;

        self.calculate(&points, &parameters)
    }

    async fn resolve_elevations(
        &self,
        trace: &ParsedTrace,
    ) -> Result<(Vec<f64>, ElevationOrigin), ProfileError> {
        if trace.has_elevations {
            let elevations = trace.coordinates.iter().map(|c| c.altitude_or_zero()).collect();
            return Ok((elevations, ElevationOrigin::FromFile));
        }

        tracing::info!(
            "Trace has no usable altitudes, resolving {} elevations from service",
            trace.coordinates.len()
        );
        let elevations = self
            .resolver
            .get_elevations(&trace.coordinates)
            .await
            .map_err(|e| ProfileError::ElevationResolution(format!("{:#}", e)))?;

        if elevations.len() != trace.coordinates.len() {
            return Err(ProfileError::ElevationResolution(format!(
                "expected {} elevations, got {}",
                trace.coordinates.len(),
                elevations.len()
            )));
        }

        Ok((elevations, ElevationOrigin::FromService))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::trace::RawCoordinate;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver returning canned elevations and counting calls.
    pub struct StubResolver {
        pub response: Result<Vec<f64>, String>,
        pub calls: AtomicUsize,
    }

    impl StubResolver {
        pub fn returning(elevations: Vec<f64>) -> Self {
            Self {
                response: Ok(elevations),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ElevationResolver for StubResolver {
        async fn get_elevations(&self, _coordinates: &[RawCoordinate]) -> anyhow::Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }
}
