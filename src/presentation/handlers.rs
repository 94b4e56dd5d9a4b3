// HTTP request handlers
use crate::domain::error::ProfileError;
use crate::domain::parameters::{HydraulicParameters, HydraulicParametersInput};
use crate::domain::profile::CalculationResult;
use crate::infrastructure::kmz_reader::{ParsedTrace, ValidationReport};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Structural check of an uploaded KMZ
pub async fn validate_trace(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<ValidationReport> {
    Json(state.profile_service.validate(&body))
}

/// Extract the coordinate sequence from an uploaded KMZ
pub async fn parse_trace(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ParsedTrace>, ApiError> {
    Ok(Json(state.profile_service.parse(&body)?))
}

/// Profile an uploaded KMZ with parameters from the query string
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HydraulicParametersInput>, QueryRejection>,
    body: Bytes,
) -> Result<Json<CalculationResult>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ProfileError::InvalidParameters(rejection.body_text()))?;
    let parameters = HydraulicParameters::try_from(query)?;
    let result = state.profile_service.execute(&body, &parameters).await?;
    Ok(Json(result))
}

/// Profile caller-supplied points
pub async fn calculate_points(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Value>,
) -> Result<Json<CalculationResult>, ApiError> {
    Ok(Json(state.profile_service.calculate_from_json(&request)?))
}
