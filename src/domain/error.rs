// Error taxonomy for trace ingestion and hydraulic profiling
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("invalid trace: {}", .0.join("; "))]
    InvalidTrace(Vec<String>),
    #[error("trace contains no valid coordinates")]
    EmptyTrace,
    #[error("elevation lookup failed: {0}")]
    ElevationResolution(String),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid trace point at index {at_index}: {reason}")]
    TracePointConstruction { at_index: usize, reason: String },
    #[error("no trace points to calculate")]
    EmptyPoints,
    #[error("hydraulic parameters are required")]
    MissingParameters,
    #[error("points must be an ordered array")]
    NonArrayInput,
}

impl ProfileError {
    pub(crate) fn point(at_index: usize, reason: impl Into<String>) -> Self {
        ProfileError::TracePointConstruction {
            at_index,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_trace_joins_errors() {
        let err = ProfileError::InvalidTrace(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "invalid trace: first; second");
    }

    #[test]
    fn test_point_error_names_index() {
        let err = ProfileError::point(4, "latitude is not finite");
        assert_eq!(
            err.to_string(),
            "invalid trace point at index 4: latitude is not finite"
        );
    }
}
