// Pipeline hydraulic profiling - KMZ trace ingestion, friction lookup and pump/valve placement
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
