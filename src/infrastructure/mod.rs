// Infrastructure layer - File formats, external services and configuration
pub mod config;
pub mod kmz_reader;
pub mod open_elevation;
