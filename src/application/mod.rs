// Application layer - Profile calculation use cases and the ports they depend on
pub mod elevation_resolver;
pub mod output_assembler;
pub mod profile_calculator;
pub mod profile_service;
