// Domain layer - Trace, parameter and profile models with their pure algorithms
pub mod error;
pub mod friction;
pub mod geodesy;
pub mod parameters;
pub mod profile;
pub mod trace;
