//! # Path following library.
//!
//! This library allows the executable, the benchmarks and other crates in the workspace to access
//! the path following core.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Controllers - lateral and longitudinal PID, manual and idle controllers and the actuator rate
/// limiter
pub mod ctrl;

/// Error classification shared by the library modules
pub mod error;

/// Path module - fits a spline path through waypoints and queries closest points
pub mod path;

/// Simulation - runs a controller against a vehicle model
pub mod sim;

/// Track module - constant width track around a path, with an inside test
pub mod track;
