//! # Path Following Executable Parameters
//!
//! This module provide parameters for the path following executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use follow_lib::{ctrl::manual::TimedCmd, path::SplineParams, sim::BicycleParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FollowExecParams {

    /// Waypoint file, relative to the data directory (or absolute)
    pub waypoints_file: String,

    /// How to fit the path through the waypoints
    #[serde(default)]
    pub spline: SplineParams,

    /// Full width of the track around the path.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Which controller drives the vehicle
    #[serde(default)]
    pub ctrl: CtrlKind,

    /// Commands for the manual controller
    #[serde(default)]
    pub manual_script: Vec<TimedCmd>,

    /// Vehicle model parameters
    #[serde(default)]
    pub vehicle: BicycleParams,

    /// Controller parameter file, relative to the params directory
    pub ctrl_params_file: String,

    /// Simulation parameter file, relative to the params directory
    pub sim_params_file: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtrlKind {
    Pid,
    Manual,
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CtrlKind {
    fn default() -> Self {
        CtrlKind::Pid
    }
}
