//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Length of one simulation tick.
    ///
    /// Units: seconds
    pub step_s: f64,

    /// Time at which the simulation stops.
    ///
    /// Units: seconds
    pub end_time_s: f64,

    /// Initial vehicle state as `[x_m, y_m, heading_rad, speed_ms]`. If not
    /// given the vehicle starts on the first path sample, facing along the
    /// path.
    pub initial_state: Option<[f64; 4]>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            step_s: 1e-2,
            end_time_s: 60.0,
            initial_state: None,
        }
    }
}
