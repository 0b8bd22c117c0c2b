//! Parameters for the path following controllers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the controllers.
///
/// Missing fields take their default value, so a parameter file only needs to
/// contain the values it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- LATERAL ----

    /// Lateral controller proportional gain
    pub lat_k_p: f64,

    /// Lateral controller integral gain
    pub lat_k_i: f64,

    /// Lateral controller derivative gain
    pub lat_k_d: f64,

    /// Distance ahead of the vehicle at which the sentinel point is placed.
    ///
    /// Units: meters
    pub lat_lookahead_m: f64,

    // ---- LONGITUDINAL ----

    /// Longitudinal controller proportional gain
    pub lon_k_p: f64,

    /// Longitudinal controller integral gain
    pub lon_k_i: f64,

    /// Longitudinal controller derivative gain
    pub lon_k_d: f64,

    /// The speed the longitudinal controller holds.
    ///
    /// Units: meters/second
    pub lon_target_speed_ms: f64,

    /// When slowing down, the previous throttle above which throttle is eased
    /// off rather than braking.
    pub lon_throttle_threshold: f64,

    // ---- ACTUATORS ----

    /// Integration step of the actuator rate limiter.
    ///
    /// Units: seconds
    pub native_step_s: f64,

    /// First order gains of the (steering, throttle, braking) actuators.
    ///
    /// Units: 1/seconds
    pub actuator_gains: [f64; 3],

    /// Maximum change of the (steering, throttle, braking) actuators in a
    /// single native step.
    pub actuator_max_deltas: [f64; 3],

    // ---- MANUAL ----

    /// Change in the (steering, throttle, braking) targets for a single
    /// manual command.
    pub manual_target_deltas: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lat_k_p: 0.4,
            lat_k_i: 0.0,
            lat_k_d: 0.0,
            lat_lookahead_m: 5.0,
            lon_k_p: 0.4,
            lon_k_i: 0.0,
            lon_k_d: 0.0,
            lon_target_speed_ms: 7.0,
            lon_throttle_threshold: 0.2,
            native_step_s: 1e-3,
            actuator_gains: [4.0, 0.25, 4.0],
            actuator_max_deltas: [1.0 / 50.0, 1.0 / 50.0, 1.0 / 50.0],
            manual_target_deltas: [0.02 / 2.0, 0.02 / 6.0, 0.02 / 1.5],
        }
    }
}
