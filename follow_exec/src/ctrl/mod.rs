//! # Controllers
//!
//! Controllers turn the state of the vehicle into the actuator inputs that
//! drive it. Every controller implements [`Controller`], and is ticked by the
//! simulation in two phases:
//!
//!  1. `synchronize` passes in the current time and vehicle state,
//!  2. `advance` moves the controller forward by a time step, after which
//!     `get_inputs` returns the actuator inputs to apply.
//!
//! The path following controller, [`PidCtrl`], is made of a lateral PID
//! controller producing a steering target from the cross-track error, a
//! longitudinal PID controller producing throttle and braking targets from the
//! speed error, and a rate limiter which moves the actual inputs towards those
//! targets no faster than the actuators allow.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod idle;
pub mod lateral;
pub mod longitudinal;
pub mod manual;
pub mod params;
pub mod pid;
pub mod pid_term;
pub mod rate_limiter;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use crate::error::ErrorKind;
use crate::path::PathError;

pub use idle::IdleCtrl;
pub use lateral::LateralCtrl;
pub use longitudinal::LongitudinalCtrl;
pub use manual::{ManualCmd, ManualCtrl};
pub use params::Params;
pub use pid::PidCtrl;
pub use rate_limiter::{RateLimiter, RateLimiterError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of the vehicle as seen by the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Position of the vehicle. Only the XY components are used for control.
    ///
    /// Units: meters
    pub position_m: Vector3<f64>,

    /// Heading of the vehicle, anticlockwise from the X axis.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Forward speed of the vehicle.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// Actuator inputs for the vehicle.
///
/// Steering is normalised to `[-1, 1]`, positive turning left. Throttle and
/// braking are nominally in `[0, 1]` but are not clamped here, the vehicle
/// clamps them to its own limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInputs {
    pub steering: f64,
    pub throttle: f64,
    pub braking: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CtrlError {
    #[error("Controller step must be finite and positive, found {0}")]
    InvalidStep(f64),

    #[error("The controller was advanced before any vehicle state was synchronized")]
    NoVehicleState,

    #[error("Rate limiter error: {0}")]
    RateLimiterError(#[from] RateLimiterError),

    #[error("Path error: {0}")]
    PathError(#[from] PathError),
}

/// A controller chosen at construction.
pub enum DriverCtrl {
    /// Follows a path with PID controllers
    Pid(PidCtrl),

    /// Follows manual commands
    Manual(ManualCtrl),

    /// Holds fixed inputs
    Idle(IdleCtrl),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A controller of the vehicle.
pub trait Controller {
    /// Pass the current time and vehicle state into the controller.
    fn synchronize(&mut self, time_s: f64, state: &VehicleState);

    /// Advance the controller by `step_s` seconds.
    fn advance(&mut self, step_s: f64) -> Result<(), CtrlError>;

    /// Get the current actuator inputs.
    fn get_inputs(&self) -> VehicleInputs;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleState {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64, speed_ms: f64) -> Self {
        Self {
            position_m: Vector3::new(x_m, y_m, 0.0),
            heading_rad,
            speed_ms,
        }
    }
}

impl VehicleInputs {
    pub fn new(steering: f64, throttle: f64, braking: f64) -> Self {
        Self {
            steering,
            throttle,
            braking,
        }
    }

    /// Channels as a (steering, throttle, braking) array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.steering, self.throttle, self.braking]
    }

    pub fn from_array(channels: [f64; 3]) -> Self {
        Self::new(channels[0], channels[1], channels[2])
    }
}

impl CtrlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CtrlError::InvalidStep(_) => ErrorKind::Validation,
            CtrlError::NoVehicleState => ErrorKind::Precondition,
            CtrlError::RateLimiterError(_) => ErrorKind::Validation,
            CtrlError::PathError(e) => e.kind(),
        }
    }
}

impl DriverCtrl {
    /// Short name of the controller variant
    pub fn name(&self) -> &'static str {
        match self {
            DriverCtrl::Pid(_) => "pid",
            DriverCtrl::Manual(_) => "manual",
            DriverCtrl::Idle(_) => "idle",
        }
    }
}

impl Controller for DriverCtrl {
    fn synchronize(&mut self, time_s: f64, state: &VehicleState) {
        match self {
            DriverCtrl::Pid(c) => c.synchronize(time_s, state),
            DriverCtrl::Manual(c) => c.synchronize(time_s, state),
            DriverCtrl::Idle(c) => c.synchronize(time_s, state),
        }
    }

    fn advance(&mut self, step_s: f64) -> Result<(), CtrlError> {
        match self {
            DriverCtrl::Pid(c) => c.advance(step_s),
            DriverCtrl::Manual(c) => c.advance(step_s),
            DriverCtrl::Idle(c) => c.advance(step_s),
        }
    }

    fn get_inputs(&self) -> VehicleInputs {
        match self {
            DriverCtrl::Pid(c) => c.get_inputs(),
            DriverCtrl::Manual(c) => c.get_inputs(),
            DriverCtrl::Idle(c) => c.get_inputs(),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check that a controller step is usable.
pub(crate) fn check_step(step_s: f64) -> Result<(), CtrlError> {
    if step_s.is_finite() && step_s > 0.0 {
        Ok(())
    } else {
        Err(CtrlError::InvalidStep(step_s))
    }
}
