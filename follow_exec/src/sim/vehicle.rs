//! # Vehicle models
//!
//! The vehicle is the collaborator the controllers drive. It accepts actuator
//! inputs, clamps them to its own limits, and reports its planar state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::ctrl::{VehicleInputs, VehicleState};
use util::maths::{clamp, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the kinematic bicycle model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BicycleParams {
    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Front wheel angle at full steering input.
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Acceleration at full throttle.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Deceleration at full braking.
    ///
    /// Units: meters/second^2
    pub max_decel_mss: f64,

    /// Speed limit of the vehicle.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,
}

/// A kinematic bicycle vehicle model.
///
/// The state is integrated with an explicit Euler step about the rear axle.
/// Speed never goes negative, braking stops the vehicle but cannot reverse it.
#[derive(Debug, Clone)]
pub struct KinematicBicycle {
    params: BicycleParams,
    state: VehicleState,

    /// Inputs after clamping to the vehicle limits
    inputs: VehicleInputs,

    time_s: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A vehicle driven by a controller.
pub trait Vehicle {
    /// Pass the current time and actuator inputs to the vehicle.
    fn synchronize(&mut self, time_s: f64, inputs: &VehicleInputs);

    /// Advance the vehicle by `step_s` seconds.
    fn advance(&mut self, step_s: f64);

    /// Get the current state of the vehicle.
    fn get_state(&self) -> VehicleState;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BicycleParams {
    fn default() -> Self {
        Self {
            wheelbase_m: 2.5,
            max_steer_rad: 30f64.to_radians(),
            max_accel_mss: 3.0,
            max_decel_mss: 8.0,
            max_speed_ms: 30.0,
        }
    }
}

impl KinematicBicycle {
    pub fn new(params: BicycleParams, initial_state: VehicleState) -> Self {
        Self {
            params,
            state: initial_state,
            inputs: VehicleInputs::default(),
            time_s: 0.0,
        }
    }

    /// Inputs being applied, after clamping
    pub fn inputs(&self) -> VehicleInputs {
        self.inputs
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }
}

impl Vehicle for KinematicBicycle {
    fn synchronize(&mut self, time_s: f64, inputs: &VehicleInputs) {
        self.time_s = time_s;
        self.inputs = VehicleInputs::new(
            clamp(inputs.steering, -1.0, 1.0),
            clamp(inputs.throttle, 0.0, 1.0),
            clamp(inputs.braking, 0.0, 1.0),
        );
    }

    fn advance(&mut self, step_s: f64) {
        if step_s <= 0.0 {
            return;
        }

        let p = &self.params;
        let s = &mut self.state;

        let steer_rad = self.inputs.steering * p.max_steer_rad;
        let accel_mss = self.inputs.throttle * p.max_accel_mss - self.inputs.braking * p.max_decel_mss;

        s.position_m.x += s.speed_ms * s.heading_rad.cos() * step_s;
        s.position_m.y += s.speed_ms * s.heading_rad.sin() * step_s;
        s.heading_rad = wrap_pi(s.heading_rad + s.speed_ms / p.wheelbase_m * steer_rad.tan() * step_s);
        s.speed_ms = clamp(s.speed_ms + accel_mss * step_s, 0.0, p.max_speed_ms);

        self.time_s += step_s;
    }

    fn get_state(&self) -> VehicleState {
        self.state
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_straight_line() {
        let mut v = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 2.0));

        v.synchronize(0.0, &VehicleInputs::default());
        for _ in 0..10 {
            v.advance(0.1);
        }

        let s = v.get_state();
        assert!((s.position_m.x - 2.0).abs() < 1e-9);
        assert!(s.position_m.y.abs() < 1e-12);
        assert_eq!(s.speed_ms, 2.0);
        assert!((v.time_s() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_positive_steering_turns_left() {
        let mut v = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 5.0));

        v.synchronize(0.0, &VehicleInputs::new(0.5, 0.0, 0.0));
        for _ in 0..10 {
            v.advance(0.01);
        }

        assert!(v.get_state().heading_rad > 0.0);
    }

    #[test]
    fn test_inputs_clamped() {
        let mut v = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, PI / 2.0, 1.0));

        v.synchronize(0.0, &VehicleInputs::new(-3.0, 2.0, -1.0));
        assert_eq!(v.inputs(), VehicleInputs::new(-1.0, 1.0, 0.0));

        // Full throttle for one second
        v.advance(1.0);
        assert!((v.get_state().speed_ms - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_braking_does_not_reverse() {
        let mut v = KinematicBicycle::new(BicycleParams::default(), VehicleState::new(0.0, 0.0, 0.0, 1.0));

        v.synchronize(0.0, &VehicleInputs::new(0.0, 0.0, 1.0));
        v.advance(1.0);

        assert_eq!(v.get_state().speed_ms, 0.0);
    }
}
