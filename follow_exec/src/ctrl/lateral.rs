//! # Lateral controller
//!
//! Steers the vehicle onto the path. A sentinel point is projected a fixed
//! distance ahead of the vehicle along its heading, and the target is the
//! closest path sample to the sentinel. The cross-track error is the planar
//! distance between the two, signed positive when the target lies to the left
//! of the vehicle's heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{check_step, pid_term::PidTerm, CtrlError, Params, VehicleState};
use crate::path::Path;
use util::maths::sign;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral (steering) PID controller.
#[derive(Debug, Clone, Serialize)]
pub struct LateralCtrl {
    pid: PidTerm,

    /// Distance ahead of the vehicle of the sentinel point
    lookahead_m: f64,

    /// Last target point on the path
    target_m: Vector3<f64>,

    /// Last sentinel point
    sentinel_m: Vector3<f64>,

    /// Last steering output
    steering: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LateralCtrl {
    pub fn new(k_p: f64, k_i: f64, k_d: f64, lookahead_m: f64) -> Self {
        Self {
            pid: PidTerm::new(k_p, k_i, k_d),
            lookahead_m,
            target_m: Vector3::zeros(),
            sentinel_m: Vector3::zeros(),
            steering: 0.0,
        }
    }

    /// Create a new controller from the lateral parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.lat_k_p,
            params.lat_k_i,
            params.lat_k_d,
            params.lat_lookahead_m,
        )
    }

    /// Advance the controller by `step_s` and return the steering target in
    /// `[-1, 1]`.
    pub fn advance(
        &mut self,
        step_s: f64,
        state: &VehicleState,
        path: &Path,
    ) -> Result<f64, CtrlError> {
        check_step(step_s)?;

        let pos_m = Vector3::new(state.position_m.x, state.position_m.y, 0.0);

        self.sentinel_m = pos_m + Vector3::new(
            state.heading_rad.cos(),
            state.heading_rad.sin(),
            0.0,
        ) * self.lookahead_m;

        let (target_m, _) = path.closest_point(&self.sentinel_m)?;
        self.target_m = target_m;

        // Planar error vector
        let mut err_vec = self.target_m - self.sentinel_m;
        err_vec.z = 0.0;

        // The target is left of the heading if the sentinel to target rotation
        // about the vehicle is anticlockwise
        let side = sign(
            (self.sentinel_m - pos_m)
                .cross(&(self.target_m - pos_m))
                .dot(&Vector3::z()),
        );

        let error_m = side * err_vec.norm();

        self.steering = self.pid.update(error_m, step_s);

        trace!(
            "LatCtrl: err {:.4} m, int {:.4}, deriv {:.4}, steering {:.4}",
            error_m,
            self.pid.integral(),
            self.pid.deriv(),
            self.steering
        );

        Ok(self.steering)
    }

    /// Last target point on the path
    pub fn target(&self) -> Vector3<f64> {
        self.target_m
    }

    /// Last sentinel point
    pub fn sentinel(&self) -> Vector3<f64> {
        self.sentinel_m
    }

    /// Last signed cross-track error
    pub fn error(&self) -> f64 {
        self.pid.error()
    }

    pub fn steering(&self) -> f64 {
        self.steering
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::SplineParams;

    /// A path along y = 0 with a sample at x = 5
    fn straight_path() -> Path {
        let wps = vec![
            Vector3::new(-10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(20.0, 0.0, 0.0),
        ];
        let params = SplineParams {
            num_samples: 301,
            ..Default::default()
        };
        Path::fit(&wps, &params).unwrap()
    }

    #[test]
    fn test_aligned_vehicle_does_not_steer() {
        let path = straight_path();
        let mut ctrl = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);

        let steering = ctrl
            .advance(0.1, &VehicleState::new(0.0, 0.0, 0.0, 0.0), &path)
            .unwrap();

        assert!(steering.abs() < 1e-9);
        assert!((ctrl.sentinel() - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((ctrl.target() - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_steering_sign_flips_with_offset() {
        let path = straight_path();

        let mut left = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);
        let left_steering = left
            .advance(0.1, &VehicleState::new(0.0, 1.0, 0.0, 0.0), &path)
            .unwrap();

        let mut right = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);
        let right_steering = right
            .advance(0.1, &VehicleState::new(0.0, -1.0, 0.0, 0.0), &path)
            .unwrap();

        // Left of the path steers right (negative), and the reverse
        assert!((left_steering + 0.4).abs() < 1e-6);
        assert!((right_steering - 0.4).abs() < 1e-6);
        assert!((left.error() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_error_steers_back() {
        let path = straight_path();
        let mut ctrl = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);

        // Pointing away to the left of the path
        let steering = ctrl
            .advance(0.1, &VehicleState::new(0.0, 0.0, 0.3, 0.0), &path)
            .unwrap();

        assert!(steering < 0.0);
    }

    #[test]
    fn test_invalid_step() {
        let path = straight_path();
        let mut ctrl = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);
        let state = VehicleState::new(0.0, 0.0, 0.0, 0.0);

        for step in [0.0, -0.1, std::f64::INFINITY].iter() {
            assert!(matches!(
                ctrl.advance(*step, &state, &path),
                Err(CtrlError::InvalidStep(_))
            ));
        }
    }

    #[test]
    fn test_empty_path() {
        let path = Path::from_points(Vec::new(), false);
        let mut ctrl = LateralCtrl::new(0.4, 0.0, 0.0, 5.0);

        assert!(matches!(
            ctrl.advance(0.1, &VehicleState::new(0.0, 0.0, 0.0, 0.0), &path),
            Err(CtrlError::PathError(_))
        ));
    }
}
