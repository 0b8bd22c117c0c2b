//! # PID path following controller
//!
//! Combines the lateral and longitudinal controllers with an actuator rate
//! limiter. Each advance asks both controllers for their targets, then
//! integrates the rate limiter towards them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;

// Internal
use super::*;
use crate::path::Path;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct PidCtrl {
    lat_ctrl: LateralCtrl,
    lon_ctrl: LongitudinalCtrl,
    limiter: RateLimiter,

    /// Reference path for the lateral controller
    path: Path,

    /// Vehicle state from the last synchronize
    state: Option<VehicleState>,

    /// Targets produced by the controllers in the last advance
    targets: VehicleInputs,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidCtrl {
    /// Create a new controller following `path`.
    pub fn new(params: &Params, path: Path) -> Result<Self, CtrlError> {
        Ok(Self::from_parts(
            LateralCtrl::from_params(params),
            LongitudinalCtrl::from_params(params),
            RateLimiter::new(
                params.native_step_s,
                params.actuator_gains,
                params.actuator_max_deltas,
            )?,
            path,
        ))
    }

    /// Create a controller from already configured parts.
    pub fn from_parts(
        lat_ctrl: LateralCtrl,
        lon_ctrl: LongitudinalCtrl,
        limiter: RateLimiter,
        path: Path,
    ) -> Self {
        Self {
            lat_ctrl,
            lon_ctrl,
            limiter,
            path,
            state: None,
            targets: VehicleInputs::default(),
        }
    }

    /// Last target point on the path
    pub fn target(&self) -> Vector3<f64> {
        self.lat_ctrl.target()
    }

    /// Last sentinel point
    pub fn sentinel(&self) -> Vector3<f64> {
        self.lat_ctrl.sentinel()
    }

    /// Targets from the last advance, before rate limiting
    pub fn targets(&self) -> VehicleInputs {
        self.targets
    }

    pub fn lat_ctrl(&self) -> &LateralCtrl {
        &self.lat_ctrl
    }

    pub fn lon_ctrl(&self) -> &LongitudinalCtrl {
        &self.lon_ctrl
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Controller for PidCtrl {
    fn synchronize(&mut self, _time_s: f64, state: &VehicleState) {
        self.state = Some(*state);
    }

    fn advance(&mut self, step_s: f64) -> Result<(), CtrlError> {
        let state = self.state.ok_or(CtrlError::NoVehicleState)?;

        let steering = self.lat_ctrl.advance(step_s, &state, &self.path)?;
        let (throttle, braking) = self.lon_ctrl.advance(step_s, state.speed_ms)?;

        self.targets = VehicleInputs::new(steering, throttle, braking);
        self.limiter.advance(step_s, &self.targets);

        trace!("PidCtrl: targets {:?}, output {:?}", self.targets, self.limiter.output());

        Ok(())
    }

    fn get_inputs(&self) -> VehicleInputs {
        self.limiter.output()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::SplineParams;

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
    fn test_advance_before_synchronize() {
        let mut ctrl = PidCtrl::new(&Params::default(), straight_path()).unwrap();
        assert!(matches!(ctrl.advance(0.1), Err(CtrlError::NoVehicleState)));
    }

    #[test]
    fn test_invalid_native_step() {
        let params = Params {
            native_step_s: 0.0,
            ..Default::default()
        };
        let err = PidCtrl::new(&params, straight_path()).err().unwrap();
        assert!(matches!(err, CtrlError::RateLimiterError(_)));
    }

    #[test]
    fn test_inputs_follow_targets_at_limited_rate() {
        let params = Params::default();
        let mut ctrl = PidCtrl::new(&params, straight_path()).unwrap();

        // Left of the path and slower than the target speed
        ctrl.synchronize(0.0, &VehicleState::new(0.0, 1.0, 0.0, 5.0));
        ctrl.advance(0.01).unwrap();

        let targets = ctrl.targets();
        assert!((targets.steering + 0.4).abs() < 1e-6);
        assert!((targets.throttle - 0.8).abs() < 1e-12);
        assert_eq!(targets.braking, 0.0);

        // Ten native steps of first order response, 0.4 * (1 - 0.996^10)
        let inputs = ctrl.get_inputs();
        assert!(inputs.steering < -0.015 && inputs.steering > -0.016);
        assert!(inputs.throttle > 0.0 && inputs.throttle < targets.throttle);

        assert!((ctrl.sentinel() - Vector3::new(5.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((ctrl.target() - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_error_propagates_from_controllers() {
        let mut ctrl = PidCtrl::new(&Params::default(), straight_path()).unwrap();
        ctrl.synchronize(0.0, &VehicleState::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(ctrl.advance(-1.0), Err(CtrlError::InvalidStep(_))));
    }
}
