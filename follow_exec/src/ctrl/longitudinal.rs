//! # Longitudinal controller
//!
//! Holds a target speed. The PID output on the speed error is split into a
//! throttle and a braking target with a hysteresis: when the vehicle is too
//! fast but was recently on the throttle, the throttle is eased off instead of
//! switching straight to the brakes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{check_step, pid_term::PidTerm, CtrlError, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Longitudinal (throttle and braking) PID controller.
#[derive(Debug, Clone, Serialize)]
pub struct LongitudinalCtrl {
    pid: PidTerm,

    /// Speed to hold
    target_speed_ms: f64,

    /// Previous throttle above which throttle is eased off rather than braking
    throttle_threshold: f64,

    /// Last throttle target
    throttle: f64,

    /// Last braking target
    braking: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LongitudinalCtrl {
    pub fn new(k_p: f64, k_i: f64, k_d: f64, target_speed_ms: f64, throttle_threshold: f64) -> Self {
        Self {
            pid: PidTerm::new(k_p, k_i, k_d),
            target_speed_ms,
            throttle_threshold,
            throttle: 0.0,
            braking: 0.0,
        }
    }

    /// Create a new controller from the longitudinal parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::new(
            params.lon_k_p,
            params.lon_k_i,
            params.lon_k_d,
            params.lon_target_speed_ms,
            params.lon_throttle_threshold,
        )
    }

    /// Advance the controller by `step_s` given the current speed, returning
    /// the `(throttle, braking)` targets.
    pub fn advance(&mut self, step_s: f64, speed_ms: f64) -> Result<(f64, f64), CtrlError> {
        check_step(step_s)?;

        let error_ms = self.target_speed_ms - speed_ms;
        let raw = self.pid.update(error_ms, step_s);

        if raw > 0.0 {
            // Too slow
            self.throttle = raw;
            self.braking = 0.0;
        } else if self.throttle > self.throttle_threshold {
            // Too fast, ease off
            self.throttle += raw;
            self.braking = 0.0;
        } else {
            // Too fast, brake
            self.throttle = 0.0;
            self.braking = -raw;
        }

        trace!(
            "LonCtrl: err {:.4} m/s, raw {:.4}, throttle {:.4}, braking {:.4}",
            error_ms,
            raw,
            self.throttle,
            self.braking
        );

        Ok((self.throttle, self.braking))
    }

    pub fn target_speed_ms(&self) -> f64 {
        self.target_speed_ms
    }

    /// Last speed error
    pub fn error(&self) -> f64 {
        self.pid.error()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_error_gives_zero_output() {
        let mut ctrl = LongitudinalCtrl::new(0.4, 0.1, 0.05, 7.0, 0.2);

        for _ in 0..100 {
            let (throttle, braking) = ctrl.advance(0.05, 7.0).unwrap();
            assert_eq!(throttle, 0.0);
            assert_eq!(braking, 0.0);
        }
    }

    #[test]
    fn test_too_slow_throttles() {
        let mut ctrl = LongitudinalCtrl::new(0.4, 0.0, 0.0, 7.0, 0.2);

        let (throttle, braking) = ctrl.advance(0.1, 6.0).unwrap();
        assert!((throttle - 0.4).abs() < 1e-12);
        assert_eq!(braking, 0.0);

        // Saturated
        let (throttle, _) = ctrl.advance(0.1, 0.0).unwrap();
        assert_eq!(throttle, 1.0);
    }

    #[test]
    fn test_too_fast_eases_off_throttle() {
        let mut ctrl = LongitudinalCtrl::new(0.4, 0.0, 0.0, 7.0, 0.2);

        ctrl.advance(0.1, 5.0).unwrap();

        // Previous throttle 0.8 is over the threshold, so ease off by 0.2
        let (throttle, braking) = ctrl.advance(0.1, 7.5).unwrap();
        assert!((throttle - 0.6).abs() < 1e-12);
        assert_eq!(braking, 0.0);
    }

    #[test]
    fn test_too_fast_brakes() {
        let mut ctrl = LongitudinalCtrl::new(0.4, 0.0, 0.0, 7.0, 0.2);

        ctrl.advance(0.1, 6.75).unwrap();

        // Previous throttle 0.1 is under the threshold
        let (throttle, braking) = ctrl.advance(0.1, 8.0).unwrap();
        assert_eq!(throttle, 0.0);
        assert!((braking - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_step() {
        let mut ctrl = LongitudinalCtrl::new(0.4, 0.0, 0.0, 7.0, 0.2);
        let err = ctrl.advance(0.0, 7.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
