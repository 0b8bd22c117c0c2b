//! # Actuator rate limiter
//!
//! Models actuators which cannot jump to a new value instantly. Each channel
//! follows first order dynamics towards its target, integrated at a fixed
//! native step, and the change in a single native step is limited to a
//! maximum delta. Steps longer than the native step are split into native
//! sub-steps, with a shorter final sub-step covering any remainder.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::VehicleInputs;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Fraction of the native step below which a remaining interval is treated as
/// rounding error rather than another sub-step.
const REMAINDER_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiter {
    /// Integration step
    native_step_s: f64,

    /// First order gain per (steering, throttle, braking) channel
    gains: [f64; 3],

    /// Maximum change per native step for each channel
    max_deltas: [f64; 3],

    /// Current actuator values
    output: [f64; 3],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RateLimiterError {
    #[error("The native step must be finite and positive, found {0}")]
    InvalidNativeStep(f64),

    #[error("Maximum delta of channel {0} must be finite and non-negative, found {1}")]
    InvalidMaxDelta(usize, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RateLimiter {
    /// Create a new limiter with all outputs at zero.
    pub fn new(
        native_step_s: f64,
        gains: [f64; 3],
        max_deltas: [f64; 3],
    ) -> Result<Self, RateLimiterError> {
        if !native_step_s.is_finite() || native_step_s <= 0.0 {
            return Err(RateLimiterError::InvalidNativeStep(native_step_s));
        }

        for (i, d) in max_deltas.iter().enumerate() {
            if !d.is_finite() || *d < 0.0 {
                return Err(RateLimiterError::InvalidMaxDelta(i, *d));
            }
        }

        Ok(Self {
            native_step_s,
            gains,
            max_deltas,
            output: [0.0; 3],
        })
    }

    /// Move the outputs towards `targets` over `step_s` seconds.
    ///
    /// A non-positive or non-finite step leaves the outputs unchanged. A step
    /// shorter than the native step is a single sub-step of that length.
    pub fn advance(&mut self, step_s: f64, targets: &VehicleInputs) {
        if !step_s.is_finite() || step_s <= 0.0 {
            return;
        }

        let targets = targets.to_array();
        let mut remaining_s = step_s;

        loop {
            let h = remaining_s.min(self.native_step_s);

            for i in 0..3 {
                let delta = h * self.gains[i] * (targets[i] - self.output[i]);
                self.output[i] += clamp_abs(delta, self.max_deltas[i]);
            }

            remaining_s -= h;

            if remaining_s <= REMAINDER_TOLERANCE * self.native_step_s {
                break;
            }
        }
    }

    /// Current actuator values
    pub fn output(&self) -> VehicleInputs {
        VehicleInputs::from_array(self.output)
    }

    pub fn native_step_s(&self) -> f64 {
        self.native_step_s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(0.02, [4.0, 0.25, 4.0], [0.02, 0.02, 0.02]).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            RateLimiter::new(0.0, [1.0; 3], [0.1; 3]),
            Err(RateLimiterError::InvalidNativeStep(_))
        ));
        assert!(matches!(
            RateLimiter::new(-1e-3, [1.0; 3], [0.1; 3]),
            Err(RateLimiterError::InvalidNativeStep(_))
        ));
        assert!(matches!(
            RateLimiter::new(1e-3, [1.0; 3], [0.1, -0.1, 0.1]),
            Err(RateLimiterError::InvalidMaxDelta(1, _))
        ));
    }

    #[test]
    fn test_bounded_slew() {
        let targets = VehicleInputs::new(-1.0, 1.0, 1.0);

        for step in [1e-6, 0.01, 0.02, 0.05, 0.1, 0.37, 1.0].iter() {
            let mut lim = limiter();
            let before = lim.output().to_array();
            lim.advance(*step, &targets);
            let after = lim.output().to_array();

            let num_substeps = (step / lim.native_step_s()).ceil();

            for i in 0..3 {
                assert!((after[i] - before[i]).abs() <= 0.02 * num_substeps + 1e-12);
            }
        }
    }

    #[test]
    fn test_slew_limited_steering() {
        let mut lim = limiter();

        // Steering delta h*g*e = 0.02*4*1 = 0.08 is clamped to 0.02 each sub-step
        lim.advance(0.1, &VehicleInputs::new(1.0, 0.0, 0.0));
        assert!((lim.output().steering - 0.1).abs() < 1e-12);

        // Negative targets are clamped with the sign kept
        let mut lim = limiter();
        lim.advance(0.1, &VehicleInputs::new(-1.0, 0.0, 0.0));
        assert!((lim.output().steering + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_first_order_response() {
        let mut lim = limiter();

        // Throttle delta h*g*e = 0.02*0.25*1 = 0.005 is under the limit
        lim.advance(0.02, &VehicleInputs::new(0.0, 1.0, 0.0));
        assert!((lim.output().throttle - 0.005).abs() < 1e-12);

        // Converges on the target without overshoot
        for _ in 0..10_000 {
            lim.advance(0.1, &VehicleInputs::new(0.5, 1.0, 0.0));
        }
        let out = lim.output();
        assert!((out.steering - 0.5).abs() < 1e-9);
        assert!(out.throttle <= 1.0 && (out.throttle - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tiny_step_is_one_substep() {
        let mut lim = limiter();
        lim.advance(1e-6, &VehicleInputs::new(1.0, 0.0, 0.0));
        assert!((lim.output().steering - 4e-6).abs() < 1e-15);
    }

    #[test]
    fn test_non_positive_step_is_noop() {
        let mut lim = limiter();
        lim.advance(0.0, &VehicleInputs::new(1.0, 1.0, 1.0));
        lim.advance(-0.5, &VehicleInputs::new(1.0, 1.0, 1.0));
        assert_eq!(lim.output(), VehicleInputs::default());
    }
}
