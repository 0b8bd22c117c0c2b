//! PID error integration shared by the lateral and longitudinal controllers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID term over a scalar error.
///
/// The derivative is the backward difference against the previous error and
/// the integral is accumulated with the trapezoidal rule. The previous error
/// starts at zero.
#[derive(Debug, Clone, Serialize)]
pub struct PidTerm {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// Previous error
    error: f64,

    /// Last derivative of the error
    deriv: f64,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidTerm {
    /// Create a new term with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            error: 0f64,
            deriv: 0f64,
            integral: 0f64,
        }
    }

    /// Update the term with a new error over a step of `step_s` seconds and
    /// return the output clamped to `[-1, 1]`.
    ///
    /// `step_s` must be positive, callers validate it.
    pub fn update(&mut self, error: f64, step_s: f64) -> f64 {
        debug_assert!(step_s > 0.0);

        self.deriv = (error - self.error) / step_s;
        self.integral += (error + self.error) * step_s / 2.0;
        self.error = error;

        let out = self.k_p * self.error + self.k_i * self.integral + self.k_d * self.deriv;

        util::maths::clamp(out, -1.0, 1.0)
    }

    /// The most recent error
    pub fn error(&self) -> f64 {
        self.error
    }

    /// The accumulated integral of the error
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The most recent derivative of the error
    pub fn deriv(&self) -> f64 {
        self.deriv
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_trapezoidal_integral() {
        let mut term = PidTerm::new(0.0, 1.0, 0.0);

        // First step integrates from the zero initial error
        term.update(2.0, 0.5);
        assert!((term.integral() - 0.5).abs() < 1e-12);

        term.update(2.0, 0.5);
        assert!((term.integral() - 1.5).abs() < 1e-12);

        term.update(0.0, 1.0);
        assert!((term.integral() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_backward_difference() {
        let mut term = PidTerm::new(0.0, 0.0, 0.1);

        term.update(1.0, 0.1);
        assert!((term.deriv() - 10.0).abs() < 1e-12);

        let out = term.update(1.5, 0.5);
        assert!((term.deriv() - 1.0).abs() < 1e-12);
        assert!((out - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_output_is_clamped() {
        let mut term = PidTerm::new(10.0, 0.0, 0.0);
        assert_eq!(term.update(1.0, 0.1), 1.0);
        assert_eq!(term.update(-1.0, 0.1), -1.0);
    }
}
