//! # Cubic smoothing splines
//!
//! Fits a cubic spline to one coordinate of a set of waypoints, using the
//! Reinsch formulation. For knots `u_0 < ... < u_{n-1}` and values `y` the
//! spline minimises
//!
//! ```text
//! sum_i (y_i - f(u_i))^2 + lambda * integral f''(u)^2 du
//! ```
//!
//! which reduces to the banded system `(R + lambda Q'Q) gamma = Q'y`, where
//! `gamma` are the second derivatives at the knots and the fitted values are
//! `y - lambda Q gamma`. With `lambda = 0` the spline interpolates every value.
//!
//! Open splines use natural end conditions (zero second derivative at both
//! ends). Periodic splines wrap the last interval back onto the first knot so
//! value, slope and curvature are continuous across the seam.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

use super::PathError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fitted cubic spline over a single coordinate.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Knot parameter values, strictly increasing. For periodic splines this
    /// includes the closing knot, so there is one more knot than values.
    knots: Vec<f64>,

    /// Fitted values at each knot (equal to the input values when
    /// interpolating). Same length as `knots`.
    values: Vec<f64>,

    /// Second derivative at each knot. Same length as `knots`.
    second_derivs: Vec<f64>,
}

/// Value, first and second derivative of a spline at a parameter value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SplineSample {
    pub value: f64,
    pub deriv: f64,
    pub second_deriv: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit an open (natural) spline through `values` at the given `knots`.
    ///
    /// `knots` must be strictly increasing and have the same length as
    /// `values`, with at least 3 entries.
    pub fn fit_open(knots: &[f64], values: &[f64], lambda: f64) -> Result<Self, PathError> {
        let n = knots.len();
        debug_assert_eq!(n, values.len());

        if n < 3 {
            return Err(PathError::TooFewWaypoints(n));
        }

        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

        // Interior knots carry the unknown second derivatives
        let m = n - 2;
        let mut q = DMatrix::<f64>::zeros(n, m);
        let mut r = DMatrix::<f64>::zeros(m, m);

        for j in 0..m {
            let i = j + 1;
            q[(i - 1, j)] = 1.0 / h[i - 1];
            q[(i, j)] = -1.0 / h[i - 1] - 1.0 / h[i];
            q[(i + 1, j)] = 1.0 / h[i];

            r[(j, j)] = (h[i - 1] + h[i]) / 3.0;
            if j + 1 < m {
                r[(j, j + 1)] = h[i] / 6.0;
                r[(j + 1, j)] = h[i] / 6.0;
            }
        }

        let (fitted, gamma) = solve_reinsch(&q, &r, values, lambda)?;

        let mut second_derivs = Vec::with_capacity(n);
        second_derivs.push(0.0);
        second_derivs.extend(gamma.iter());
        second_derivs.push(0.0);

        Ok(Self {
            knots: knots.to_vec(),
            values: fitted,
            second_derivs,
        })
    }

    /// Fit a periodic spline.
    ///
    /// `knots` has one more entry than `values`: the final knot is the
    /// parameter at which the curve returns to `values[0]`. At least 3 values
    /// are required.
    pub fn fit_periodic(knots: &[f64], values: &[f64], lambda: f64) -> Result<Self, PathError> {
        let n = values.len();
        debug_assert_eq!(knots.len(), n + 1);

        if n < 3 {
            return Err(PathError::TooFewWaypoints(n));
        }

        // h[j] is the interval from knot j to knot j+1, with h[n-1] closing the loop
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

        let mut q = DMatrix::<f64>::zeros(n, n);
        let mut r = DMatrix::<f64>::zeros(n, n);

        for j in 0..n {
            let prev = (j + n - 1) % n;
            let next = (j + 1) % n;

            q[(prev, j)] += 1.0 / h[prev];
            q[(j, j)] += -1.0 / h[prev] - 1.0 / h[j];
            q[(next, j)] += 1.0 / h[j];

            r[(j, j)] += (h[prev] + h[j]) / 3.0;
            r[(j, next)] += h[j] / 6.0;
            r[(next, j)] += h[j] / 6.0;
        }

        let (mut fitted, gamma) = solve_reinsch(&q, &r, values, lambda)?;
        let mut second_derivs: Vec<f64> = gamma.iter().copied().collect();

        // Close the loop on the final knot
        fitted.push(fitted[0]);
        second_derivs.push(second_derivs[0]);

        Ok(Self {
            knots: knots.to_vec(),
            values: fitted,
            second_derivs,
        })
    }

    /// Get the parameter range covered by the spline.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Evaluate the spline at `u`.
    ///
    /// Values of `u` outside the knot range are extrapolated from the end
    /// intervals.
    pub fn eval(&self, u: f64) -> SplineSample {
        let k = self.interval(u);
        let h = self.knots[k + 1] - self.knots[k];
        let a = self.knots[k + 1] - u;
        let b = u - self.knots[k];

        let (y0, y1) = (self.values[k], self.values[k + 1]);
        let (m0, m1) = (self.second_derivs[k], self.second_derivs[k + 1]);

        let value = m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 - m0 * h * h / 6.0) * a / h
            + (y1 - m1 * h * h / 6.0) * b / h;

        let deriv = -m0 * a * a / (2.0 * h)
            + m1 * b * b / (2.0 * h)
            + (y1 - y0) / h
            - (m1 - m0) * h / 6.0;

        let second_deriv = (m0 * a + m1 * b) / h;

        SplineSample {
            value,
            deriv,
            second_deriv,
        }
    }

    /// Index of the knot interval containing `u`.
    fn interval(&self, u: f64) -> usize {
        let num_intervals = self.knots.len() - 1;
        let upper = self.knots.partition_point(|&k| k <= u);

        upper.saturating_sub(1).min(num_intervals - 1)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the Reinsch system, returning the fitted values and the second
/// derivatives at the unknown knots.
fn solve_reinsch(
    q: &DMatrix<f64>,
    r: &DMatrix<f64>,
    values: &[f64],
    lambda: f64,
) -> Result<(Vec<f64>, DVector<f64>), PathError> {
    let y = DVector::from_column_slice(values);
    let qt = q.transpose();

    let lhs = r + (&qt * q) * lambda;
    let rhs = &qt * &y;

    // The system matrix is symmetric positive definite for any lambda >= 0
    let gamma = lhs
        .cholesky()
        .ok_or(PathError::SingularSystem)?
        .solve(&rhs);

    let fitted = if lambda > 0.0 {
        let correction = (q * &gamma) * lambda;
        (y - correction).iter().copied().collect()
    } else {
        values.to_vec()
    };

    Ok((fitted, gamma))
}
