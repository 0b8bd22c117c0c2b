//! # Path
//!
//! This module defines the reference path followed by the controllers.
//!
//! A path is a dense, ordered set of 3D samples produced by fitting a cubic
//! spline through a set of waypoints. The spline is parameterised by the
//! normalised cumulative chord length `u` in `[0, 1]`, and the first and
//! second derivatives stored with each sample are taken with respect to `u`.
//! They are not unit length, consumers needing a direction must normalise.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod spline;
pub mod waypoints;

pub use waypoints::load_waypoints_csv;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use crate::error::ErrorKind;
use spline::CubicSpline;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance under which the first and last waypoints are considered the same
/// point when a closed path is requested.
pub const CLOSURE_TOLERANCE_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters controlling how a path is fitted through its waypoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineParams {
    /// Number of samples taken along the fitted curve.
    pub num_samples: usize,

    /// Smoothing weight. Zero fits the curve exactly through every waypoint,
    /// larger values trade waypoint accuracy for lower curvature.
    pub smoothness: f64,

    /// Whether the path is a closed loop. Requires the first and last
    /// waypoints to coincide.
    pub is_closed: bool,
}

/// A path defining the desired trajectory of the vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct Path {
    /// The waypoints this path was built from
    waypoints: Vec<Vector3<f64>>,

    /// Sampled positions along the path
    points: Vec<Vector3<f64>>,

    /// First derivative at each sample, if known
    derivatives: Option<Vec<Vector3<f64>>>,

    /// Second derivative at each sample, if known
    second_derivatives: Option<Vec<Vector3<f64>>>,

    is_closed: bool,

    /// Set if a closed path was requested but the waypoints weren't closed
    closure_downgraded: bool,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Expected at least 3 distinct waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("Consecutive waypoints {0} and {1} are coincident")]
    CoincidentWaypoints(usize, usize),

    #[error("Waypoint {0} has a non-finite coordinate")]
    NonFiniteWaypoint(usize),

    #[error("Expected at least 2 samples, found {0}")]
    InvalidNumSamples(usize),

    #[error("Smoothness must be finite and non-negative, found {0}")]
    InvalidSmoothness(f64),

    #[error("The spline system could not be solved")]
    SingularSystem,

    #[error("Attempted to query an empty path")]
    EmptyPath,

    #[error("Cannot read the waypoint file: {0}")]
    WaypointFileError(std::io::Error),

    #[error("Cannot parse the waypoint file: {0}")]
    WaypointParseError(csv::Error),

    #[error("Waypoint row {0} has {1} values, expected 3")]
    WrongDimension(usize, usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            num_samples: 100,
            smoothness: 0.0,
            is_closed: false,
        }
    }
}

impl PathError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::EmptyPath => ErrorKind::Precondition,
            PathError::WaypointFileError(_)
            | PathError::WaypointParseError(_) => ErrorKind::Io,
            _ => ErrorKind::Validation,
        }
    }
}

impl Path {
    /// Fit a spline path through the given waypoints.
    ///
    /// If `params.is_closed` is set but the first and last waypoints do not
    /// coincide the path is fitted open instead, a warning is logged and
    /// [`Path::closure_downgraded`] returns true.
    pub fn fit(waypoints: &[Vector3<f64>], params: &SplineParams) -> Result<Self, PathError> {
        // ---- VALIDATION ----

        if params.num_samples < 2 {
            return Err(PathError::InvalidNumSamples(params.num_samples));
        }

        if !params.smoothness.is_finite() || params.smoothness < 0.0 {
            return Err(PathError::InvalidSmoothness(params.smoothness));
        }

        if let Some(i) = waypoints.iter().position(|w| !w.iter().all(|c| c.is_finite())) {
            return Err(PathError::NonFiniteWaypoint(i));
        }

        if waypoints.len() < 3 {
            return Err(PathError::TooFewWaypoints(waypoints.len()));
        }

        let mut is_closed = params.is_closed;
        let mut closure_downgraded = false;

        if is_closed && !endpoints_coincide(waypoints) {
            warn!(
                "A closed path was requested but the first and last waypoints are not equal, \
                fitting an open path instead"
            );
            is_closed = false;
            closure_downgraded = true;
        }

        // The repeated closing waypoint is implied by the periodic fit
        let distinct = if is_closed {
            &waypoints[..waypoints.len() - 1]
        } else {
            waypoints
        };

        let num_distinct = count_distinct(distinct);
        if num_distinct < 3 {
            return Err(PathError::TooFewWaypoints(num_distinct));
        }

        // ---- PARAMETERISATION ----

        // Chord lengths between consecutive waypoints, including the closing
        // chord for loops.
        let num_chords = if is_closed { distinct.len() } else { distinct.len() - 1 };
        let mut knots = Vec::with_capacity(num_chords + 1);
        knots.push(0.0);

        for i in 0..num_chords {
            let j = (i + 1) % distinct.len();
            let chord = (distinct[j] - distinct[i]).norm();

            if chord <= 0.0 {
                return Err(PathError::CoincidentWaypoints(i, j));
            }

            knots.push(knots[i] + chord);
        }

        let total = knots[num_chords];
        for k in knots.iter_mut() {
            *k /= total;
        }

        // ---- FITTING ----

        let mut splines = Vec::with_capacity(3);
        for dim in 0..3 {
            let values: Vec<f64> = distinct.iter().map(|w| w[dim]).collect();

            let spline = if is_closed {
                CubicSpline::fit_periodic(&knots, &values, params.smoothness)?
            } else {
                CubicSpline::fit_open(&knots, &values, params.smoothness)?
            };

            splines.push(spline);
        }

        // ---- SAMPLING ----

        let (u_min, u_max) = splines[0].domain();
        let n = params.num_samples;

        let mut points = Vec::with_capacity(n);
        let mut derivatives = Vec::with_capacity(n);
        let mut second_derivatives = Vec::with_capacity(n);

        for i in 0..n {
            let u = u_min + (u_max - u_min) * (i as f64) / ((n - 1) as f64);

            let x = splines[0].eval(u);
            let y = splines[1].eval(u);
            let z = splines[2].eval(u);

            points.push(Vector3::new(x.value, y.value, z.value));
            derivatives.push(Vector3::new(x.deriv, y.deriv, z.deriv));
            second_derivatives.push(Vector3::new(x.second_deriv, y.second_deriv, z.second_deriv));
        }

        debug!(
            "Fitted {} path through {} waypoints ({} samples, smoothness {})",
            if is_closed { "closed" } else { "open" },
            waypoints.len(),
            n,
            params.smoothness
        );

        Ok(Self {
            waypoints: waypoints.to_vec(),
            points,
            derivatives: Some(derivatives),
            second_derivatives: Some(second_derivatives),
            is_closed,
            closure_downgraded,
        })
    }

    /// Create a raw polyline path from points, without fitting.
    ///
    /// The path has no derivatives, so it can be queried but cannot be used
    /// as a track centerline.
    pub fn from_points(points: Vec<Vector3<f64>>, is_closed: bool) -> Self {
        Self {
            waypoints: points.clone(),
            points,
            derivatives: None,
            second_derivatives: None,
            is_closed,
            closure_downgraded: false,
        }
    }

    /// Create a path from points and their derivatives, without fitting.
    ///
    /// Used for track boundaries, which keep the exact offset points.
    pub(crate) fn from_samples(
        points: Vec<Vector3<f64>>,
        derivatives: Vec<Vector3<f64>>,
        is_closed: bool,
    ) -> Self {
        debug_assert_eq!(points.len(), derivatives.len());

        Self {
            waypoints: points.clone(),
            points,
            derivatives: Some(derivatives),
            second_derivatives: None,
            is_closed,
            closure_downgraded: false,
        }
    }

    /// Get the sampled points of the path.
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Get the first derivative at each sample, if the path has them.
    pub fn derivatives(&self) -> Option<&[Vector3<f64>]> {
        self.derivatives.as_deref()
    }

    /// Get the second derivative at each sample, if the path has them.
    pub fn second_derivatives(&self) -> Option<&[Vector3<f64>]> {
        self.second_derivatives.as_deref()
    }

    /// Get the waypoints the path was built from.
    pub fn waypoints(&self) -> &[Vector3<f64>] {
        &self.waypoints
    }

    /// Whether the path is a closed loop.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// True if a closed path was requested but had to be fitted open because
    /// the first and last waypoints differed.
    pub fn closure_downgraded(&self) -> bool {
        self.closure_downgraded
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the sampled point closest to `query`, returning the point and its
    /// index.
    ///
    /// This is a linear scan over all samples. If several samples are equally
    /// close the first is returned.
    pub fn closest_point(&self, query: &Vector3<f64>) -> Result<(Vector3<f64>, usize), PathError> {
        let mut best: Option<(usize, f64)> = None;

        for (i, p) in self.points.iter().enumerate() {
            // Squared distance orders the same as distance
            let dist_sq = (p - query).norm_squared();

            match best {
                Some((_, d)) if d <= dist_sq => (),
                _ => best = Some((i, dist_sq)),
            }
        }

        match best {
            Some((i, _)) => Ok((self.points[i], i)),
            None => Err(PathError::EmptyPath),
        }
    }

    /// Get the cumulative distance along the path in the XY plane at each
    /// sample. The first entry is zero.
    pub fn length_cumulative(&self) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(self.points.len());
        let mut total = 0f64;

        if !self.points.is_empty() {
            lengths.push(0.0);
        }

        for w in self.points.windows(2) {
            total += (w[1] - w[0]).xy().norm();
            lengths.push(total);
        }

        lengths
    }

    /// Return the length of the path in meters.
    pub fn total_length(&self) -> f64 {
        self.length_cumulative().last().copied().unwrap_or(0.0)
    }

    /// Get the signed curvature at each sample in the XY plane.
    ///
    /// Positive curvature turns left (anticlockwise). Returns `None` if the
    /// path has no derivatives. Samples whose tangent has no XY component
    /// have no planar heading and are given zero curvature.
    pub fn curvature(&self) -> Option<Vec<f64>> {
        let d = self.derivatives.as_ref()?;
        let dd = self.second_derivatives.as_ref()?;

        Some(
            d.iter()
                .zip(dd.iter())
                .map(|(d, dd)| {
                    let speed_sq = d.x * d.x + d.y * d.y;
                    if speed_sq <= 0.0 {
                        return 0.0;
                    }
                    (d.x * dd.y - d.y * dd.x) / speed_sq.powf(1.5)
                })
                .collect(),
        )
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Count the waypoints which are not within the closure tolerance of an
/// earlier waypoint.
fn count_distinct(waypoints: &[Vector3<f64>]) -> usize {
    waypoints
        .iter()
        .enumerate()
        .filter(|(i, w)| {
            !waypoints[..*i]
                .iter()
                .any(|prev| (*w - prev).norm() <= CLOSURE_TOLERANCE_M)
        })
        .count()
}

fn endpoints_coincide(waypoints: &[Vector3<f64>]) -> bool {
    match (waypoints.first(), waypoints.last()) {
        (Some(first), Some(last)) => (first - last).norm() <= CLOSURE_TOLERANCE_M,
        _ => false,
    }
}
