//! # Track
//!
//! A track is a constant width corridor built around a centerline path. The
//! left and right boundaries are obtained by offsetting each centerline sample
//! by half the width along the normal to the path in the XY plane, and index
//! correspond with the centerline samples.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

// Internal
use crate::error::ErrorKind;
use crate::path::{Path, PathError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A constant width track around a centerline.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    center: Path,
    left: Path,
    right: Path,

    /// Full width of the track in meters
    width_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Track width must be finite and positive, found {0}")]
    InvalidWidth(f64),

    #[error("The centerline has no derivatives, it must be a fitted path")]
    NoDerivatives,

    #[error("The centerline tangent at sample {0} has zero length in the XY plane")]
    DegenerateTangent(usize),

    #[error("Path error: {0}")]
    PathError(#[from] PathError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackError::InvalidWidth(_) => ErrorKind::Validation,
            TrackError::NoDerivatives | TrackError::DegenerateTangent(_) => {
                ErrorKind::Precondition
            }
            TrackError::PathError(e) => e.kind(),
        }
    }
}

impl Track {
    /// Build a track of the given full width around `center`.
    ///
    /// The boundaries are computed from every centerline sample except the
    /// last. A closed track then closes each boundary on its own first point,
    /// an open track repeats its last computed point, so both boundaries have
    /// as many samples as the centerline. The boundaries are not refitted and
    /// carry the centerline derivatives, closed the same way.
    pub fn constant_width(center: &Path, width_m: f64) -> Result<Self, TrackError> {
        if !width_m.is_finite() || width_m <= 0.0 {
            return Err(TrackError::InvalidWidth(width_m));
        }

        let derivs = center.derivatives().ok_or(TrackError::NoDerivatives)?;
        let points = center.points();

        if points.is_empty() {
            return Err(TrackError::PathError(PathError::EmptyPath));
        }

        let half_width_m = width_m / 2.0;
        let num_computed = points.len() - 1;

        let mut left = Vec::with_capacity(points.len());
        let mut right = Vec::with_capacity(points.len());
        let mut bound_derivs = Vec::with_capacity(points.len());

        for i in 0..num_computed {
            let tangent: Vector2<f64> = derivs[i].xy();
            let length = tangent.norm();

            if length <= 0.0 || !length.is_finite() {
                return Err(TrackError::DegenerateTangent(i));
            }

            // Left normal of the unit tangent
            let normal = Vector3::new(-tangent.y, tangent.x, 0.0) * (half_width_m / length);

            left.push(points[i] + normal);
            right.push(points[i] - normal);
            bound_derivs.push(derivs[i]);
        }

        if num_computed == 0 {
            // A single sample has no tangent to offset along
            return Err(TrackError::DegenerateTangent(0));
        }

        let closing = if center.is_closed() { 0 } else { num_computed - 1 };
        left.push(left[closing]);
        right.push(right[closing]);
        bound_derivs.push(bound_derivs[closing]);

        debug!(
            "Built {} m wide track around a {} sample centerline",
            width_m,
            points.len()
        );

        Ok(Self {
            center: center.clone(),
            left: Path::from_samples(left, bound_derivs.clone(), center.is_closed()),
            right: Path::from_samples(right, bound_derivs, center.is_closed()),
            width_m,
        })
    }

    /// Determine whether `point` lies between the boundaries of the track.
    ///
    /// The point is compared against the boundary pair at the closest
    /// centerline sample. It is inside when neither boundary point is further
    /// from the point than the other boundary point is from the opposite
    /// side of the triangle, that is when both angles of the triangle at the
    /// boundary points are not obtuse. Points exactly on a boundary are inside.
    pub fn inside_boundaries(&self, point: &Vector3<f64>) -> Result<bool, TrackError> {
        let (_, i) = self.center.closest_point(point)?;

        let b = self.left.points()[i];
        let c = self.right.points()[i];

        let side_a = (b - c).norm();
        let side_b = (c - point).norm();
        let side_c = (point - b).norm();

        let a_sq = side_a * side_a;
        let b_sq = side_b * side_b;
        let c_sq = side_c * side_c;

        Ok(a_sq + b_sq >= c_sq && a_sq + c_sq >= b_sq)
    }

    pub fn center(&self) -> &Path {
        &self.center
    }

    pub fn left(&self) -> &Path {
        &self.left
    }

    pub fn right(&self) -> &Path {
        &self.right
    }

    /// Full width of the track in meters
    pub fn width_m(&self) -> f64 {
        self.width_m
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::SplineParams;

    fn straight_center() -> Path {
        let wps = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(20.0, 0.0, 0.0),
        ];
        let params = SplineParams {
            num_samples: 21,
            ..Default::default()
        };
        Path::fit(&wps, &params).unwrap()
    }

    fn circle_center(radius: f64) -> Path {
        let mut wps: Vec<Vector3<f64>> = (0..12)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / 12.0;
                Vector3::new(radius * a.cos(), radius * a.sin(), 0.0)
            })
            .collect();
        wps.push(wps[0]);

        let params = SplineParams {
            num_samples: 300,
            is_closed: true,
            ..Default::default()
        };
        Path::fit(&wps, &params).unwrap()
    }

    #[test]
    fn test_straight_track_is_symmetric() {
        let center = straight_center();
        let track = Track::constant_width(&center, 4.0).unwrap();

        let n = center.get_num_points();
        assert_eq!(track.left().get_num_points(), n);
        assert_eq!(track.right().get_num_points(), n);

        for i in 0..n {
            let p = center.points()[i];
            let l = track.left().points()[i];
            let r = track.right().points()[i];

            // Open track repeats the last computed boundary point
            let j = if i == n - 1 { n - 2 } else { i };
            let pj = center.points()[j];

            assert!((l - Vector3::new(pj.x, 2.0, 0.0)).norm() < 1e-9);
            assert!((r - Vector3::new(pj.x, -2.0, 0.0)).norm() < 1e-9);

            if i < n - 1 {
                assert!(((l - p).norm() - 2.0).abs() < 1e-9);
                assert!(((r - p).norm() - 2.0).abs() < 1e-9);
            }
        }

        assert_eq!(track.left().points()[n - 1], track.left().points()[n - 2]);
    }

    #[test]
    fn test_closed_track_boundaries_close() {
        let radius = 20.0;
        let center = circle_center(radius);
        let track = Track::constant_width(&center, 4.0).unwrap();

        let left = track.left().points();
        let right = track.right().points();
        assert_eq!(left[0], left[left.len() - 1]);
        assert_eq!(right[0], right[right.len() - 1]);
        assert!(track.left().is_closed());

        // Anticlockwise circle, left is towards the centre
        assert!((left[0].xy().norm() - (radius - 2.0)).abs() < 0.05);
        assert!((right[0].xy().norm() - (radius + 2.0)).abs() < 0.05);
    }

    #[test]
    fn test_inside_boundaries() {
        let track = Track::constant_width(&straight_center(), 4.0).unwrap();

        assert!(track.inside_boundaries(&Vector3::new(5.0, 0.0, 0.0)).unwrap());
        assert!(track.inside_boundaries(&Vector3::new(5.0, 1.0, 0.0)).unwrap());
        assert!(track.inside_boundaries(&Vector3::new(5.0, -1.9, 0.0)).unwrap());

        // On the boundary counts as inside
        let on_left = track.left().points()[5];
        assert!(track.inside_boundaries(&on_left).unwrap());

        assert!(!track.inside_boundaries(&Vector3::new(5.0, 3.0, 0.0)).unwrap());
        assert!(!track.inside_boundaries(&Vector3::new(5.0, -10.0, 0.0)).unwrap());
    }

    #[test]
    fn test_inside_closed_track() {
        let track = Track::constant_width(&circle_center(20.0), 4.0).unwrap();

        assert!(track.inside_boundaries(&Vector3::new(20.0, 0.0, 0.0)).unwrap());
        assert!(track.inside_boundaries(&Vector3::new(0.0, -21.0, 0.0)).unwrap());
        assert!(!track.inside_boundaries(&Vector3::new(0.0, 25.0, 0.0)).unwrap());
        assert!(!track.inside_boundaries(&Vector3::new(-15.0, 0.0, 0.0)).unwrap());
    }

    #[test]
    fn test_validation() {
        let center = straight_center();

        for w in [0.0, -1.0, std::f64::NAN].iter() {
            let err = Track::constant_width(&center, *w).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let raw = Path::from_points(center.points().to_vec(), false);
        let err = Track::constant_width(&raw, 4.0).unwrap_err();
        assert!(matches!(err, TrackError::NoDerivatives));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_serialise_track() {
        let track = Track::constant_width(&straight_center(), 4.0).unwrap();
        let json: serde_json::Value = serde_json::to_value(&track).unwrap();

        assert_eq!(json["width_m"], 4.0);
        assert_eq!(json["left"]["points"].as_array().unwrap().len(), 21);
        assert!(json["right"]["second_derivatives"].is_null());
    }

    #[test]
    fn test_degenerate_tangent() {
        let points = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)];
        let derivs = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        ];
        let center = Path::from_samples(points, derivs, false);

        assert!(matches!(
            Track::constant_width(&center, 4.0),
            Err(TrackError::DegenerateTangent(1))
        ));
    }
}
