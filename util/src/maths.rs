//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Clamp the magnitude of a value to at most `limit`, preserving its sign.
///
/// `limit` is treated as a magnitude, so its own sign is ignored.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    let limit = limit.abs();
    clamp(value, -limit, limit)
}

/// Three-valued sign: `1` for positive, `-1` for negative and `0` for zero (or NaN).
///
/// Unlike `f64::signum` this returns zero for zero.
pub fn sign<T>(value: T) -> T
where
    T: Float
{
    if value > T::zero() {
        T::one()
    }
    else if value < T::zero() {
        -T::one()
    }
    else {
        T::zero()
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range `[-pi, pi)`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(0.5f64, 0.1), 0.1);
        assert_eq!(clamp_abs(-0.5f64, 0.1), -0.1);
        assert_eq!(clamp_abs(0.05f64, 0.1), 0.05);
        assert_eq!(clamp_abs(-0.05f64, -0.1), -0.05);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.2f64), 1.0);
        assert_eq!(sign(-0.1f64), -1.0);
        assert_eq!(sign(0f64), 0.0);
        assert_eq!(sign(-0f64), 0.0);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(0.25f64) - 0.25).abs() < 1e-12);
    }
}
