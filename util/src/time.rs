//! General time utility functions

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Number of whole steps of length `step_s` needed to cover `duration_s`.
///
/// A partial step at the end counts as a whole step.
pub fn num_steps(duration_s: f64, step_s: f64) -> usize {
    if duration_s <= 0.0 || step_s <= 0.0 {
        return 0;
    }

    (duration_s / step_s).ceil() as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        let d = chrono::Duration::milliseconds(1500);
        assert_eq!(duration_to_seconds(d), Some(1.5));
    }

    #[test]
    fn test_num_steps() {
        assert_eq!(num_steps(1.0, 0.25), 4);
        assert_eq!(num_steps(1.0, 0.3), 4);
        assert_eq!(num_steps(0.0, 0.1), 0);
        assert_eq!(num_steps(1.0, 0.0), 0);
    }
}
