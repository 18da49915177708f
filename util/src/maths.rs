//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of millimeters in a meter.
pub const MM_PER_M: f64 = 1000.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Convert a length in millimeters to meters.
pub fn mm_to_m(value_mm: f64) -> f64 {
    value_mm / MM_PER_M
}

/// Convert a length in meters to millimeters.
pub fn m_to_mm(value_m: f64) -> f64 {
    value_m * MM_PER_M
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-1.5f64, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25f64, &-1.0, &1.0), 0.25);
    }

    #[test]
    fn test_length_conversion() {
        assert_eq!(mm_to_m(300f64), 0.3);
        assert_eq!(m_to_mm(0.05f64), 50.0);
        assert_eq!(mm_to_m(1.0), 0.001);
        assert_eq!(m_to_mm(1.0), MM_PER_M);
        assert!((m_to_mm(mm_to_m(-123.0)) + 123.0).abs() < 1e-12);
    }
}
