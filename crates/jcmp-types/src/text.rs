//! Text rendering of numbers.
//!
//! Identity keys must not depend on how a decoder happened to spell a
//! number: `1`, `1.0` and `1e0` all render as `1`. Non-integral values are
//! rendered with exactly six fractional digits.

/// Largest magnitude rendered through the integer path.
const INTEGRAL_LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Render a number the way identity keys expect it.
///
/// # Examples
///
/// ```
/// use jcmp_types::format_number;
///
/// assert_eq!(format_number(42.0), "42");
/// assert_eq!(format_number(-3.0), "-3");
/// assert_eq!(format_number(1.5), "1.500000");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= INTEGRAL_LIMIT {
        format!("{}", n as i64)
    } else {
        format!("{n:.6}")
    }
}
