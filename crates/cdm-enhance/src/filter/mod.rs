//! Value conversion rules.
//!
//! Each rule is built once from a variable's attributes and never mutated;
//! re-enhancing a variable builds new rules.

mod enums;
mod missing;
mod scale_offset;
mod standardizer;
mod unsigned;

pub use enums::convert_enums;
pub use missing::ConvertMissing;
pub use scale_offset::ScaleOffset;
pub use standardizer::Standardizer;
pub use unsigned::UnsignedConversion;

/// Relative tolerance for matching fill and missing values.
pub const REL_TOLERANCE: f64 = 1.0e-5;

/// `a` and `b` are equal within [`REL_TOLERANCE`] of the larger magnitude.
pub fn nearly_equals(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    let magnitude = a.abs().max(b.abs());
    if magnitude <= f64::MIN_POSITIVE {
        return diff <= REL_TOLERANCE;
    }
    diff / magnitude <= REL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearly_equals() {
        assert!(nearly_equals(-999.0, -999.0));
        assert!(nearly_equals(9.969_209_968_386_869e36, 9.969_21e36));
        assert!(nearly_equals(-999.0, -999.000_1));
        assert!(!nearly_equals(-999.0, -998.0));
        assert!(nearly_equals(0.0, 0.0));
        assert!(!nearly_equals(f64::NAN, f64::NAN));
    }
}
