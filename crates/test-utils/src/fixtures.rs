//! Common attribute fixtures for enhancement tests.
//!
//! Each fixture reproduces the packing metadata of a kind of product seen in
//! the wild.

use cdm_common::{names, Attribute, AttributeContainer, DataType, EnumTypedef};

/// GOES-R ABI Cloud and Moisture Imagery (CMI), IR band.
///
/// Stored as signed shorts flagged `_Unsigned`, 12-bit valid range, and a
/// fill value that only makes sense unsigned.
pub mod goes_cmi {
    use super::*;

    pub const SCALE_FACTOR: f32 = 0.047_203_224;
    pub const ADD_OFFSET: f32 = 16.0;
    /// Stored bits of the fill value (65535 unsigned).
    pub const FILL_VALUE: i16 = -1;
    pub const VALID_RANGE: [i16; 2] = [0, 4095];

    pub fn attributes() -> AttributeContainer {
        AttributeContainer::new()
            .with(Attribute::string(names::UNSIGNED, "true"))
            .with(Attribute::scalar(names::SCALE_FACTOR, SCALE_FACTOR))
            .with(Attribute::scalar(names::ADD_OFFSET, ADD_OFFSET))
            .with(Attribute::scalar(names::FILL_VALUE, FILL_VALUE))
            .with(Attribute::values(names::VALID_RANGE, &VALID_RANGE))
            .with(Attribute::string(names::UNITS, "K"))
            .with(Attribute::string(
                names::LONG_NAME,
                "ABI L2+ Cloud and Moisture Imagery brightness temperature",
            ))
    }
}

/// 2 m temperature packed into shorts, as many reanalysis archives do.
pub mod packed_temperature {
    use super::*;

    pub const SCALE_FACTOR: f64 = 0.01;
    pub const ADD_OFFSET: f64 = 273.15;
    pub const MISSING_VALUE: i16 = -32767;

    pub fn attributes() -> AttributeContainer {
        AttributeContainer::new()
            .with(Attribute::scalar(names::SCALE_FACTOR, SCALE_FACTOR))
            .with(Attribute::scalar(names::ADD_OFFSET, ADD_OFFSET))
            .with(Attribute::scalar(names::MISSING_VALUE, MISSING_VALUE))
            .with(Attribute::string(names::UNITS, " K "))
    }
}

/// Floating-point field with a sentinel list and a physical valid range.
pub mod sentinel_float {
    use super::*;

    pub const MISSING_VALUES: [f32; 2] = [-999.0, -888.0];
    pub const VALID_MIN: f32 = -90.0;
    pub const VALID_MAX: f32 = 60.0;

    pub fn attributes() -> AttributeContainer {
        AttributeContainer::new()
            .with(Attribute::values(names::MISSING_VALUE, &MISSING_VALUES))
            .with(Attribute::scalar(names::VALID_MIN, VALID_MIN))
            .with(Attribute::scalar(names::VALID_MAX, VALID_MAX))
            .with(Attribute::string(names::UNITS, "degC"))
    }
}

/// One-byte cloud mask enumeration.
pub fn cloud_mask_typedef() -> EnumTypedef {
    EnumTypedef::new("cloud_mask_t", DataType::Enum1)
        .with_member(0, "clear")
        .with_member(1, "probably_clear")
        .with_member(2, "probably_cloudy")
        .with_member(3, "cloudy")
}
