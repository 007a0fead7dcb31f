//! Unsigned reinterpretation of signed integral storage.

use cdm_common::{names, Array, ArrayData, AttributeContainer, DataType, Signedness};
use tracing::debug;

/// Widens integral storage so the unsigned reading of its bits fits.
///
/// A byte `-1` becomes the short `255`: the bits are masked, not relabeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsignedConversion {
    in_type: DataType,
    out_type: DataType,
}

impl UnsignedConversion {
    /// Build the rule for a variable of `data_type`.
    ///
    /// The signedness directive is either the `_Unsigned = "true"` attribute on a
    /// signed integral type or the type itself being unsigned. Without a directive
    /// no rule is built.
    pub fn from_attributes(data_type: DataType, attributes: &AttributeContainer) -> Option<Self> {
        if !data_type.is_integral() {
            return None;
        }

        let unsigned = if data_type.is_unsigned() {
            true
        } else {
            match attributes.find(names::UNSIGNED) {
                Some(att) => match att.bool_value() {
                    Some(flag) => flag,
                    None => {
                        debug!(
                            value = ?att.value_list(),
                            "unreadable _Unsigned attribute, keeping signed values"
                        );
                        false
                    }
                },
                None => false,
            }
        };

        if !unsigned {
            return None;
        }

        let out_type = widened(data_type)?;
        debug!(%data_type, %out_type, "unsigned conversion enabled");
        Some(Self {
            in_type: data_type,
            out_type,
        })
    }

    pub fn in_type(&self) -> DataType {
        self.in_type
    }

    pub fn out_type(&self) -> DataType {
        self.out_type
    }

    pub fn signedness(&self) -> Signedness {
        Signedness::Unsigned
    }

    /// Convert an array read from storage.
    pub fn convert(&self, data: Array) -> Array {
        let converted = match data.data() {
            ArrayData::Byte(v) => ArrayData::Short(v.iter().map(|&x| x as u8 as i16).collect()),
            ArrayData::UByte(v) => ArrayData::Short(v.iter().map(|&x| x as i16).collect()),
            ArrayData::Short(v) => ArrayData::Int(v.iter().map(|&x| x as u16 as i32).collect()),
            ArrayData::UShort(v) => ArrayData::Int(v.iter().map(|&x| x as i32).collect()),
            ArrayData::Int(v) => ArrayData::Long(v.iter().map(|&x| x as u32 as i64).collect()),
            ArrayData::UInt(v) => ArrayData::Long(v.iter().map(|&x| x as i64).collect()),
            ArrayData::Long(v) => ArrayData::ULong(v.iter().map(|&x| x as u64).collect()),
            _ => return data,
        };
        let out_type = match &converted {
            ArrayData::Short(_) => DataType::Short,
            ArrayData::Int(_) => DataType::Int,
            ArrayData::Long(_) => DataType::Long,
            _ => DataType::ULong,
        };
        data.replace_data(out_type, converted)
    }

    /// Convert a scalar stored as `value_type`.
    ///
    /// Non-integral scalars (e.g. a double-typed fill attribute) are read with the
    /// width of the variable's own type.
    pub fn convert_scalar(&self, value: f64, value_type: DataType) -> f64 {
        let width_type = if value_type.is_integral() {
            value_type
        } else {
            self.in_type
        };
        if value < 0.0 && !width_type.is_unsigned() {
            value + 2f64.powi(8 * width_type.size() as i32)
        } else {
            value
        }
    }
}

/// Smallest type that holds every unsigned value of `data_type`.
fn widened(data_type: DataType) -> Option<DataType> {
    match data_type {
        DataType::Byte | DataType::UByte => Some(DataType::Short),
        DataType::Short | DataType::UShort => Some(DataType::Int),
        DataType::Int | DataType::UInt => Some(DataType::Long),
        DataType::Long | DataType::ULong => Some(DataType::ULong),
        _ => None,
    }
}
