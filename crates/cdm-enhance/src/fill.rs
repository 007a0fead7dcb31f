//! Fill-value resolution.

use cdm_common::{names, AttributeContainer, DataFormat, DataType};
use tracing::trace;

/// NetCDF default fill for `data_type`, `None` for types without one.
pub fn default_fill_value(data_type: DataType) -> Option<f64> {
    let fill = match data_type {
        DataType::Byte | DataType::Enum1 => -127.0,
        DataType::UByte => 255.0,
        DataType::Char => 0.0,
        DataType::Short | DataType::Enum2 => -32767.0,
        DataType::UShort => 65535.0,
        DataType::Int | DataType::Enum4 => -2147483647.0,
        DataType::UInt => 4294967295.0,
        DataType::Long => -9223372036854775806.0,
        DataType::ULong => 18446744073709551614.0,
        DataType::Float | DataType::Double => 9.969_209_968_386_869e36,
        _ => return None,
    };
    Some(fill)
}

/// Packed fill value of a variable, before any conversion.
///
/// A numeric `_FillValue` attribute wins, returned with its declared type.
/// Otherwise NetCDF files get the format default for the raw type.
pub fn raw_fill_value(
    attributes: &AttributeContainer,
    raw_type: DataType,
    file_type: Option<&DataFormat>,
) -> Option<(f64, DataType)> {
    if let Some(att) = attributes.find(names::FILL_VALUE) {
        if let Some(value) = att.numeric_value() {
            return Some((value, att.data_type()));
        }
        trace!("ignoring non-numeric _FillValue");
    }

    if file_type.is_some_and(DataFormat::is_netcdf) && raw_type.is_numeric() {
        return default_fill_value(raw_type).map(|fill| (fill, raw_type));
    }
    None
}
