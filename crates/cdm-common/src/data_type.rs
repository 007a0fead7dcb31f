//! Element types and origin file formats.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an integral type is interpreted as signed or unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Element type of a variable or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Byte,
    UByte,
    Char,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    String,
    /// Enumeration stored in one byte.
    Enum1,
    /// Enumeration stored in two bytes.
    Enum2,
    /// Enumeration stored in four bytes.
    Enum4,
    Opaque,
    /// Composite record type.
    Structure,
    /// Composite record type of unknown length.
    Sequence,
}

impl DataType {
    /// Byte, Short, Int, Long and their unsigned counterparts.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::UByte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Integral or floating point.
    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating_point()
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::UByte | Self::UShort | Self::UInt | Self::ULong)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum1 | Self::Enum2 | Self::Enum4)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String | Self::Char)
    }

    /// Structures and sequences need their own read path.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Structure | Self::Sequence)
    }

    /// Size of one element in bytes, 0 for types without a fixed size.
    pub fn size(&self) -> usize {
        match self {
            Self::Boolean | Self::Byte | Self::UByte | Self::Char | Self::Enum1 => 1,
            Self::Short | Self::UShort | Self::Enum2 => 2,
            Self::Int | Self::UInt | Self::Float | Self::Enum4 => 4,
            Self::Long | Self::ULong | Self::Double => 8,
            Self::String | Self::Opaque | Self::Structure | Self::Sequence => 0,
        }
    }

    pub fn signedness(&self) -> Signedness {
        if self.is_unsigned() {
            Signedness::Unsigned
        } else {
            Signedness::Signed
        }
    }

    /// The integral type of the same width with the requested signedness.
    ///
    /// Non-integral types are returned unchanged.
    pub fn with_signedness(&self, signedness: Signedness) -> Self {
        use Signedness::{Signed, Unsigned};
        match (self, signedness) {
            (Self::Byte | Self::UByte, Signed) => Self::Byte,
            (Self::Byte | Self::UByte, Unsigned) => Self::UByte,
            (Self::Short | Self::UShort, Signed) => Self::Short,
            (Self::Short | Self::UShort, Unsigned) => Self::UShort,
            (Self::Int | Self::UInt, Signed) => Self::Int,
            (Self::Int | Self::UInt, Unsigned) => Self::UInt,
            (Self::Long | Self::ULong, Signed) => Self::Long,
            (Self::Long | Self::ULong, Unsigned) => Self::ULong,
            (other, _) => *other,
        }
    }

    /// Storage type used for the codes of an enumeration.
    pub fn enum_storage_type(&self) -> Option<Self> {
        match self {
            Self::Enum1 => Some(Self::Byte),
            Self::Enum2 => Some(Self::Short),
            Self::Enum4 => Some(Self::Int),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::UByte => "ubyte",
            Self::Char => "char",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "String",
            Self::Enum1 => "enum1",
            Self::Enum2 => "enum2",
            Self::Enum4 => "enum4",
            Self::Opaque => "opaque",
            Self::Structure => "Structure",
            Self::Sequence => "Sequence",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File format a variable was read from.
///
/// Only the NetCDF formats change behavior here: they define per-type default fill values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataFormat {
    NetCdf3,
    NetCdf4,
    Hdf5,
    Grib2,
    Zarr,
    Other(String),
}

impl DataFormat {
    /// Parse a format description (case-insensitive).
    pub fn from_description(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "netcdf" | "netcdf3" | "netcdf-3" => Self::NetCdf3,
            "netcdf4" | "netcdf-4" => Self::NetCdf4,
            "hdf5" => Self::Hdf5,
            "grib2" | "grib-2" => Self::Grib2,
            "zarr" => Self::Zarr,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Classic or enhanced NetCDF.
    pub fn is_netcdf(&self) -> bool {
        matches!(self, Self::NetCdf3 | Self::NetCdf4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_predicates() {
        assert!(DataType::Short.is_integral());
        assert!(DataType::Short.is_numeric());
        assert!(!DataType::Char.is_numeric());
        assert!(DataType::Float.is_floating_point());
        assert!(!DataType::Enum1.is_integral());
        assert!(DataType::Enum2.is_enum());
        assert!(DataType::Structure.is_composite());
        assert!(DataType::UInt.is_unsigned());
    }

    #[test]
    fn test_with_signedness() {
        assert_eq!(DataType::Byte.with_signedness(Signedness::Unsigned), DataType::UByte);
        assert_eq!(DataType::ULong.with_signedness(Signedness::Signed), DataType::Long);
        assert_eq!(DataType::Float.with_signedness(Signedness::Unsigned), DataType::Float);
    }

    #[test]
    fn test_format_from_description() {
        assert_eq!(DataFormat::from_description("NetCDF"), DataFormat::NetCdf3);
        assert_eq!(DataFormat::from_description("netcdf-4"), DataFormat::NetCdf4);
        assert!(!DataFormat::from_description("GRIB2").is_netcdf());
        assert_eq!(
            DataFormat::from_description("fits"),
            DataFormat::Other("fits".to_string())
        );
    }
}
