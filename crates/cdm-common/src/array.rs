//! Typed n-dimensional arrays as returned by variable reads.
//!
//! Storage is flat and row-major. A *constant* array keeps a single stored
//! element that stands for every position of its shape; conversions act on the
//! stored element only, so a constant array stays constant.

use std::fmt;

use num_traits::AsPrimitive;

use crate::data_type::DataType;
use crate::error::{CdmError, CdmResult};
use crate::section::Section;

/// Flat element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Boolean(Vec<bool>),
    Byte(Vec<i8>),
    UByte(Vec<u8>),
    Char(Vec<u8>),
    Short(Vec<i16>),
    UShort(Vec<u16>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Long(Vec<i64>),
    ULong(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
    /// One nested array per element of a variable-length variable.
    VarLen(Vec<Array>),
}

/// Apply `$body` to the vector inside every numeric storage variant.
macro_rules! with_numeric {
    ($data:expr, $v:ident => $body:expr, $other:ident => $fallback:expr) => {
        match $data {
            ArrayData::Byte($v) => $body,
            ArrayData::UByte($v) => $body,
            ArrayData::Char($v) => $body,
            ArrayData::Short($v) => $body,
            ArrayData::UShort($v) => $body,
            ArrayData::Int($v) => $body,
            ArrayData::UInt($v) => $body,
            ArrayData::Long($v) => $body,
            ArrayData::ULong($v) => $body,
            ArrayData::Float($v) => $body,
            ArrayData::Double($v) => $body,
            $other => $fallback,
        }
    };
}

impl ArrayData {
    /// Number of stored elements.
    pub fn storage_len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::String(v) => v.len(),
            Self::VarLen(v) => v.len(),
            other => with_numeric!(other, v => v.len(), _x => 0),
        }
    }

    /// Element at `i` as `f64`, `None` for non-numeric storage.
    pub fn value_f64(&self, i: usize) -> Option<f64> {
        match self {
            Self::Boolean(v) => v.get(i).map(|&b| if b { 1.0 } else { 0.0 }),
            other => with_numeric!(
                other,
                v => v.get(i).map(|x| AsPrimitive::<f64>::as_(*x)),
                _x => None
            ),
        }
    }

    /// Build numeric storage of `data_type` from `f64` values.
    ///
    /// Returns `None` when `data_type` has no numeric storage.
    pub fn from_f64_values(data_type: DataType, values: impl Iterator<Item = f64>) -> Option<Self> {
        fn cast<T: Copy + 'static>(values: impl Iterator<Item = f64>) -> Vec<T>
        where
            f64: AsPrimitive<T>,
        {
            values.map(|x| x.as_()).collect()
        }

        let data = match data_type {
            DataType::Boolean => Self::Boolean(values.map(|x| x != 0.0).collect()),
            DataType::Byte | DataType::Enum1 => Self::Byte(cast(values)),
            DataType::UByte | DataType::Opaque => Self::UByte(cast(values)),
            DataType::Char => Self::Char(cast(values)),
            DataType::Short | DataType::Enum2 => Self::Short(cast(values)),
            DataType::UShort => Self::UShort(cast(values)),
            DataType::Int | DataType::Enum4 => Self::Int(cast(values)),
            DataType::UInt => Self::UInt(cast(values)),
            DataType::Long => Self::Long(cast(values)),
            DataType::ULong => Self::ULong(cast(values)),
            DataType::Float => Self::Float(cast(values)),
            DataType::Double => Self::Double(cast(values)),
            DataType::String | DataType::Structure | DataType::Sequence => return None,
        };
        Some(data)
    }

    /// Storage holding the stored elements at `offsets`.
    fn gather(&self, offsets: &[usize]) -> Self {
        fn pick<T: Clone>(v: &[T], offsets: &[usize]) -> Vec<T> {
            offsets.iter().map(|&o| v[o].clone()).collect()
        }

        match self {
            Self::Boolean(v) => Self::Boolean(pick(v, offsets)),
            Self::Byte(v) => Self::Byte(pick(v, offsets)),
            Self::UByte(v) => Self::UByte(pick(v, offsets)),
            Self::Char(v) => Self::Char(pick(v, offsets)),
            Self::Short(v) => Self::Short(pick(v, offsets)),
            Self::UShort(v) => Self::UShort(pick(v, offsets)),
            Self::Int(v) => Self::Int(pick(v, offsets)),
            Self::UInt(v) => Self::UInt(pick(v, offsets)),
            Self::Long(v) => Self::Long(pick(v, offsets)),
            Self::ULong(v) => Self::ULong(pick(v, offsets)),
            Self::Float(v) => Self::Float(pick(v, offsets)),
            Self::Double(v) => Self::Double(pick(v, offsets)),
            Self::String(v) => Self::String(pick(v, offsets)),
            Self::VarLen(v) => Self::VarLen(pick(v, offsets)),
        }
    }

    /// Whether this storage can hold elements of `data_type`.
    fn holds(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Self::VarLen(_), _) => true,
            (Self::Boolean(_), DataType::Boolean)
            | (Self::Byte(_), DataType::Byte | DataType::Enum1)
            | (Self::UByte(_), DataType::UByte | DataType::Opaque)
            | (Self::Char(_), DataType::Char)
            | (Self::Short(_), DataType::Short | DataType::Enum2)
            | (Self::UShort(_), DataType::UShort)
            | (Self::Int(_), DataType::Int | DataType::Enum4)
            | (Self::UInt(_), DataType::UInt)
            | (Self::Long(_), DataType::Long)
            | (Self::ULong(_), DataType::ULong)
            | (Self::Float(_), DataType::Float)
            | (Self::Double(_), DataType::Double)
            | (Self::String(_), DataType::String) => true,
            _ => false,
        }
    }

    /// The element type this storage holds natively.
    fn native_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Byte(_) => DataType::Byte,
            Self::UByte(_) => DataType::UByte,
            Self::Char(_) => DataType::Char,
            Self::Short(_) => DataType::Short,
            Self::UShort(_) => DataType::UShort,
            Self::Int(_) => DataType::Int,
            Self::UInt(_) => DataType::UInt,
            Self::Long(_) => DataType::Long,
            Self::ULong(_) => DataType::ULong,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
            Self::VarLen(rows) => rows.first().map(|r| r.data_type()).unwrap_or(DataType::Opaque),
        }
    }
}

/// Rust primitives that map onto an [`ArrayData`] variant.
pub trait Element: Copy + Send + Sync + AsPrimitive<f64> {
    const DATA_TYPE: DataType;

    fn into_data(values: Vec<Self>) -> ArrayData;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DATA_TYPE: DataType = DataType::$variant;

                fn into_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }
            }
        )*
    };
}

impl_element!(
    i8 => Byte,
    u8 => UByte,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    f32 => Float,
    f64 => Double,
);

/// An n-dimensional array of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data_type: DataType,
    shape: Vec<usize>,
    data: ArrayData,
    constant: bool,
}

impl Array {
    /// Create an array, checking storage length and type against `shape`.
    pub fn new(data_type: DataType, shape: Vec<usize>, data: ArrayData) -> CdmResult<Self> {
        if !data.holds(data_type) {
            return Err(CdmError::invalid_data(format!(
                "storage of {} cannot hold {data_type} elements",
                data.native_type()
            )));
        }
        let expected: usize = shape.iter().product();
        if data.storage_len() != expected {
            return Err(CdmError::invalid_data(format!(
                "shape {shape:?} needs {expected} elements, storage has {}",
                data.storage_len()
            )));
        }
        Ok(Self {
            data_type,
            shape,
            data,
            constant: false,
        })
    }

    /// One-dimensional array over `values`.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        let shape = vec![values.len()];
        Self {
            data_type: T::DATA_TYPE,
            shape,
            data: T::into_data(values),
            constant: false,
        }
    }

    /// Array of `shape` over row-major `values`.
    pub fn with_shape<T: Element>(shape: Vec<usize>, values: Vec<T>) -> CdmResult<Self> {
        Self::new(T::DATA_TYPE, shape, T::into_data(values))
    }

    /// One-dimensional string array.
    pub fn from_strings(values: Vec<String>) -> Self {
        Self {
            data_type: DataType::String,
            shape: vec![values.len()],
            data: ArrayData::String(values),
            constant: false,
        }
    }

    /// One-dimensional array of variable-length rows of `element_type`.
    pub fn var_len(element_type: DataType, rows: Vec<Array>) -> Self {
        Self {
            data_type: element_type,
            shape: vec![rows.len()],
            data: ArrayData::VarLen(rows),
            constant: false,
        }
    }

    /// Array of `shape` where every element equals `value`.
    ///
    /// Strings get the empty string and composite types an empty row.
    pub fn constant(data_type: DataType, shape: Vec<usize>, value: f64) -> Self {
        let data = ArrayData::from_f64_values(data_type, std::iter::once(value)).unwrap_or_else(|| {
            if data_type == DataType::String {
                ArrayData::String(vec![String::new()])
            } else {
                ArrayData::VarLen(vec![Array::var_len(data_type, Vec::new())])
            }
        });
        Self {
            data_type,
            shape,
            data,
            constant: true,
        }
    }

    /// Retag the elements, e.g. byte storage as a one-byte enum.
    pub fn with_data_type(mut self, data_type: DataType) -> CdmResult<Self> {
        if !self.data.holds(data_type) {
            return Err(CdmError::invalid_data(format!(
                "cannot view {} storage as {data_type}",
                self.data.native_type()
            )));
        }
        self.data_type = data_type;
        Ok(self)
    }

    /// Same shape and constancy with new storage.
    ///
    /// `data` must hold the same number of stored elements.
    pub fn replace_data(&self, data_type: DataType, data: ArrayData) -> Self {
        debug_assert_eq!(data.storage_len(), self.data.storage_len());
        Self {
            data_type,
            shape: self.shape.clone(),
            data,
            constant: self.constant,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Logical number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn storage_index(&self, i: usize) -> Option<usize> {
        if i >= self.len() {
            None
        } else if self.constant {
            Some(0)
        } else {
            Some(i)
        }
    }

    /// Element `i` (row-major) as `f64`.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        self.storage_index(i).and_then(|s| self.data.value_f64(s))
    }

    /// Element `i` as a string; numeric elements are formatted.
    pub fn get_string(&self, i: usize) -> Option<String> {
        let s = self.storage_index(i)?;
        match &self.data {
            ArrayData::String(v) => v.get(s).cloned(),
            ArrayData::Char(v) => v.get(s).map(|&c| (c as char).to_string()),
            ArrayData::VarLen(v) => v.get(s).map(|row| row.to_string()),
            data => data.value_f64(s).map(|x| x.to_string()),
        }
    }

    /// All elements as `f64`; empty for non-numeric arrays.
    pub fn iter_f64(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map_while(move |i| self.get_f64(i))
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.iter_f64().collect()
    }

    /// Apply `f` to every stored element, producing `out_type` storage.
    ///
    /// Returns `None` if either type has no numeric storage.
    pub fn map_f64(&self, out_type: DataType, f: impl Fn(f64) -> f64) -> Option<Self> {
        let len = self.data.storage_len();
        let values = (0..len).map(|i| f(self.data.value_f64(i).unwrap_or(f64::NAN)));
        if len > 0 && self.data.value_f64(0).is_none() {
            return None;
        }
        let data = ArrayData::from_f64_values(out_type, values)?;
        Some(self.replace_data(out_type, data))
    }

    /// Extract `section`, which must fit inside this array's shape.
    pub fn section(&self, section: &Section) -> CdmResult<Self> {
        section.check_in_range(&self.shape)?;
        if self.constant {
            return Ok(Self {
                data_type: self.data_type,
                shape: section.shape(),
                data: self.data.clone(),
                constant: true,
            });
        }
        let offsets = section.offsets(&self.shape);
        Ok(Self {
            data_type: self.data_type,
            shape: section.shape(),
            data: self.data.gather(&offsets),
            constant: false,
        })
    }

    /// Expand a constant array into one stored element per position.
    pub fn materialize(&self) -> Self {
        if !self.constant {
            return self.clone();
        }
        let offsets = vec![0; self.len()];
        Self {
            data_type: self.data_type,
            shape: self.shape.clone(),
            data: self.data.gather(&offsets),
            constant: false,
        }
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = (0..self.len()).filter_map(|i| self.get_string(i)).collect();
        write!(f, "{} {:?} [{}]", self.data_type, self.shape, values.join(", "))
    }
}
