//! Leaf and enhanced variables.
//!
//! Variables live in a [`Dataset`](crate::Dataset) arena and refer to each
//! other through [`VarHandle`]s. A leaf variable reads stored data from its
//! [`VariableSource`]; an enhanced variable delegates to the variable it wraps
//! and converts what comes back.

use std::fmt;
use std::sync::Arc;

use cdm_common::{
    names, Array, AttributeContainer, CdmError, CdmResult, DataFormat, DataType, EnumTypedef,
    Section, Signedness,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::DataCache;
use crate::config::MissingPolicy;
use crate::enhance::{Enhance, EnhanceSet};
use crate::filter::{convert_enums, ConvertMissing, ScaleOffset, Standardizer, UnsignedConversion};
use crate::source::{MemorySource, VariableSource};

/// Index of a variable in its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarHandle(pub(crate) usize);

impl VarHandle {
    /// Handle for the `index`-th variable added to a dataset.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A variable whose data comes straight from an I/O source.
pub struct LeafVariable {
    name: String,
    data_type: DataType,
    shape: Vec<usize>,
    attributes: AttributeContainer,
    file_type: Option<DataFormat>,
    enum_typedef: Option<EnumTypedef>,
    variable_length: bool,
    source: Arc<dyn VariableSource>,
    pub(crate) cache: DataCache,
}

impl LeafVariable {
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        shape: Vec<usize>,
        source: Arc<dyn VariableSource>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            shape,
            attributes: AttributeContainer::new(),
            file_type: None,
            enum_typedef: None,
            variable_length: false,
            source,
            cache: DataCache::default(),
        }
    }

    /// Leaf over an in-memory array, typed and shaped after it.
    pub fn in_memory(name: impl Into<String>, data: Array) -> Self {
        let data_type = data.data_type();
        let shape = data.shape().to_vec();
        Self::new(name, data_type, shape, Arc::new(MemorySource::new(data)))
    }

    pub fn with_attributes(mut self, attributes: AttributeContainer) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, attribute: cdm_common::Attribute) -> Self {
        self.attributes.add(attribute);
        self
    }

    pub fn with_file_type(mut self, file_type: DataFormat) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn with_enum_typedef(mut self, typedef: EnumTypedef) -> Self {
        self.enum_typedef = Some(typedef);
        self
    }

    pub fn with_variable_length(mut self, variable_length: bool) -> Self {
        self.variable_length = variable_length;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn file_type(&self) -> Option<&DataFormat> {
        self.file_type.as_ref()
    }

    pub fn enum_typedef(&self) -> Option<&EnumTypedef> {
        self.enum_typedef.as_ref()
    }

    pub fn is_variable_length(&self) -> bool {
        self.variable_length
    }

    pub(crate) fn read(&self) -> CdmResult<Array> {
        if let Some(cached) = self.cache.get() {
            return Ok(Array::clone(&cached));
        }
        let data = self.source.read(self)?;
        if self.cache.is_enabled() {
            trace!(variable = %self.name, "caching leaf data");
            return Ok(Array::clone(&self.cache.store(data)));
        }
        Ok(data)
    }

    /// `section` must already be checked and not cover the whole shape.
    pub(crate) fn read_section(&self, section: &Section) -> CdmResult<Array> {
        if self.cache.is_enabled() {
            return self.read()?.section(section);
        }
        self.source.read_section(self, section)
    }
}

impl fmt::Debug for LeafVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafVariable")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("shape", &self.shape)
            .field("attributes", &self.attributes)
            .field("file_type", &self.file_type)
            .field("variable_length", &self.variable_length)
            .finish_non_exhaustive()
    }
}

/// Rules and derived type produced for one enhancement set.
///
/// Built in one piece by [`Dataset::derive`](crate::Dataset) and replaced as a
/// whole when the variable is re-enhanced.
#[derive(Debug, Clone, PartialEq)]
pub struct Enhancements {
    /// Declared type after conversion.
    pub data_type: DataType,
    /// Kinds this layer applies itself.
    pub enhance_mode: EnhanceSet,
    pub unsigned: Option<UnsignedConversion>,
    pub scale_offset: Option<ScaleOffset>,
    pub convert_missing: Option<ConvertMissing>,
    pub standardizer: Option<Standardizer>,
    /// Resolved fill value in converted units.
    pub fill_value: Option<f64>,
}

impl Enhancements {
    /// No conversion at all.
    pub fn none(data_type: DataType) -> Self {
        Self {
            data_type,
            enhance_mode: EnhanceSet::empty(),
            unsigned: None,
            scale_offset: None,
            convert_missing: None,
            standardizer: None,
            fill_value: None,
        }
    }
}

/// A variable presenting converted values of the variable it wraps.
#[derive(Debug)]
pub struct EnhancedVariable {
    pub(crate) name: String,
    pub(crate) original_name: Option<String>,
    pub(crate) original_data_type: DataType,
    pub(crate) shape: Vec<usize>,
    pub(crate) attributes: AttributeContainer,
    pub(crate) file_type: Option<DataFormat>,
    pub(crate) enum_typedef: Option<EnumTypedef>,
    pub(crate) variable_length: bool,
    pub(crate) original: Option<VarHandle>,
    pub(crate) policy: MissingPolicy,
    pub(crate) units: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) enhancements: Enhancements,
    pub(crate) cache: DataCache,
}

impl EnhancedVariable {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name before the first [`Dataset::rename`](crate::Dataset::rename), if any.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Declared type, after conversion.
    pub fn data_type(&self) -> DataType {
        self.enhancements.data_type
    }

    /// Type of the data before this variable converts it.
    pub fn original_data_type(&self) -> DataType {
        self.original_data_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn attributes(&self) -> &AttributeContainer {
        &self.attributes
    }

    pub fn file_type(&self) -> Option<&DataFormat> {
        self.file_type.as_ref()
    }

    pub fn enum_typedef(&self) -> Option<&EnumTypedef> {
        self.enum_typedef.as_ref()
    }

    pub fn is_variable_length(&self) -> bool {
        self.variable_length
    }

    /// The wrapped variable.
    pub fn original(&self) -> Option<VarHandle> {
        self.original
    }

    pub fn missing_policy(&self) -> MissingPolicy {
        self.policy
    }

    pub fn enhancements(&self) -> &Enhancements {
        &self.enhancements
    }

    /// Kinds applied by this variable itself.
    pub fn active_enhancements(&self) -> EnhanceSet {
        self.enhancements.enhance_mode
    }

    /// Units override or own `units` attribute, trimmed.
    pub fn units(&self) -> Option<&str> {
        self.units
            .as_deref()
            .or_else(|| self.attributes.find_string(names::UNITS))
            .map(str::trim)
    }

    /// Description override or own `long_name` attribute, trimmed.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.attributes.find_string(names::LONG_NAME))
            .map(str::trim)
    }

    pub fn has_fill_value(&self) -> bool {
        self.enhancements.fill_value.is_some()
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.enhancements.fill_value
    }

    pub fn has_scale_offset(&self) -> bool {
        self.enhancements.scale_offset.is_some()
    }

    /// Scale factor, 1 without a scale/offset rule.
    pub fn scale_factor(&self) -> f64 {
        self.enhancements
            .scale_offset
            .map_or(1.0, |rule| rule.scale_factor())
    }

    /// Offset, 0 without a scale/offset rule.
    pub fn offset(&self) -> f64 {
        self.enhancements.scale_offset.map_or(0.0, |rule| rule.offset())
    }

    pub fn apply_scale_offset(&self, value: f64) -> f64 {
        self.enhancements
            .scale_offset
            .map_or(value, |rule| rule.apply_scalar(value))
    }

    pub fn scaled_offset_type(&self) -> DataType {
        self.enhancements
            .scale_offset
            .map_or(self.unsigned_conversion_type(), |rule| rule.scaled_offset_type())
    }

    /// Reinterpret a stored scalar as unsigned if this variable does.
    pub fn convert_unsigned(&self, value: f64) -> f64 {
        self.enhancements
            .unsigned
            .map_or(value, |rule| rule.convert_scalar(value, self.original_data_type))
    }

    pub fn unsigned_conversion_type(&self) -> DataType {
        self.enhancements
            .unsigned
            .map_or(self.original_data_type, |rule| rule.out_type())
    }

    pub fn signedness(&self) -> Signedness {
        match self.enhancements.unsigned {
            Some(rule) => rule.signedness(),
            None => self.original_data_type.signedness(),
        }
    }

    fn missing_rule(&self) -> Option<&ConvertMissing> {
        self.enhancements.convert_missing.as_ref()
    }

    pub fn has_missing(&self) -> bool {
        self.missing_rule().is_some_and(ConvertMissing::has_missing)
    }

    pub fn has_missing_value(&self) -> bool {
        self.missing_rule().is_some_and(ConvertMissing::has_missing_value)
    }

    pub fn missing_values(&self) -> &[f64] {
        self.missing_rule()
            .map(ConvertMissing::missing_values)
            .unwrap_or_default()
    }

    pub fn has_valid_data(&self) -> bool {
        self.missing_rule().is_some_and(ConvertMissing::has_valid_data)
    }

    pub fn valid_min(&self) -> f64 {
        self.missing_rule().map_or(-f64::MAX, ConvertMissing::valid_min)
    }

    pub fn valid_max(&self) -> f64 {
        self.missing_rule().map_or(f64::MAX, ConvertMissing::valid_max)
    }

    pub fn is_missing_value(&self, value: f64) -> bool {
        self.missing_rule().is_some_and(|rule| rule.is_missing_value(value))
    }

    pub fn is_fill_value(&self, value: f64) -> bool {
        self.missing_rule().is_some_and(|rule| rule.is_fill_value(value))
    }

    pub fn is_invalid_data(&self, value: f64) -> bool {
        self.missing_rule().is_some_and(|rule| rule.is_invalid_data(value))
    }

    /// NaN, or missing under this variable's missing-value rule.
    pub fn is_missing(&self, value: f64) -> bool {
        value.is_nan() || self.missing_rule().is_some_and(|rule| rule.is_missing(value))
    }

    pub fn convert_missing(&self, value: f64) -> f64 {
        self.missing_rule()
            .map_or(value, |rule| rule.convert_missing_scalar(value))
    }

    /// Whether reads are projected onto enum labels.
    pub fn converts_enums(&self) -> bool {
        self.enhancements.enhance_mode.contains(Enhance::ConvertEnums)
            && (self.original_data_type.is_enum() || self.enhancements.data_type.is_enum())
    }

    /// Array standing in for data when nothing is wrapped.
    ///
    /// Every element is the fill value, or zero without one; strings are empty.
    pub fn missing_data_array(&self, shape: Vec<usize>) -> Array {
        Array::constant(
            self.enhancements.data_type,
            shape,
            self.enhancements.fill_value.unwrap_or(0.0),
        )
    }

    /// Apply the conversion chain to data read from the wrapped variable.
    ///
    /// `lookup` resolves enum codes to labels.
    pub fn convert(&self, data: Array, lookup: impl Fn(i64) -> String) -> Array {
        if self.converts_enums() {
            return convert_enums(data, lookup);
        }
        if self.variable_length {
            return data;
        }
        let data = self.unpack(data);
        self.mask(data)
    }

    /// Conversion of a synthesized missing-data array, which is already in
    /// converted units.
    pub(crate) fn convert_missing_array(&self, data: Array) -> Array {
        if self.converts_enums() || self.variable_length {
            return data;
        }
        self.mask(data)
    }

    /// Unsigned reinterpretation then scale/offset.
    pub(crate) fn unpack(&self, data: Array) -> Array {
        let data = match &self.enhancements.unsigned {
            Some(rule) => rule.convert(data),
            None => data,
        };
        match &self.enhancements.scale_offset {
            Some(rule) => rule.apply(data),
            None => data,
        }
    }

    /// Missing-value masking for floating types, then standardization.
    pub(crate) fn mask(&self, data: Array) -> Array {
        let data = match self.missing_rule() {
            Some(rule) if self.enhancements.data_type.is_floating_point() => {
                rule.convert_missing(data)
            }
            _ => data,
        };
        match &self.enhancements.standardizer {
            Some(rule) => rule.convert(data),
            None => data,
        }
    }
}

/// A variable in a dataset arena.
#[derive(Debug)]
pub enum Variable {
    Leaf(LeafVariable),
    Enhanced(EnhancedVariable),
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(v) => v.name(),
            Self::Enhanced(v) => v.name(),
        }
    }

    /// Declared type; converted for enhanced variables.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Leaf(v) => v.data_type(),
            Self::Enhanced(v) => v.data_type(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Leaf(v) => v.shape(),
            Self::Enhanced(v) => v.shape(),
        }
    }

    pub fn attributes(&self) -> &AttributeContainer {
        match self {
            Self::Leaf(v) => v.attributes(),
            Self::Enhanced(v) => v.attributes(),
        }
    }

    pub fn file_type(&self) -> Option<&DataFormat> {
        match self {
            Self::Leaf(v) => v.file_type(),
            Self::Enhanced(v) => v.file_type(),
        }
    }

    pub fn enum_typedef(&self) -> Option<&EnumTypedef> {
        match self {
            Self::Leaf(v) => v.enum_typedef(),
            Self::Enhanced(v) => v.enum_typedef(),
        }
    }

    pub fn is_variable_length(&self) -> bool {
        match self {
            Self::Leaf(v) => v.is_variable_length(),
            Self::Enhanced(v) => v.is_variable_length(),
        }
    }

    pub fn as_enhanced(&self) -> Option<&EnhancedVariable> {
        match self {
            Self::Enhanced(v) => Some(v),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafVariable> {
        match self {
            Self::Leaf(v) => Some(v),
            Self::Enhanced(_) => None,
        }
    }

    pub(crate) fn cache(&self) -> &DataCache {
        match self {
            Self::Leaf(v) => &v.cache,
            Self::Enhanced(v) => &v.cache,
        }
    }

    pub(crate) fn cache_mut(&mut self) -> &mut DataCache {
        match self {
            Self::Leaf(v) => &mut v.cache,
            Self::Enhanced(v) => &mut v.cache,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Self::Leaf(v) => v.name = name,
            Self::Enhanced(v) => {
                let previous = std::mem::replace(&mut v.name, name);
                v.original_name.get_or_insert(previous);
            }
        }
    }

    /// Type cached data must have: what this variable reads before converting.
    pub(crate) fn raw_data_type(&self) -> DataType {
        match self {
            Self::Leaf(v) => v.data_type(),
            Self::Enhanced(v) => v.original_data_type(),
        }
    }

    /// Fail unless this variable can take part in enhancement.
    pub(crate) fn check_not_composite(&self) -> CdmResult<()> {
        if self.data_type().is_composite() {
            return Err(CdmError::invalid_argument(format!(
                "variable '{}' of type {} cannot be enhanced",
                self.name(),
                self.data_type()
            )));
        }
        Ok(())
    }
}
