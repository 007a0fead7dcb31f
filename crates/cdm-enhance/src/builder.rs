//! Configuration for a new enhanced variable, consumed by [`Dataset::build`].

use cdm_common::{
    names, Attribute, AttributeContainer, CdmResult, DataFormat, DataType, EnumTypedef,
};

use crate::config::MissingPolicy;
use crate::dataset::Dataset;
use crate::enhance::{Enhance, EnhanceSet};
use crate::variable::VarHandle;

/// Everything needed to construct an [`EnhancedVariable`](crate::EnhancedVariable).
///
/// Unset fields fall back to the wrapped variable (type, shape) or to the
/// dataset's [`EnhanceConfig`](crate::EnhanceConfig) (enhancement mode, missing policy).
#[derive(Debug, Clone, Default)]
pub struct EnhancedVariableBuilder {
    pub(crate) name: String,
    pub(crate) original_name: Option<String>,
    pub(crate) original: Option<VarHandle>,
    pub(crate) data_type: Option<DataType>,
    pub(crate) shape: Option<Vec<usize>>,
    pub(crate) attributes: AttributeContainer,
    pub(crate) enhance_mode: Option<EnhanceSet>,
    pub(crate) fill_value_is_missing: Option<bool>,
    pub(crate) invalid_data_is_missing: Option<bool>,
    pub(crate) missing_data_is_missing: Option<bool>,
    pub(crate) file_type: Option<DataFormat>,
    pub(crate) variable_length: bool,
    pub(crate) enum_typedef: Option<EnumTypedef>,
    pub(crate) units: Option<String>,
    pub(crate) description: Option<String>,
}

impl EnhancedVariableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder wrapping `handle`, with its name and metadata copied.
    pub fn copy_from(dataset: &Dataset, handle: VarHandle) -> CdmResult<Self> {
        let var = dataset.get(handle)?;
        Ok(Self {
            name: var.name().to_string(),
            original: Some(handle),
            data_type: Some(var.data_type()),
            shape: Some(var.shape().to_vec()),
            attributes: var.attributes().clone(),
            file_type: var.file_type().cloned(),
            variable_length: var.is_variable_length(),
            enum_typedef: var.enum_typedef().cloned(),
            ..Self::default()
        })
    }

    pub fn set_original_variable(mut self, handle: VarHandle) -> Self {
        self.original = Some(handle);
        self
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    /// Type of the data before conversion.
    pub fn set_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn set_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Replace the requested enhancements.
    pub fn set_enhance_mode(mut self, mode: EnhanceSet) -> Self {
        self.enhance_mode = Some(mode);
        self
    }

    /// Request one more enhancement on top of the current (or empty) mode.
    pub fn add_enhance_mode(mut self, kind: Enhance) -> Self {
        self.enhance_mode.get_or_insert_with(EnhanceSet::empty).insert(kind);
        self
    }

    pub fn add_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.add(attribute);
        self
    }

    pub fn set_attributes(mut self, attributes: AttributeContainer) -> Self {
        self.attributes = attributes;
        self
    }

    /// Units, trimmed; also stored as the `units` attribute.
    pub fn set_units(mut self, units: impl AsRef<str>) -> Self {
        let units = units.as_ref().trim().to_string();
        self.attributes.add(Attribute::string(names::UNITS, units.clone()));
        self.units = Some(units);
        self
    }

    /// Description; also stored as the `long_name` attribute.
    pub fn set_desc(mut self, description: impl AsRef<str>) -> Self {
        let description = description.as_ref().trim().to_string();
        self.attributes
            .add(Attribute::string(names::LONG_NAME, description.clone()));
        self.description = Some(description);
        self
    }

    pub fn set_fill_value_is_missing(mut self, value: bool) -> Self {
        self.fill_value_is_missing = Some(value);
        self
    }

    pub fn set_invalid_data_is_missing(mut self, value: bool) -> Self {
        self.invalid_data_is_missing = Some(value);
        self
    }

    pub fn set_missing_data_is_missing(mut self, value: bool) -> Self {
        self.missing_data_is_missing = Some(value);
        self
    }

    pub fn set_missing_policy(self, policy: MissingPolicy) -> Self {
        self.set_fill_value_is_missing(policy.fill_value_is_missing)
            .set_invalid_data_is_missing(policy.invalid_data_is_missing)
            .set_missing_data_is_missing(policy.missing_data_is_missing)
    }

    pub fn set_file_type(mut self, file_type: DataFormat) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn set_variable_length(mut self, variable_length: bool) -> Self {
        self.variable_length = variable_length;
        self
    }

    pub fn set_enum_typedef(mut self, typedef: EnumTypedef) -> Self {
        self.enum_typedef = Some(typedef);
        self
    }

    /// Overrides applied on top of `defaults`.
    pub(crate) fn missing_policy(&self, defaults: MissingPolicy) -> MissingPolicy {
        MissingPolicy {
            fill_value_is_missing: self
                .fill_value_is_missing
                .unwrap_or(defaults.fill_value_is_missing),
            invalid_data_is_missing: self
                .invalid_data_is_missing
                .unwrap_or(defaults.invalid_data_is_missing),
            missing_data_is_missing: self
                .missing_data_is_missing
                .unwrap_or(defaults.missing_data_is_missing),
        }
    }
}
