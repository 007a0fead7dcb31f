//! Arena of variables, enhancement derivation and the read path.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use cdm_common::{
    Array, AttributeContainer, CdmError, CdmResult, DataFormat, DataType, Section,
};

use crate::builder::EnhancedVariableBuilder;
use crate::cache::{CacheStats, DataCache};
use crate::config::{EnhanceConfig, MissingPolicy};
use crate::enhance::{Enhance, EnhanceSet};
use crate::fill;
use crate::filter::{ConvertMissing, ScaleOffset, Standardizer, UnsignedConversion};
use crate::variable::{EnhancedVariable, Enhancements, LeafVariable, VarHandle, Variable};

/// What [`Dataset::derive`] needs to know about the variable being enhanced.
#[derive(Debug, Clone, Copy)]
pub struct DeriveInput<'a> {
    /// Type before this variable's own conversion.
    pub original_data_type: DataType,
    pub attributes: &'a AttributeContainer,
    pub original: Option<VarHandle>,
    pub file_type: Option<&'a DataFormat>,
    pub variable_length: bool,
    pub policy: MissingPolicy,
}

impl<'a> DeriveInput<'a> {
    fn of(var: &'a EnhancedVariable) -> Self {
        Self {
            original_data_type: var.original_data_type,
            attributes: &var.attributes,
            original: var.original,
            file_type: var.file_type.as_ref(),
            variable_length: var.variable_length,
            policy: var.policy,
        }
    }
}

/// Unsigned and scale/offset rules of one layer of a wrap chain.
type UnpackLayer = (Option<UnsignedConversion>, Option<ScaleOffset>);

/// Run a stored scalar of `value_type` through each layer, innermost first.
fn unpack_scalar(layers: &[UnpackLayer], value: f64, value_type: DataType) -> f64 {
    let (value, _) = layers
        .iter()
        .fold((value, value_type), |(v, t), (unsigned, scale)| {
            let (v, t) = match unsigned {
                Some(rule) => (rule.convert_scalar(v, t), rule.out_type()),
                None => (v, t),
            };
            match scale {
                Some(rule) => (rule.apply_scalar(v), rule.scaled_offset_type()),
                None => (v, t),
            }
        });
    value
}

/// Variables addressed by [`VarHandle`].
///
/// Reads take `&self` and may run on many threads. Anything that changes
/// rules, names or cache configuration takes `&mut self`.
#[derive(Debug, Default)]
pub struct Dataset {
    variables: Vec<Variable>,
    config: EnhanceConfig,
}

impl Dataset {
    pub fn new(config: EnhanceConfig) -> Self {
        Self {
            variables: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = VarHandle> {
        (0..self.variables.len()).map(VarHandle)
    }

    /// First variable named `name`.
    pub fn find(&self, name: &str) -> Option<VarHandle> {
        self.variables
            .iter()
            .position(|v| v.name() == name)
            .map(VarHandle)
    }

    pub fn get(&self, handle: VarHandle) -> CdmResult<&Variable> {
        self.variables
            .get(handle.0)
            .ok_or(CdmError::UnknownVariable(handle.0))
    }

    fn get_mut(&mut self, handle: VarHandle) -> CdmResult<&mut Variable> {
        self.variables
            .get_mut(handle.0)
            .ok_or(CdmError::UnknownVariable(handle.0))
    }

    /// The enhanced variable at `handle`; leaves are an invalid argument.
    pub fn enhanced(&self, handle: VarHandle) -> CdmResult<&EnhancedVariable> {
        self.get(handle)?.as_enhanced().ok_or_else(|| {
            CdmError::invalid_argument(format!("variable {handle} is not enhanced"))
        })
    }

    fn enhanced_mut(&mut self, handle: VarHandle) -> CdmResult<&mut EnhancedVariable> {
        match self.get_mut(handle)? {
            Variable::Enhanced(var) => Ok(var),
            Variable::Leaf(_) => Err(CdmError::invalid_argument(format!(
                "variable {handle} is not enhanced"
            ))),
        }
    }

    pub fn add_leaf(&mut self, leaf: LeafVariable) -> VarHandle {
        let handle = VarHandle(self.variables.len());
        debug!(variable = leaf.name(), %handle, "added leaf variable");
        self.variables.push(Variable::Leaf(leaf));
        handle
    }

    /// Construct an enhanced variable and add it to the arena.
    pub fn build(&mut self, builder: EnhancedVariableBuilder) -> CdmResult<VarHandle> {
        let wrapped = match builder.original {
            Some(handle) => {
                let var = self.get(handle)?;
                var.check_not_composite()?;
                Some(var)
            }
            None => None,
        };

        let data_type = builder
            .data_type
            .or_else(|| wrapped.map(Variable::data_type))
            .ok_or_else(|| {
                CdmError::invalid_argument(format!("variable '{}' has no data type", builder.name))
            })?;
        if data_type.is_composite() {
            return Err(CdmError::invalid_argument(format!(
                "variable '{}' of type {data_type} cannot be enhanced",
                builder.name
            )));
        }
        let shape = builder
            .shape
            .clone()
            .or_else(|| wrapped.map(|v| v.shape().to_vec()))
            .unwrap_or_default();

        let requested = builder.enhance_mode.unwrap_or(self.config.enhance_mode);
        let policy = builder.missing_policy(self.config.missing);
        let input = DeriveInput {
            original_data_type: data_type,
            attributes: &builder.attributes,
            original: builder.original,
            file_type: builder.file_type.as_ref(),
            variable_length: builder.variable_length,
            policy,
        };
        let enhancements = self.derive(&input, requested);

        let var = EnhancedVariable {
            name: builder.name,
            original_name: builder.original_name,
            original_data_type: data_type,
            shape,
            attributes: builder.attributes,
            file_type: builder.file_type,
            enum_typedef: builder.enum_typedef,
            variable_length: builder.variable_length,
            original: builder.original,
            policy,
            units: builder.units,
            description: builder.description,
            enhancements,
            cache: DataCache::default(),
        };

        let handle = VarHandle(self.variables.len());
        debug!(
            variable = %var.name,
            %handle,
            data_type = %var.data_type(),
            mode = %var.active_enhancements(),
            "built enhanced variable"
        );
        self.variables.push(Variable::Enhanced(var));
        Ok(handle)
    }

    /// Wrap `handle` in a new enhanced variable using the configured mode.
    pub fn wrap(&mut self, handle: VarHandle) -> CdmResult<VarHandle> {
        let builder = EnhancedVariableBuilder::copy_from(self, handle)?;
        self.build(builder)
    }

    /// Compute the rules for enhancing a variable with `requested`.
    ///
    /// Kinds already applied by the wrapped chain are dropped first, so each
    /// kind runs once, at the innermost layer that asked for it.
    pub fn derive(&self, input: &DeriveInput<'_>, requested: EnhanceSet) -> Enhancements {
        let inherited = input
            .original
            .map(|h| self.effective_set(h))
            .unwrap_or_default();
        let mode = requested.difference(inherited);
        if mode != requested {
            trace!(dropped = %requested.difference(mode), "already applied by wrapped variable");
        }

        let mut enh = Enhancements::none(input.original_data_type);
        enh.enhance_mode = mode;

        if mode.contains(Enhance::ConvertEnums) && input.original_data_type.is_enum() {
            enh.data_type = DataType::String;
            return enh;
        }

        let attributes = input.attributes;
        if !input.variable_length {
            if mode.contains(Enhance::ConvertUnsigned) {
                enh.unsigned = UnsignedConversion::from_attributes(enh.data_type, attributes);
                if let Some(rule) = enh.unsigned {
                    enh.data_type = rule.out_type();
                }
            }
            if mode.contains(Enhance::ApplyScaleOffset)
                && (enh.data_type.is_numeric() || enh.data_type == DataType::Char)
            {
                enh.scale_offset = ScaleOffset::for_stored(
                    input.original_data_type,
                    enh.data_type,
                    attributes,
                );
                if let Some(rule) = enh.scale_offset {
                    enh.data_type = rule.scaled_offset_type();
                }
            }
        }

        let mut layers = self.unpack_layers(input.original);
        layers.push((enh.unsigned, enh.scale_offset));
        let unpack = |value: f64, value_type: DataType| unpack_scalar(&layers, value, value_type);

        let raw_type = self.raw_type(input);
        enh.fill_value = fill::raw_fill_value(attributes, raw_type, input.file_type)
            .map(|(value, value_type)| unpack(value, value_type));

        if input.variable_length {
            return enh;
        }

        if mode.contains(Enhance::ConvertMissing) {
            enh.convert_missing = Some(ConvertMissing::from_attributes(
                attributes,
                raw_type,
                enh.fill_value,
                input.policy,
                unpack,
            ));
        }

        if mode.contains(Enhance::ApplyStandardizer)
            && Standardizer::is_requested(attributes)
            && enh.data_type.is_floating_point()
        {
            enh.standardizer = self.standardizer_for(input, &enh);
        }

        enh
    }

    /// Statistics over the wrapped data after this layer's own conversions.
    fn standardizer_for(
        &self,
        input: &DeriveInput<'_>,
        enh: &Enhancements,
    ) -> Option<Standardizer> {
        let Some(original) = input.original else {
            debug!("no wrapped data to standardize");
            return None;
        };
        let data = match self.read(original) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "standardizer disabled, wrapped read failed");
                return None;
            }
        };
        let data = match enh.unsigned {
            Some(rule) => rule.convert(data),
            None => data,
        };
        let data = match enh.scale_offset {
            Some(rule) => rule.apply(data),
            None => data,
        };
        let data = match &enh.convert_missing {
            Some(rule) => rule.convert_missing(data),
            None => data,
        };
        Standardizer::from_values(&data)
    }

    /// Unpack rules of the enhanced variables below `handle`, innermost first.
    fn unpack_layers(&self, mut handle: Option<VarHandle>) -> Vec<UnpackLayer> {
        let mut layers = Vec::new();
        while let Some(Variable::Enhanced(var)) = handle.and_then(|h| self.variables.get(h.0)) {
            layers.push((var.enhancements.unsigned, var.enhancements.scale_offset));
            handle = var.original;
        }
        layers.reverse();
        layers
    }

    /// Stored type at the bottom of the wrap chain.
    fn raw_type(&self, input: &DeriveInput<'_>) -> DataType {
        let mut raw = input.original_data_type;
        let mut handle = input.original;
        while let Some(var) = handle.and_then(|h| self.variables.get(h.0)) {
            match var {
                Variable::Leaf(leaf) => return leaf.data_type(),
                Variable::Enhanced(var) => {
                    raw = var.original_data_type;
                    handle = var.original;
                }
            }
        }
        raw
    }

    /// Union of the local sets along the wrap chain.
    fn effective_set(&self, handle: VarHandle) -> EnhanceSet {
        let mut set = EnhanceSet::empty();
        let mut next = Some(handle);
        while let Some(Variable::Enhanced(var)) = next.and_then(|h| self.variables.get(h.0)) {
            set = set.union(var.active_enhancements());
            next = var.original;
        }
        set
    }

    /// The variable `handle` wraps, if any.
    pub fn original(&self, handle: VarHandle) -> CdmResult<Option<VarHandle>> {
        Ok(self.get(handle)?.as_enhanced().and_then(EnhancedVariable::original))
    }

    /// Kinds `handle` applies itself.
    pub fn active_enhancements(&self, handle: VarHandle) -> CdmResult<EnhanceSet> {
        Ok(self
            .get(handle)?
            .as_enhanced()
            .map(EnhancedVariable::active_enhancements)
            .unwrap_or_default())
    }

    /// Kinds applied anywhere along the wrap chain of `handle`.
    pub fn effective_enhancements(&self, handle: VarHandle) -> CdmResult<EnhanceSet> {
        self.get(handle)?;
        Ok(self.effective_set(handle))
    }

    /// Re-derive every rule of `handle` for `requested`.
    pub fn enhance(&mut self, handle: VarHandle, requested: EnhanceSet) -> CdmResult<()> {
        let var = self.enhanced(handle)?;
        let enhancements = self.derive(&DeriveInput::of(var), requested);
        debug!(%handle, mode = %enhancements.enhance_mode, "re-enhanced variable");

        let var = self.enhanced_mut(handle)?;
        var.enhancements = enhancements;
        var.cache.clear();
        Ok(())
    }

    /// Request one more kind. Returns whether the local set changed.
    pub fn add_enhancement(&mut self, handle: VarHandle, kind: Enhance) -> CdmResult<bool> {
        let mut mode = self.active_enhancements(handle)?;
        if !mode.insert(kind) {
            return Ok(false);
        }
        self.enhance(handle, mode)?;
        Ok(self.active_enhancements(handle)?.contains(kind))
    }

    /// Drop one kind. Returns whether the local set changed.
    pub fn remove_enhancement(&mut self, handle: VarHandle, kind: Enhance) -> CdmResult<bool> {
        let mut mode = self.active_enhancements(handle)?;
        if !mode.remove(kind) {
            return Ok(false);
        }
        self.enhance(handle, mode)?;
        Ok(true)
    }

    /// Rename a variable; enhanced variables remember their first name.
    pub fn rename(&mut self, handle: VarHandle, name: impl Into<String>) -> CdmResult<()> {
        self.get_mut(handle)?.set_name(name.into());
        Ok(())
    }

    /// Enable or disable caching. Enabling also enables it down the wrap chain.
    pub fn set_caching(&mut self, handle: VarHandle, caching: bool) -> CdmResult<()> {
        let var = self.get_mut(handle)?;
        var.cache_mut().set_enabled(caching);
        let original = var.as_enhanced().and_then(EnhancedVariable::original);
        match original {
            Some(original) if caching => self.set_caching(original, true),
            _ => Ok(()),
        }
    }

    /// Install unconverted data for `handle` and enable its cache.
    pub fn set_cached_data(&mut self, handle: VarHandle, data: Array) -> CdmResult<()> {
        let var = self.get_mut(handle)?;
        if data.shape() != var.shape() {
            return Err(CdmError::invalid_argument(format!(
                "cached data shape {:?} does not match {:?}",
                data.shape(),
                var.shape()
            )));
        }
        let expected = var.raw_data_type();
        if data.data_type() != expected {
            return Err(CdmError::invalid_argument(format!(
                "cached data of type {} for variable '{}' of type {expected}",
                data.data_type(),
                var.name()
            )));
        }
        var.cache_mut().set(data);
        Ok(())
    }

    pub fn cache_stats(&self, handle: VarHandle) -> CdmResult<CacheStats> {
        Ok(self.get(handle)?.cache().stats())
    }

    /// Label of `code`, from the first enum typedef along the wrap chain.
    pub fn lookup_enum_string(&self, handle: VarHandle, code: i64) -> CdmResult<String> {
        let mut next = Some(handle);
        while let Some(h) = next {
            let var = self.get(h)?;
            if let Some(typedef) = var.enum_typedef() {
                return Ok(typedef.lookup_enum_string(code));
            }
            next = var.as_enhanced().and_then(EnhancedVariable::original);
        }
        Ok(format!("Unknown enum value={code}"))
    }

    /// Constant array standing in for absent data.
    pub fn missing_data_array(&self, handle: VarHandle, shape: Vec<usize>) -> CdmResult<Array> {
        Ok(match self.get(handle)? {
            Variable::Enhanced(var) => var.missing_data_array(shape),
            Variable::Leaf(leaf) => {
                let fill =
                    fill::raw_fill_value(leaf.attributes(), leaf.data_type(), leaf.file_type())
                        .map_or(0.0, |(value, _)| value);
                Array::constant(leaf.data_type(), shape, fill)
            }
        })
    }

    /// Units of `handle`, falling back to the wrapped chain.
    pub fn units(&self, handle: VarHandle) -> CdmResult<Option<String>> {
        self.chain_text(handle, EnhancedVariable::units, cdm_common::names::UNITS)
    }

    /// Description of `handle`, falling back to the wrapped chain.
    pub fn description(&self, handle: VarHandle) -> CdmResult<Option<String>> {
        self.chain_text(handle, EnhancedVariable::description, cdm_common::names::LONG_NAME)
    }

    fn chain_text(
        &self,
        handle: VarHandle,
        own: fn(&EnhancedVariable) -> Option<&str>,
        attribute: &str,
    ) -> CdmResult<Option<String>> {
        let mut next = Some(handle);
        while let Some(h) = next {
            let var = self.get(h)?;
            let text = match var {
                Variable::Enhanced(e) => own(e),
                Variable::Leaf(leaf) => leaf.attributes().find_string(attribute).map(str::trim),
            };
            if let Some(text) = text {
                return Ok(Some(text.to_string()));
            }
            next = var.as_enhanced().and_then(EnhancedVariable::original);
        }
        Ok(None)
    }

    /// Read and convert all of `handle`.
    pub fn read(&self, handle: VarHandle) -> CdmResult<Array> {
        match self.get(handle)? {
            Variable::Leaf(leaf) => leaf.read(),
            Variable::Enhanced(var) => self.read_enhanced(handle, var, None),
        }
    }

    /// Read and convert part of `handle`.
    pub fn read_section(&self, handle: VarHandle, section: &Section) -> CdmResult<Array> {
        let var = self.get(handle)?;
        section.check_in_range(var.shape())?;
        if section.covers(var.shape()) {
            return self.read(handle);
        }
        match var {
            Variable::Leaf(leaf) => leaf.read_section(section),
            Variable::Enhanced(var) => self.read_enhanced(handle, var, Some(section)),
        }
    }

    /// Read several sections of `handle` in parallel.
    pub fn read_sections(&self, handle: VarHandle, sections: &[Section]) -> CdmResult<Vec<Array>> {
        self.get(handle)?;
        sections
            .par_iter()
            .map(|section| self.read_section(handle, section))
            .collect()
    }

    fn read_enhanced(
        &self,
        handle: VarHandle,
        var: &EnhancedVariable,
        section: Option<&Section>,
    ) -> CdmResult<Array> {
        let lookup = |code: i64| {
            self.lookup_enum_string(handle, code)
                .unwrap_or_else(|_| format!("Unknown enum value={code}"))
        };

        let cached = var.cache.get();
        let raw = match (cached, var.original) {
            (Some(cached), _) => match section {
                Some(section) => cached.section(section)?,
                None => Array::clone(&cached),
            },
            (None, None) => {
                let shape = section.map_or_else(|| var.shape.clone(), Section::shape);
                trace!(variable = %var.name, ?shape, "nothing wrapped, synthesizing missing data");
                return Ok(var.convert_missing_array(var.missing_data_array(shape)));
            }
            (None, Some(original)) if var.cache.is_enabled() => {
                let cached = var.cache.store(self.read(original)?);
                match section {
                    Some(section) => cached.section(section)?,
                    None => Array::clone(&cached),
                }
            }
            (None, Some(original)) => match section {
                Some(section) => self.read_section(original, section)?,
                None => self.read(original)?,
            },
        };

        Ok(var.convert(raw, lookup))
    }
}
