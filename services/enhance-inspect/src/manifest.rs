//! JSON manifest describing in-memory variables and how to enhance them.
//!
//! ```json
//! {
//!   "config": { "enhance_mode": ["ConvertUnsigned", "ApplyScaleOffset"] },
//!   "variables": [
//!     { "kind": "leaf", "name": "raw", "data_type": "Short", "shape": [2],
//!       "values": [-1, 100],
//!       "attributes": [{ "name": "scale_factor", "data_type": "Float", "values": [0.5] }] },
//!     { "kind": "enhanced", "name": "t", "wrap": "raw", "units": "K" }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use cdm_common::{Array, ArrayData, Attribute, DataFormat, DataType, EnumTypedef};
use cdm_enhance::{Dataset, EnhanceConfig, EnhanceSet, EnhancedVariableBuilder, LeafVariable};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Overrides the environment configuration when present.
    #[serde(default)]
    pub config: Option<EnhanceConfig>,
    pub variables: Vec<VariableEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariableEntry {
    Leaf(LeafEntry),
    Enhanced(EnhancedEntry),
}

#[derive(Debug, Deserialize)]
pub struct LeafEntry {
    pub name: String,
    pub data_type: DataType,
    /// Defaults to one dimension over `values`.
    #[serde(default)]
    pub shape: Option<Vec<usize>>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub enum_typedef: Option<EnumTypedef>,
    #[serde(default)]
    pub variable_length: bool,
}

#[derive(Debug, Deserialize)]
pub struct EnhancedEntry {
    pub name: String,
    /// Name of an earlier variable to wrap.
    #[serde(default)]
    pub wrap: Option<String>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub shape: Option<Vec<usize>>,
    #[serde(default)]
    pub enhance: Option<EnhanceSet>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fill_value_is_missing: Option<bool>,
    #[serde(default)]
    pub invalid_data_is_missing: Option<bool>,
    #[serde(default)]
    pub missing_data_is_missing: Option<bool>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Build the dataset, with `fallback` used when the manifest has no config.
    pub fn into_dataset(self, fallback: EnhanceConfig) -> Result<Dataset> {
        let config = self.config.unwrap_or(fallback);
        config.validate().map_err(|e| anyhow!(e))?;
        let mut dataset = Dataset::new(config);

        for entry in self.variables {
            match entry {
                VariableEntry::Leaf(leaf) => {
                    let name = leaf.name.clone();
                    let leaf = leaf
                        .into_leaf()
                        .with_context(|| format!("leaf variable '{name}'"))?;
                    dataset.add_leaf(leaf);
                }
                VariableEntry::Enhanced(enhanced) => {
                    let name = enhanced.name.clone();
                    let builder = enhanced
                        .into_builder(&dataset)
                        .with_context(|| format!("enhanced variable '{name}'"))?;
                    let handle = dataset
                        .build(builder)
                        .with_context(|| format!("enhanced variable '{name}'"))?;
                    debug!(variable = %name, %handle, "built from manifest");
                }
            }
        }

        info!(variables = dataset.len(), "loaded manifest");
        Ok(dataset)
    }
}

impl LeafEntry {
    fn into_leaf(self) -> Result<LeafVariable> {
        let shape = self.shape.unwrap_or_else(|| vec![self.values.len()]);
        let data = ArrayData::from_f64_values(self.data_type, self.values.into_iter())
            .ok_or_else(|| anyhow!("type {} has no numeric storage", self.data_type))?;
        let array = Array::new(self.data_type, shape, data)?;

        let mut leaf = LeafVariable::in_memory(self.name, array)
            .with_attributes(self.attributes.into_iter().collect())
            .with_variable_length(self.variable_length);
        if let Some(file_type) = self.file_type {
            leaf = leaf.with_file_type(DataFormat::from_description(&file_type));
        }
        if let Some(typedef) = self.enum_typedef {
            leaf = leaf.with_enum_typedef(typedef);
        }
        Ok(leaf)
    }
}

impl EnhancedEntry {
    fn into_builder(self, dataset: &Dataset) -> Result<EnhancedVariableBuilder> {
        let mut builder = match &self.wrap {
            Some(wrapped) => {
                let handle = dataset
                    .find(wrapped)
                    .ok_or_else(|| anyhow!("wrapped variable '{wrapped}' is not defined earlier"))?;
                EnhancedVariableBuilder::copy_from(dataset, handle)?.set_name(self.name)
            }
            None => {
                if self.data_type.is_none() {
                    bail!("data_type is required without 'wrap'");
                }
                EnhancedVariableBuilder::new(self.name)
            }
        };

        if let Some(data_type) = self.data_type {
            builder = builder.set_data_type(data_type);
        }
        if let Some(shape) = self.shape {
            builder = builder.set_shape(shape);
        }
        if let Some(mode) = self.enhance {
            builder = builder.set_enhance_mode(mode);
        }
        for attribute in self.attributes {
            builder = builder.add_attribute(attribute);
        }
        if let Some(units) = self.units {
            builder = builder.set_units(units);
        }
        if let Some(description) = self.description {
            builder = builder.set_desc(description);
        }
        if let Some(flag) = self.fill_value_is_missing {
            builder = builder.set_fill_value_is_missing(flag);
        }
        if let Some(flag) = self.invalid_data_is_missing {
            builder = builder.set_invalid_data_is_missing(flag);
        }
        if let Some(flag) = self.missing_data_is_missing {
            builder = builder.set_missing_data_is_missing(flag);
        }
        Ok(builder)
    }
}
