//! Human-readable summary of a variable's conversion rules.

use std::fmt;

use cdm_common::{CdmResult, DataType};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::enhance::EnhanceSet;
use crate::variable::{VarHandle, Variable};

/// Conversion summary of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleMissingReport {
    pub name: String,
    pub original_data_type: DataType,
    pub data_type: DataType,
    pub active: EnhanceSet,
    pub effective: EnhanceSet,
    pub unsigned: bool,
    pub scale_offset: Option<ScaleInfo>,
    pub missing: Option<MissingInfo>,
    pub fill_value: Option<f64>,
    pub units: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleInfo {
    pub scale: f64,
    pub offset: f64,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingInfo {
    pub valid_min: Option<f64>,
    pub valid_max: Option<f64>,
    pub missing_values: Vec<f64>,
    pub fill_value_is_missing: bool,
    pub invalid_data_is_missing: bool,
    pub missing_data_is_missing: bool,
}

/// Summarize how `handle` converts its data.
pub fn scale_missing_report(dataset: &Dataset, handle: VarHandle) -> CdmResult<ScaleMissingReport> {
    let var = dataset.get(handle)?;
    let units = dataset.units(handle)?;
    let effective = dataset.effective_enhancements(handle)?;

    let var = match var {
        Variable::Leaf(leaf) => {
            return Ok(ScaleMissingReport {
                name: leaf.name().to_string(),
                original_data_type: leaf.data_type(),
                data_type: leaf.data_type(),
                active: EnhanceSet::empty(),
                effective,
                unsigned: false,
                scale_offset: None,
                missing: None,
                fill_value: None,
                units,
            })
        }
        Variable::Enhanced(var) => var,
    };

    let missing = var.enhancements().convert_missing.as_ref().map(|rule| {
        let policy = rule.policy();
        MissingInfo {
            valid_min: rule.has_valid_data().then(|| rule.valid_min()),
            valid_max: rule.has_valid_data().then(|| rule.valid_max()),
            missing_values: rule.missing_values().to_vec(),
            fill_value_is_missing: policy.fill_value_is_missing,
            invalid_data_is_missing: policy.invalid_data_is_missing,
            missing_data_is_missing: policy.missing_data_is_missing,
        }
    });

    Ok(ScaleMissingReport {
        name: var.name().to_string(),
        original_data_type: var.original_data_type(),
        data_type: var.data_type(),
        active: var.active_enhancements(),
        effective,
        unsigned: var.enhancements().unsigned.is_some(),
        scale_offset: var.enhancements().scale_offset.map(|rule| ScaleInfo {
            scale: rule.scale_factor(),
            offset: rule.offset(),
            data_type: rule.scaled_offset_type(),
        }),
        missing,
        fill_value: var.fill_value(),
        units,
    })
}

impl fmt::Display for ScaleMissingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} -> {}", self.name, self.original_data_type, self.data_type)?;
        writeln!(f, "  enhancements: {} (effective {})", self.active, self.effective)?;
        if let Some(units) = &self.units {
            writeln!(f, "  units: {units}")?;
        }
        if self.unsigned {
            writeln!(f, "  unsigned")?;
        }
        if let Some(scale) = &self.scale_offset {
            writeln!(
                f,
                "  scale_factor={} add_offset={} ({})",
                scale.scale, scale.offset, scale.data_type
            )?;
        }
        if let Some(fill) = self.fill_value {
            writeln!(f, "  _FillValue={fill}")?;
        }
        if let Some(missing) = &self.missing {
            if let (Some(min), Some(max)) = (missing.valid_min, missing.valid_max) {
                writeln!(f, "  valid range [{min}, {max}]")?;
            }
            if !missing.missing_values.is_empty() {
                writeln!(f, "  missing_value={:?}", missing.missing_values)?;
            }
            writeln!(
                f,
                "  fill is missing={} invalid is missing={} missing is missing={}",
                missing.fill_value_is_missing,
                missing.invalid_data_is_missing,
                missing.missing_data_is_missing
            )?;
        }
        Ok(())
    }
}
