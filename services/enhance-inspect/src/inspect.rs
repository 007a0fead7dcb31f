//! Read one variable and summarize its conversion.

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;

use cdm_common::{Array, ArrayData, Section};
use cdm_enhance::{scale_missing_report, Dataset, ScaleMissingReport, VarHandle};

/// Converted values, numeric or text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    /// NaN serializes as `null`.
    Numbers(Vec<f64>),
    Text(Vec<String>),
}

impl Values {
    fn from_array(array: &Array) -> Self {
        if array.data_type().is_string() || matches!(array.data(), ArrayData::VarLen(_)) {
            Values::Text((0..array.len()).filter_map(|i| array.get_string(i)).collect())
        } else {
            Values::Numbers(array.to_f64_vec())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub report: ScaleMissingReport,
    pub shape: Vec<usize>,
    pub values: Values,
}

/// Read `handle` (or `section` of it, in `first:last[:stride]` form) and report.
pub fn inspect(dataset: &Dataset, handle: VarHandle, section: Option<&str>) -> Result<Inspection> {
    let report = scale_missing_report(dataset, handle)?;
    let data = match section {
        Some(text) => {
            let shape = dataset.get(handle)?.shape().to_vec();
            let section = Section::parse_for_shape(text, &shape)
                .with_context(|| format!("bad section '{text}' for {}", report.name))?;
            dataset.read_section(handle, &section)?
        }
        None => dataset.read(handle)?,
    };

    Ok(Inspection {
        report,
        shape: data.shape().to_vec(),
        values: Values::from_array(&data),
    })
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)?;
        writeln!(f, "  shape: {:?}", self.shape)?;
        match &self.values {
            Values::Numbers(values) => writeln!(f, "  values: {values:?}"),
            Values::Text(values) => writeln!(f, "  values: {values:?}"),
        }
    }
}
