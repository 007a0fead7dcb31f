//! Raw I/O seam: where leaf variables get their stored arrays.

use cdm_common::{Array, CdmResult, Section};

use crate::variable::LeafVariable;

/// Supplies the stored, unconverted data of a leaf variable.
///
/// Implementations decode a file format into typed arrays. Failures are
/// reported as [`CdmError::Io`](cdm_common::CdmError::Io) or, for sections
/// the source cannot serve, [`CdmError::InvalidRange`](cdm_common::CdmError::InvalidRange).
pub trait VariableSource: Send + Sync {
    /// Read the whole variable.
    fn read(&self, variable: &LeafVariable) -> CdmResult<Array>;

    /// Read part of the variable. The section has already been checked
    /// against the declared shape.
    fn read_section(&self, variable: &LeafVariable, section: &Section) -> CdmResult<Array> {
        self.read(variable)?.section(section)
    }
}

/// A source over an array already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Array,
}

impl MemorySource {
    pub fn new(data: Array) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array {
        &self.data
    }
}

impl VariableSource for MemorySource {
    fn read(&self, _variable: &LeafVariable) -> CdmResult<Array> {
        Ok(self.data.clone())
    }

    fn read_section(&self, _variable: &LeafVariable, section: &Section) -> CdmResult<Array> {
        self.data.section(section)
    }
}
