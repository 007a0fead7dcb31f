//! Decode-time Enhancement of Packed Array Variables
//!
//! This crate presents stored values (packed integers, unsigned bytes,
//! enumeration codes, sentinel fill values) as physical values without
//! rewriting the data source. It provides:
//!
//! - **Conversion rules**: unsigned reinterpretation, scale/offset, missing
//!   value masking, standardization and enum projection
//! - **Wrapping**: an enhanced variable wraps another variable and applies
//!   each enhancement once along the whole chain
//! - **Opt-in caching**: one slot per variable holding unconverted data
//!
//! # Architecture
//!
//! ```text
//! Dataset::read(handle)
//!      │
//!      ├─► Cache hit: cached unconverted data
//!      │
//!      ├─► No wrapped variable: constant missing-data array
//!      │
//!      └─► Wrapped variable: Dataset::read(original)
//!               │
//!               ▼
//!          EnhancedVariable::convert
//!               │
//!               ├─► enum codes → labels (and stop)
//!               ├─► variable-length → unchanged (and stop)
//!               ├─► unsigned → scale/offset
//!               └─► missing → NaN → standardize
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cdm_enhance::{Dataset, EnhanceConfig, LeafVariable};
//!
//! let mut dataset = Dataset::new(EnhanceConfig::from_env());
//! let raw = dataset.add_leaf(LeafVariable::in_memory("CMI", packed));
//! let cmi = dataset.wrap(raw)?;
//!
//! let values = dataset.read(cmi)?;
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod enhance;
pub mod fill;
pub mod filter;
pub mod report;
pub mod source;
pub mod variable;

// Re-export commonly used types at crate root
pub use builder::EnhancedVariableBuilder;
pub use cache::{CacheStats, DataCache};
pub use config::{EnhanceConfig, MissingPolicy};
pub use dataset::{Dataset, DeriveInput};
pub use enhance::{Enhance, EnhanceSet};
pub use report::{scale_missing_report, ScaleMissingReport};
pub use source::{MemorySource, VariableSource};
pub use variable::{EnhancedVariable, Enhancements, LeafVariable, VarHandle, Variable};

pub use cdm_common::{Array, CdmError, CdmResult, DataType, Section};
