//! Common types shared by the array enhancement crates.
//!
//! Element types, typed arrays, sections, attributes and the error type used
//! at the boundary between raw I/O sources and the enhancement pipeline.

pub mod array;
pub mod attribute;
pub mod data_type;
pub mod enum_typedef;
pub mod error;
pub mod section;

pub use array::{Array, ArrayData, Element};
pub use attribute::{names, Attribute, AttributeContainer, AttributeValues};
pub use data_type::{DataFormat, DataType, Signedness};
pub use enum_typedef::EnumTypedef;
pub use error::{CdmError, CdmResult};
pub use section::{Range, Section};
