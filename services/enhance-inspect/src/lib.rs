//! Inspect how variables described by a JSON manifest are enhanced.
//!
//! The binary loads a [`manifest::Manifest`], builds a
//! [`Dataset`](cdm_enhance::Dataset) from it and prints an
//! [`inspect::Inspection`] per variable.

pub mod inspect;
pub mod manifest;

pub use inspect::{inspect, Inspection, Values};
pub use manifest::Manifest;
