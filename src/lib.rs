#![warn(rust_2018_idioms)]

//! Assembly of the OpenType layout common tables (ScriptList, FeatureList, LookupList) and the
//! Coverage and Class Definition tables shared by GSUB and GPOS lookups.
//!
//! See [otl::OtlTable] for the entry point.

/// Writing of binary data.
pub mod binary;
pub mod error;
pub mod otl;
pub mod size;
pub mod tag;

pub use crate::error::OtlError;
pub use crate::otl::{OtlTable, TableState};
