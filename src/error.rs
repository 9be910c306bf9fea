//! Error types

use crate::otl::TableState;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    NotImplemented,
    PlaceholderMismatch,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::NotImplemented => write!(f, "writing in this format is not implemented"),
            WriteError::PlaceholderMismatch => {
                write!(f, "data written to placeholder did not match expected size")
            }
        }
    }
}

impl std::error::Error for WriteError {}

/// Fatal errors raised while assembling a layout table.
///
/// Any of these aborts processing of the current font.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OtlError {
    /// The coverage section would grow past the reach of a 16-bit offset.
    CoverageOverflow,
    /// The class section would grow past the reach of a 16-bit offset.
    ClassOverflow,
    /// A feature has more than one feature parameter subtable.
    MultipleFeatureParams(u32),
    /// The same label was found in two separate runs of lookup subtables.
    DuplicateLabel(u16),
    /// Two lookup subtables claim the same data offset.
    DuplicateOffset(u32),
    /// A reference label, or a queried label, does not name any lookup.
    MissingLabel(u16),
    /// An assembled offset does not fit in 16 bits.
    OffsetOverflow,
    /// The operation is not valid in the table's current state.
    BadState(TableState),
    Write(WriteError),
}

impl From<WriteError> for OtlError {
    fn from(error: WriteError) -> Self {
        OtlError::Write(error)
    }
}

impl From<std::num::TryFromIntError> for OtlError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        OtlError::OffsetOverflow
    }
}

impl fmt::Display for OtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtlError::CoverageOverflow => write!(f, "coverage section too large (> 0xFFFF)"),
            OtlError::ClassOverflow => write!(f, "class section too large (> 0xFFFF)"),
            OtlError::MultipleFeatureParams(feature) => write!(
                f,
                "more than one feature parameter block for feature '{}'",
                DisplayTag(*feature)
            ),
            OtlError::DuplicateLabel(label) => {
                write!(f, "duplicate subtable label: {:#06x}", label)
            }
            OtlError::DuplicateOffset(offset) => {
                write!(f, "duplicate subtable offset: {}", offset)
            }
            OtlError::MissingLabel(label) => write!(f, "label not found: {:#06x}", label),
            OtlError::OffsetOverflow => {
                write!(f, "offset overflow, lookups may need to use the extension format")
            }
            OtlError::BadState(state) => write!(f, "operation invalid in {:?} state", state),
            OtlError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for OtlError {}
