//! Definitions of the sizes of binary types.

use std::mem;

pub const U16: usize = mem::size_of::<u16>();
pub const U32: usize = mem::size_of::<u32>();

/// A `Tag16` record: a 4-byte tag followed by a 16-bit offset.
pub const TAG_RECORD: usize = U32 + U16;
