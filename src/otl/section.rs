//! Shared storage for the Coverage and Class sections.
//!
//! Both sections hold a sequence of deduplicated tables laid out back to back. Offsets handed out
//! are relative to the start of the section.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::binary::write::{WriteBinary, WriteContext};
use crate::error::{OtlError, WriteError};

/// A table that can be placed in a section.
pub(crate) trait SectionTable: for<'a> WriteBinary<&'a Self, Output = ()> {
    type Entry: Copy + Eq + Hash;

    /// Build the smallest encoding of `entries`, which are already sorted.
    fn from_sorted(entries: &[Self::Entry]) -> Self;

    /// Encoded size in bytes.
    fn size(&self) -> usize;
}

pub(crate) struct Section<T: SectionTable> {
    tables: Vec<(u16, T)>,
    by_content: FxHashMap<Vec<T::Entry>, u16>,
    size: usize,
}

impl<T: SectionTable> Section<T> {
    pub fn new() -> Self {
        Section {
            tables: Vec::new(),
            by_content: FxHashMap::default(),
            size: 0,
        }
    }

    /// Place a table built from the sorted `entries`, or find an identical one already placed.
    ///
    /// Returns the offset of the table from the start of the section, or `overflow` if the
    /// section would no longer be addressable with 16-bit offsets.
    pub fn insert(&mut self, entries: Vec<T::Entry>, overflow: OtlError) -> Result<u16, OtlError> {
        if let Some(&offset) = self.by_content.get(&entries) {
            return Ok(offset);
        }

        let table = T::from_sorted(&entries);
        let new_size = self.size + table.size();
        if new_size > usize::from(u16::MAX) {
            return Err(overflow);
        }
        let offset = u16::try_from(self.size).map_err(|_| overflow)?;

        self.size = new_size;
        self.by_content.insert(entries, offset);
        self.tables.push((offset, table));
        Ok(offset)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn tables(&self) -> impl Iterator<Item = (u16, &T)> {
        self.tables.iter().map(|(offset, table)| (*offset, table))
    }

    /// Drop all tables, keeping allocations for the next round.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.by_content.clear();
        self.size = 0;
    }

    /// Write every table in offset order.
    pub fn write<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), WriteError> {
        let start = ctxt.bytes_written();
        for (offset, table) in &self.tables {
            if ctxt.bytes_written() - start != usize::from(*offset) {
                return Err(WriteError::BadValue);
            }
            <T as WriteBinary<&T>>::write(ctxt, table)?;
        }

        Ok(())
    }
}
