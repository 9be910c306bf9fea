//! Building of the Class Definition tables referenced by lookup subtables.

use itertools::Itertools;

use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::U16Be;
use crate::error::WriteError;
use crate::otl::section::SectionTable;
use crate::size;

const FORMAT1_HEADER_SIZE: usize = 3 * size::U16;
const FORMAT2_HEADER_SIZE: usize = 2 * size::U16;
const CLASS_RANGE_RECORD_SIZE: usize = 3 * size::U16;

/// Accumulates the glyph to class mappings of one Class Definition table.
///
/// Obtained from [OtlTable::class_begin](crate::otl::OtlTable::class_begin) and handed back to
/// [OtlTable::class_end](crate::otl::OtlTable::class_end).
#[derive(Debug, Default)]
pub struct ClassBuilder {
    entries: Vec<(u16, u16)>,
}

impl ClassBuilder {
    /// Assign `class` to `glyph`. Class 0 is implicit for unlisted glyphs and is not stored.
    pub fn add_mapping(&mut self, glyph: u16, class: u16) {
        if class != 0 {
            self.entries.push((glyph, class));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by glyph, then class.
    pub(crate) fn into_sorted(mut self) -> Vec<(u16, u16)> {
        self.entries.sort_unstable();
        self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassDefTable {
    Format1 {
        start_glyph: u16,
        class_value_array: Vec<u16>,
    },
    Format2 {
        class_range_records: Vec<ClassRangeRecord>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub class_value: u16,
}

/// Collapse repeated glyphs so the last, and therefore highest, class wins.
fn resolve(entries: &[(u16, u16)]) -> Vec<(u16, u16)> {
    let mut resolved: Vec<(u16, u16)> = Vec::with_capacity(entries.len());
    for &(glyph, class) in entries {
        match resolved.last_mut() {
            Some(last) if last.0 == glyph => last.1 = class,
            _ => resolved.push((glyph, class)),
        }
    }
    resolved
}

fn class_ranges(resolved: &[(u16, u16)]) -> impl Iterator<Item = ClassRangeRecord> + '_ {
    resolved
        .iter()
        .map(|&(glyph, class_value)| ClassRangeRecord {
            start_glyph: glyph,
            end_glyph: glyph,
            class_value,
        })
        .coalesce(|range, next| {
            if range.end_glyph.checked_add(1) == Some(next.start_glyph)
                && range.class_value == next.class_value
            {
                Ok(ClassRangeRecord {
                    end_glyph: next.end_glyph,
                    ..range
                })
            } else {
                Err((range, next))
            }
        })
}

impl ClassDefTable {
    pub fn format(&self) -> u16 {
        match self {
            ClassDefTable::Format1 { .. } => 1,
            ClassDefTable::Format2 { .. } => 2,
        }
    }

    pub fn glyph_class_value(&self, glyph: u16) -> u16 {
        match self {
            ClassDefTable::Format1 {
                start_glyph,
                class_value_array,
            } => glyph
                .checked_sub(*start_glyph)
                .and_then(|index| class_value_array.get(usize::from(index)))
                .copied()
                .unwrap_or(0),
            ClassDefTable::Format2 {
                class_range_records,
            } => class_range_records
                .iter()
                .find(|range| glyph >= range.start_glyph && glyph <= range.end_glyph)
                .map_or(0, |range| range.class_value),
        }
    }
}

impl SectionTable for ClassDefTable {
    type Entry = (u16, u16);

    fn from_sorted(entries: &[(u16, u16)]) -> Self {
        let resolved = resolve(entries);
        let format1_size = match (resolved.first(), resolved.last()) {
            (Some(first), Some(last)) => {
                FORMAT1_HEADER_SIZE + (usize::from(last.0 - first.0) + 1) * size::U16
            }
            _ => FORMAT1_HEADER_SIZE,
        };
        let format2_size =
            FORMAT2_HEADER_SIZE + class_ranges(&resolved).count() * CLASS_RANGE_RECORD_SIZE;

        if format1_size <= format2_size {
            let start_glyph = resolved.first().map_or(0, |entry| entry.0);
            let mut class_value_array = Vec::new();
            for &(glyph, class) in &resolved {
                class_value_array.resize(usize::from(glyph - start_glyph), 0);
                class_value_array.push(class);
            }
            ClassDefTable::Format1 {
                start_glyph,
                class_value_array,
            }
        } else {
            ClassDefTable::Format2 {
                class_range_records: class_ranges(&resolved).collect(),
            }
        }
    }

    fn size(&self) -> usize {
        match self {
            ClassDefTable::Format1 {
                class_value_array, ..
            } => FORMAT1_HEADER_SIZE + class_value_array.len() * size::U16,
            ClassDefTable::Format2 {
                class_range_records,
            } => FORMAT2_HEADER_SIZE + class_range_records.len() * CLASS_RANGE_RECORD_SIZE,
        }
    }
}

impl WriteBinary<&Self> for ClassDefTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &ClassDefTable) -> Result<(), WriteError> {
        U16Be::write(ctxt, table.format())?;
        match table {
            ClassDefTable::Format1 {
                start_glyph,
                class_value_array,
            } => {
                U16Be::write(ctxt, *start_glyph)?;
                U16Be::write(ctxt, u16::try_from(class_value_array.len())?)?;
                ctxt.write_iter::<U16Be, _>(class_value_array.iter().copied())?;
            }
            ClassDefTable::Format2 {
                class_range_records,
            } => {
                U16Be::write(ctxt, u16::try_from(class_range_records.len())?)?;
                for range in class_range_records {
                    U16Be::write(ctxt, range.start_glyph)?;
                    U16Be::write(ctxt, range.end_glyph)?;
                    U16Be::write(ctxt, range.class_value)?;
                }
            }
        }

        Ok(())
    }
}
