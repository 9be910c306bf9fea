//! Building of the Coverage tables referenced by lookup subtables.
//!
//! > A Coverage table identifies the glyphs affected by a substitution or positioning operation
//! > described in a lookup subtable.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table>

use itertools::Itertools;

use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::U16Be;
use crate::error::WriteError;
use crate::otl::section::SectionTable;
use crate::size;

const HEADER_SIZE: usize = 2 * size::U16;
const RANGE_RECORD_SIZE: usize = 3 * size::U16;

/// Accumulates the glyphs of one Coverage table.
///
/// Obtained from [OtlTable::coverage_begin](crate::otl::OtlTable::coverage_begin) and handed back
/// to [OtlTable::coverage_end](crate::otl::OtlTable::coverage_end).
#[derive(Debug, Default)]
pub struct CoverageBuilder {
    glyphs: Vec<u16>,
}

impl CoverageBuilder {
    pub fn add_glyph(&mut self, glyph: u16) {
        self.glyphs.push(glyph);
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Sorted, duplicate free glyph list.
    pub(crate) fn into_sorted(mut self) -> Vec<u16> {
        self.glyphs.sort_unstable();
        self.glyphs.dedup();
        self.glyphs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageTable {
    Format1 { glyph_array: Vec<u16> },
    Format2 { range_records: Vec<RangeRecord> },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph: u16,
    pub end_glyph: u16,
    pub start_coverage_index: u16,
}

fn glyph_ranges(glyphs: &[u16]) -> impl Iterator<Item = (u16, u16)> + '_ {
    glyphs
        .iter()
        .map(|&glyph| (glyph, glyph))
        .coalesce(|(start, end), (next_start, next_end)| {
            if end.checked_add(1) == Some(next_start) {
                Ok((start, next_end))
            } else {
                Err(((start, end), (next_start, next_end)))
            }
        })
}

impl CoverageTable {
    pub fn format(&self) -> u16 {
        match self {
            CoverageTable::Format1 { .. } => 1,
            CoverageTable::Format2 { .. } => 2,
        }
    }

    pub fn glyph_coverage_value(&self, glyph: u16) -> Option<u16> {
        match self {
            CoverageTable::Format1 { glyph_array } => glyph_array
                .binary_search(&glyph)
                .ok()
                .map(|index| index as u16),
            CoverageTable::Format2 { range_records } => range_records
                .iter()
                .find(|range| glyph >= range.start_glyph && glyph <= range.end_glyph)
                .map(|range| range.start_coverage_index + (glyph - range.start_glyph)),
        }
    }
}

impl SectionTable for CoverageTable {
    type Entry = u16;

    fn from_sorted(glyphs: &[u16]) -> Self {
        let format1_size = HEADER_SIZE + glyphs.len() * size::U16;
        let format2_size = HEADER_SIZE + glyph_ranges(glyphs).count() * RANGE_RECORD_SIZE;

        if format1_size <= format2_size {
            CoverageTable::Format1 {
                glyph_array: glyphs.to_vec(),
            }
        } else {
            let mut coverage_index = 0;
            let range_records = glyph_ranges(glyphs)
                .map(|(start_glyph, end_glyph)| {
                    let record = RangeRecord {
                        start_glyph,
                        end_glyph,
                        start_coverage_index: coverage_index,
                    };
                    coverage_index = coverage_index.wrapping_add(end_glyph - start_glyph + 1);
                    record
                })
                .collect();
            CoverageTable::Format2 { range_records }
        }
    }

    fn size(&self) -> usize {
        match self {
            CoverageTable::Format1 { glyph_array } => HEADER_SIZE + glyph_array.len() * size::U16,
            CoverageTable::Format2 { range_records } => {
                HEADER_SIZE + range_records.len() * RANGE_RECORD_SIZE
            }
        }
    }
}

impl WriteBinary<&Self> for CoverageTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &CoverageTable) -> Result<(), WriteError> {
        U16Be::write(ctxt, table.format())?;
        match table {
            CoverageTable::Format1 { glyph_array } => {
                U16Be::write(ctxt, u16::try_from(glyph_array.len())?)?;
                ctxt.write_iter::<U16Be, _>(glyph_array.iter().copied())?;
            }
            CoverageTable::Format2 { range_records } => {
                U16Be::write(ctxt, u16::try_from(range_records.len())?)?;
                for range in range_records {
                    U16Be::write(ctxt, range.start_glyph)?;
                    U16Be::write(ctxt, range.end_glyph)?;
                    U16Be::write(ctxt, range.start_coverage_index)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write::WriteBuffer;
    use crate::error::OtlError;
    use crate::otl::section::Section;

    fn build(glyphs: &[u16]) -> CoverageTable {
        let mut builder = CoverageBuilder::default();
        glyphs.iter().for_each(|&glyph| builder.add_glyph(glyph));
        CoverageTable::from_sorted(&builder.into_sorted())
    }

    #[test]
    fn sorts_and_drops_duplicates() {
        let mut builder = CoverageBuilder::default();
        [9, 1, 2, 9, 3, 6]
            .iter()
            .for_each(|&glyph| builder.add_glyph(glyph));
        assert_eq!(builder.len(), 6);
        assert!(!builder.is_empty());

        let table = CoverageTable::from_sorted(&builder.into_sorted());
        assert_eq!(
            table,
            CoverageTable::Format1 {
                glyph_array: vec![1, 2, 3, 6, 9]
            }
        );
    }

    #[test]
    fn consecutive_glyphs_switch_to_format2() {
        // header + 3 * 2 < header + 6, ties go to format 1
        assert_eq!(build(&[10, 11, 12]).format(), 1);
        // header + 4 * 2 > header + 6
        let table = build(&[10, 11, 12, 13]);
        assert_eq!(
            table,
            CoverageTable::Format2 {
                range_records: vec![RangeRecord {
                    start_glyph: 10,
                    end_glyph: 13,
                    start_coverage_index: 0
                }]
            }
        );
    }

    #[test]
    fn disjoint_glyphs_stay_format1() {
        let glyphs = (0..50).map(|i| i * 3).collect::<Vec<_>>();
        assert_eq!(build(&glyphs).format(), 1);
    }

    #[test]
    fn empty_is_format1() {
        assert_eq!(build(&[]), CoverageTable::Format1 { glyph_array: vec![] });
    }

    #[test]
    fn format2_coverage_indices() {
        let table = build(&[1, 2, 3, 4, 10, 11, 12, 13, 14, 40, 41, 42, 43]);
        assert_eq!(table.format(), 2);
        assert_eq!(table.glyph_coverage_value(1), Some(0));
        assert_eq!(table.glyph_coverage_value(11), Some(5));
        assert_eq!(table.glyph_coverage_value(43), Some(12));
        assert_eq!(table.glyph_coverage_value(20), None);
    }

    #[test]
    fn last_glyph_id() {
        let table = build(&[0xFFFC, 0xFFFD, 0xFFFE, 0xFFFF]);
        assert_eq!(table.format(), 2);
        assert_eq!(table.glyph_coverage_value(0xFFFF), Some(3));
    }

    #[test]
    fn write_format1() {
        let mut ctxt = WriteBuffer::new();
        CoverageTable::write(&mut ctxt, &build(&[5, 3])).unwrap();
        assert_eq!(ctxt.bytes(), &[0, 1, 0, 2, 0, 3, 0, 5]);
    }

    #[test]
    fn write_format2() {
        let mut ctxt = WriteBuffer::new();
        let table = build(&[1, 2, 3, 4, 5, 6, 8]);
        CoverageTable::write(&mut ctxt, &table).unwrap();
        assert_eq!(
            ctxt.bytes(),
            &[0, 2, 0, 2, 0, 1, 0, 6, 0, 0, 0, 8, 0, 8, 0, 6]
        );
        assert_eq!(ctxt.len(), table.size());
    }

    #[test]
    fn section_dedup() {
        let mut section = Section::<CoverageTable>::new();
        let first = section
            .insert(vec![1, 2, 3], OtlError::CoverageOverflow)
            .unwrap();
        let second = section
            .insert(vec![7], OtlError::CoverageOverflow)
            .unwrap();
        let again = section
            .insert(vec![1, 2, 3], OtlError::CoverageOverflow)
            .unwrap();
        assert_eq!(first, 0);
        assert_eq!(second, 10);
        assert_eq!(again, first);
        assert_eq!(section.size(), 16);
        assert_eq!(section.len(), 2);
    }

    #[test]
    fn section_overflow() {
        let mut section = Section::<CoverageTable>::new();
        // every other glyph: 4 + 2 * 0x7FFB = 0xFFFA bytes, no ranges to merge
        let glyphs = (0..0x7FFBu16).map(|i| i * 2).collect::<Vec<_>>();
        assert_eq!(
            section.insert(glyphs, OtlError::CoverageOverflow),
            Ok(0)
        );
        assert_eq!(
            section.insert(vec![1], OtlError::CoverageOverflow),
            Err(OtlError::CoverageOverflow)
        );
    }
}
