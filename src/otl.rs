//! Assembly of the common tables shared by GSUB and GPOS.
//!
//! A feature file compiler hands every lookup subtable it encodes to an [OtlTable], together with
//! the script, language and feature the subtable belongs to and the label of its lookup. Once all
//! subtables are added, [OtlTable::fill] numbers the lookups and features and builds the
//! ScriptList, FeatureList and LookupList, which [OtlTable::write] then serialises.
//!
//! The table is laid out as follows, with every subtable and feature parameter offset relative to
//! a structure in the list block:
//!
//! ```text
//! header | ScriptList | FeatureList | LookupList | subtable data | coverages | classes
//! ```
//!
//! The subtable data block is encoded by the caller. Coverage and Class Definition tables are
//! collected through [OtlTable::coverage_end] and [OtlTable::class_end], which return offsets
//! relative to the start of their section.

pub mod class;
pub mod coverage;
mod feature;
mod label;
pub mod lists;
mod section;
pub mod subtable;

use log::{debug, warn};

use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::OtlError;
use crate::size;
use crate::tag::DisplayTag;

use self::class::{ClassBuilder, ClassDefTable};
use self::coverage::{CoverageBuilder, CoverageTable};
use self::feature::assign_feature_indices;
use self::label::{assign_lookup_indices, find_label, unreferenced_stand_alone, LabelInfo};
use self::lists::{FeatureList, LookupList, ScriptList};
use self::section::Section;
use self::subtable::{Label, Subtable, SubtableInfo};

const VERSION_1_0: u32 = 0x0001_0000;
const HEADER_SIZE: usize = size::U32 + 3 * size::U16;

/// Lifecycle of an [OtlTable].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableState {
    /// Freshly created or reused; nothing added yet.
    Empty,
    /// Subtables, coverages or classes have been added.
    Accumulating,
    /// Lists are assembled and the table can be written.
    Filled,
}

/// Assembler for one GSUB or GPOS table.
pub struct OtlTable {
    table_tag: u32,
    state: TableState,
    subtables: Vec<Subtable>,
    labels: Vec<LabelInfo>,
    coverages: Section<CoverageTable>,
    classes: Section<ClassDefTable>,
    script_list: ScriptList,
    feature_list: FeatureList,
    lookup_list: LookupList,
    lookup_count: u16,
    feature_count: u16,
    unreferenced: Vec<u16>,
}

impl OtlTable {
    /// Create an empty assembler for the table identified by `table_tag` (`GSUB` or `GPOS`).
    pub fn new(table_tag: u32) -> Self {
        OtlTable {
            table_tag,
            state: TableState::Empty,
            subtables: Vec::new(),
            labels: Vec::new(),
            coverages: Section::new(),
            classes: Section::new(),
            script_list: ScriptList::default(),
            feature_list: FeatureList::default(),
            lookup_list: LookupList::default(),
            lookup_count: 0,
            feature_count: 0,
            unreferenced: Vec::new(),
        }
    }

    pub fn table_tag(&self) -> u32 {
        self.table_tag
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    fn accumulate(&mut self) -> Result<(), OtlError> {
        match self.state {
            TableState::Filled => Err(OtlError::BadState(self.state)),
            TableState::Empty | TableState::Accumulating => {
                self.state = TableState::Accumulating;
                Ok(())
            }
        }
    }

    fn check_filled(&self) -> Result<(), OtlError> {
        match self.state {
            TableState::Filled => Ok(()),
            state => Err(OtlError::BadState(state)),
        }
    }

    /// Register an encoded subtable.
    pub fn add_subtable(&mut self, info: SubtableInfo) -> Result<(), OtlError> {
        self.accumulate()?;
        self.subtables.push(Subtable::new(info));
        Ok(())
    }

    pub fn coverage_begin(&self) -> CoverageBuilder {
        CoverageBuilder::default()
    }

    /// Finish a Coverage table and return its offset from the start of the coverage section.
    ///
    /// A table identical to one already in the section is not stored twice.
    pub fn coverage_end(&mut self, builder: CoverageBuilder) -> Result<u16, OtlError> {
        self.accumulate()?;
        self.coverages
            .insert(builder.into_sorted(), OtlError::CoverageOverflow)
    }

    pub fn class_begin(&self) -> ClassBuilder {
        ClassBuilder::default()
    }

    /// Finish a Class Definition table and return its offset from the start of the class section.
    pub fn class_end(&mut self, builder: ClassBuilder) -> Result<u16, OtlError> {
        self.accumulate()?;
        self.classes
            .insert(builder.into_sorted(), OtlError::ClassOverflow)
    }

    /// Number lookups and features and assemble the ScriptList, FeatureList and LookupList.
    pub fn fill(&mut self) -> Result<(), OtlError> {
        if self.state == TableState::Filled {
            return Err(OtlError::BadState(self.state));
        }

        self.lookup_count = assign_lookup_indices(&mut self.subtables, &mut self.labels)?;
        self.feature_count = assign_feature_indices(&mut self.subtables)?;

        self.script_list.fill(&mut self.subtables)?;
        self.feature_list.fill(&mut self.subtables)?;
        self.lookup_list.fill(&mut self.subtables)?;
        if self.feature_list.has_feature_params() {
            let base = self.feature_list.size() + self.lookup_list.size();
            self.feature_list.fix_feature_params(base)?;
        }

        self.unreferenced = unreferenced_stand_alone(&self.subtables, &self.labels);
        for lookup_index in &self.unreferenced {
            warn!(
                "{}: stand-alone lookup {} is not referenced by any feature \
                 (references from contextual rules are not tracked)",
                DisplayTag(self.table_tag),
                lookup_index
            );
        }

        debug!(
            "{}: {} scripts, {} features, {} lookups; \
             ScriptList {} bytes, FeatureList {} bytes, LookupList {} bytes, \
             coverages {} bytes ({} tables), classes {} bytes ({} tables)",
            DisplayTag(self.table_tag),
            self.script_count(),
            self.feature_count,
            self.lookup_count,
            self.script_list.size(),
            self.feature_list.size(),
            self.lookup_list.size(),
            self.coverages.size(),
            self.coverages.len(),
            self.classes.size(),
            self.classes.len(),
        );

        self.state = TableState::Filled;
        Ok(())
    }

    /// Lookup index assigned to `label`. A reference label yields the index of the lookup it
    /// refers to.
    pub fn label_to_lookup_index(&self, label: Label) -> Result<u16, OtlError> {
        self.check_filled()?;
        let base = label.base();
        find_label(&self.labels, base)
            .map(|index| self.labels[index].lookup_index)
            .ok_or(OtlError::MissingLabel(base.0))
    }

    pub fn lookup_count(&self) -> u16 {
        self.lookup_count
    }

    pub fn feature_count(&self) -> u16 {
        self.feature_count
    }

    pub fn script_count(&self) -> usize {
        self.script_list.script_records.len()
    }

    /// Indices of stand-alone lookups that no feature references, found by the last `fill`.
    ///
    /// Only reference labels added as subtables count as references. A lookup that is reached
    /// solely from a contextual rule, through
    /// [label_to_lookup_index](Self::label_to_lookup_index), is still listed here.
    pub fn unreferenced_lookups(&self) -> &[u16] {
        &self.unreferenced
    }

    pub fn script_list(&self) -> &ScriptList {
        &self.script_list
    }

    pub fn feature_list(&self) -> &FeatureList {
        &self.feature_list
    }

    pub fn lookup_list(&self) -> &LookupList {
        &self.lookup_list
    }

    pub fn coverage_tables(&self) -> impl Iterator<Item = (u16, &CoverageTable)> {
        self.coverages.tables()
    }

    pub fn class_tables(&self) -> impl Iterator<Item = (u16, &ClassDefTable)> {
        self.classes.tables()
    }

    /// Size of the header and lists, which is where the subtable data block starts.
    pub fn lists_size(&self) -> usize {
        HEADER_SIZE + self.script_list.size() + self.feature_list.size() + self.lookup_list.size()
    }

    pub fn coverage_size(&self) -> usize {
        self.coverages.size()
    }

    pub fn class_size(&self) -> usize {
        self.classes.size()
    }

    /// Write the table header followed by the ScriptList, FeatureList and LookupList.
    pub fn write<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), OtlError> {
        self.check_filled()?;
        let start = ctxt.bytes_written();

        U32Be::write(ctxt, VERSION_1_0)?;
        let script_list_offset = ctxt.placeholder::<U16Be, u16>()?;
        let feature_list_offset = ctxt.placeholder::<U16Be, u16>()?;
        let lookup_list_offset = ctxt.placeholder::<U16Be, u16>()?;

        let offset = u16::try_from(ctxt.bytes_written() - start)?;
        ctxt.write_placeholder(script_list_offset, offset)?;
        ScriptList::write(ctxt, &self.script_list)?;

        let offset = u16::try_from(ctxt.bytes_written() - start)?;
        ctxt.write_placeholder(feature_list_offset, offset)?;
        FeatureList::write(ctxt, &self.feature_list)?;

        let offset = u16::try_from(ctxt.bytes_written() - start)?;
        ctxt.write_placeholder(lookup_list_offset, offset)?;
        LookupList::write(ctxt, &self.lookup_list)?;

        Ok(())
    }

    /// Write the coverage section.
    pub fn write_coverages<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), OtlError> {
        self.coverages.write(ctxt)?;
        Ok(())
    }

    /// Write the class section.
    pub fn write_classes<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), OtlError> {
        self.classes.write(ctxt)?;
        Ok(())
    }

    /// Write the complete table with the caller's encoded `subtable_data` placed after the lists,
    /// followed by the coverage and class sections.
    pub fn write_table<C: WriteContext>(
        &self,
        ctxt: &mut C,
        subtable_data: &[u8],
    ) -> Result<(), OtlError> {
        self.write(ctxt)?;
        ctxt.write_bytes(subtable_data)?;
        self.write_coverages(ctxt)?;
        self.write_classes(ctxt)
    }

    /// Discard everything added or built so the table can be used for the next font.
    ///
    /// Allocations are kept.
    pub fn reuse(&mut self) {
        self.subtables.clear();
        self.labels.clear();
        self.coverages.clear();
        self.classes.clear();
        self.script_list = ScriptList::default();
        self.feature_list = FeatureList::default();
        self.lookup_list = LookupList::default();
        self.lookup_count = 0;
        self.feature_count = 0;
        self.unreferenced.clear();
        self.state = TableState::Empty;
    }
}
