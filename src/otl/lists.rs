//! Assembly and writing of the ScriptList, FeatureList and LookupList.
//!
//! The lists are laid out back to back (ScriptList, FeatureList, LookupList) and the subtable data
//! block follows the LookupList directly. Each list stores offsets relative to the structure
//! that owns them, as the OpenType layout common table formats require.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2>

use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::U16Be;
use crate::binary::U32Be;
use crate::error::{OtlError, WriteError};
use crate::otl::feature::{bound_len, lookup_key};
use crate::otl::subtable::{calc_spans, LookupFlag, Subtable};
use crate::size;
use crate::tag;

const NO_REQUIRED_FEATURE: u16 = 0xFFFF;

#[derive(Debug, Default)]
pub struct ScriptList {
    pub script_records: Vec<ScriptRecord>,
    size: usize,
}

#[derive(Debug)]
pub struct ScriptRecord {
    pub script_tag: u32,
    /// From the start of the ScriptList.
    pub offset: u16,
    pub script_table: ScriptTable,
}

#[derive(Debug)]
pub struct ScriptTable {
    pub opt_default_langsys: Option<LangSys>,
    pub langsys_records: Vec<LangSysRecord>,
}

#[derive(Debug)]
pub struct LangSysRecord {
    pub langsys_tag: u32,
    /// From the start of the owning Script table.
    pub offset: u16,
    pub langsys_table: LangSys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangSys {
    pub feature_indices: Vec<u16>,
}

#[derive(Debug, Default)]
pub struct FeatureList {
    pub feature_records: Vec<FeatureRecord>,
    size: usize,
}

#[derive(Debug)]
pub struct FeatureRecord {
    pub feature_tag: u32,
    /// From the start of the FeatureList.
    pub offset: u16,
    pub feature_table: FeatureTable,
}

#[derive(Debug)]
pub struct FeatureTable {
    pub feature_params: Option<FeatureParams>,
    pub lookup_indices: Vec<u16>,
}

/// Location of a feature's parameter block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FeatureParams {
    /// Offset from the start of the subtable data block, before the lists are complete.
    InSubtableBlock(u32),
    /// Offset from the start of the Feature table.
    FromFeature(u16),
}

#[derive(Debug, Default)]
pub struct LookupList {
    pub lookups: Vec<Lookup>,
    size: usize,
}

#[derive(Debug)]
pub struct Lookup {
    /// From the start of the LookupList.
    pub offset: u16,
    pub lookup_type: u16,
    pub lookup_flag: LookupFlag,
    /// From the start of this Lookup table.
    pub subtable_offsets: Vec<u16>,
    pub mark_filtering_set: Option<u16>,
}

impl LangSys {
    fn size(&self) -> usize {
        3 * size::U16 + self.feature_indices.len() * size::U16
    }
}

impl ScriptTable {
    fn header_size(&self) -> usize {
        2 * size::U16 + self.langsys_records.len() * size::TAG_RECORD
    }

    fn size(&self) -> usize {
        self.header_size()
            + self.opt_default_langsys.as_ref().map_or(0, LangSys::size)
            + self
                .langsys_records
                .iter()
                .map(|record| record.langsys_table.size())
                .sum::<usize>()
    }
}

impl ScriptList {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn find_script(&self, script_tag: u32) -> Option<&ScriptTable> {
        self.script_records
            .iter()
            .find(|record| record.script_tag == script_tag)
            .map(|record| &record.script_table)
    }

    fn clear(&mut self) {
        self.script_records.clear();
        self.size = 0;
    }

    /// Build the ScriptList from subtables with assigned feature indices.
    ///
    /// Re-sorts `subtables` by script, language and feature index.
    pub(crate) fn fill(&mut self, subtables: &mut [Subtable]) -> Result<(), OtlError> {
        self.clear();
        subtables.sort_by_key(|subtable| {
            (
                !subtable.is_feature_bound(),
                subtable.info.script,
                subtable.info.language,
                subtable.feature_index,
            )
        });
        let bound_count = bound_len(subtables);
        let bound = &mut subtables[..bound_count];

        calc_spans(bound, |s| s.info.script, |span, end| span.script = end);
        calc_spans(
            bound,
            |s| (s.info.script, s.info.language),
            |span, end| span.language = end,
        );
        calc_spans(
            bound,
            |s| (s.info.script, s.info.language, s.feature_index),
            |span, end| span.feature = end,
        );

        let mut script_start = 0;
        while script_start < bound.len() {
            let script_end = bound[script_start].span.script;
            let mut script_table = ScriptTable {
                opt_default_langsys: None,
                langsys_records: Vec::new(),
            };

            let mut language_start = script_start;
            while language_start < script_end {
                let language_end = bound[language_start].span.language;
                let mut feature_indices = Vec::new();
                let mut feature_start = language_start;
                while feature_start < language_end {
                    feature_indices.extend(bound[feature_start].feature_index);
                    feature_start = bound[feature_start].span.feature;
                }

                let langsys_tag = bound[language_start].info.language;
                let langsys_table = LangSys { feature_indices };
                if langsys_tag == tag::DFLT_LANG {
                    script_table.opt_default_langsys = Some(langsys_table);
                } else {
                    script_table.langsys_records.push(LangSysRecord {
                        langsys_tag,
                        offset: 0,
                        langsys_table,
                    });
                }
                language_start = language_end;
            }

            // The default LangSys sits right after the records, named ones follow it
            let mut langsys_offset = script_table.header_size()
                + script_table
                    .opt_default_langsys
                    .as_ref()
                    .map_or(0, LangSys::size);
            for record in script_table.langsys_records.iter_mut() {
                record.offset = u16::try_from(langsys_offset)?;
                langsys_offset += record.langsys_table.size();
            }

            self.script_records.push(ScriptRecord {
                script_tag: bound[script_start].info.script,
                offset: 0,
                script_table,
            });
            script_start = script_end;
        }

        let mut offset = size::U16 + self.script_records.len() * size::TAG_RECORD;
        for record in self.script_records.iter_mut() {
            record.offset = u16::try_from(offset)?;
            offset += record.script_table.size();
        }
        self.size = offset;

        Ok(())
    }
}

impl FeatureTable {
    fn size(&self) -> usize {
        2 * size::U16 + self.lookup_indices.len() * size::U16
    }
}

impl FeatureList {
    pub fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        self.feature_records.clear();
        self.size = 0;
    }

    /// Build the FeatureList from subtables with assigned feature and lookup indices.
    ///
    /// Re-sorts `subtables` by feature index, then lookup index.
    pub(crate) fn fill(&mut self, subtables: &mut [Subtable]) -> Result<(), OtlError> {
        self.clear();
        subtables.sort_by_key(|subtable| {
            (
                !subtable.is_feature_bound(),
                subtable.feature_index,
                lookup_key(subtable),
            )
        });
        let bound_count = bound_len(subtables);
        let bound = &mut subtables[..bound_count];

        calc_spans(bound, |s| s.feature_index, |span, end| span.feature = end);

        let mut feature_start = 0;
        while feature_start < bound.len() {
            let feature_end = bound[feature_start].span.feature;
            let feature_tag = bound[feature_start].info.feature;
            let run = &bound[feature_start..feature_end];

            let mut params = run.iter().filter(|subtable| subtable.is_feature_param());
            let feature_params = params
                .next()
                .map(|param| FeatureParams::InSubtableBlock(param.info.offset));
            if params.next().is_some() {
                return Err(OtlError::MultipleFeatureParams(feature_tag));
            }

            let mut lookup_indices: Vec<u16> = run
                .iter()
                .filter(|subtable| !subtable.is_feature_param())
                .filter_map(|subtable| subtable.lookup_index)
                .collect();
            lookup_indices.dedup();

            self.feature_records.push(FeatureRecord {
                feature_tag,
                offset: 0,
                feature_table: FeatureTable {
                    feature_params,
                    lookup_indices,
                },
            });
            feature_start = feature_end;
        }

        let mut offset = size::U16 + self.feature_records.len() * size::TAG_RECORD;
        for record in self.feature_records.iter_mut() {
            record.offset = u16::try_from(offset)?;
            offset += record.feature_table.size();
        }
        self.size = offset;

        Ok(())
    }

    pub fn has_feature_params(&self) -> bool {
        self.feature_records
            .iter()
            .any(|record| record.feature_table.feature_params.is_some())
    }

    /// Restate parameter offsets relative to their Feature table.
    ///
    /// `base` is the distance from the start of the FeatureList to the start of the subtable
    /// data block.
    pub(crate) fn fix_feature_params(&mut self, base: usize) -> Result<(), OtlError> {
        for record in self.feature_records.iter_mut() {
            if let Some(FeatureParams::InSubtableBlock(offset)) =
                record.feature_table.feature_params
            {
                let from_feature = base + usize::try_from(offset)? - usize::from(record.offset);
                record.feature_table.feature_params =
                    Some(FeatureParams::FromFeature(u16::try_from(from_feature)?));
            }
        }

        Ok(())
    }
}

impl Lookup {
    fn size(&self) -> usize {
        3 * size::U16
            + self.subtable_offsets.len() * size::U16
            + self.mark_filtering_set.map_or(0, |_| size::U16)
    }
}

impl LookupList {
    pub fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        self.lookups.clear();
        self.size = 0;
    }

    /// Build the LookupList from subtables with assigned lookup indices.
    ///
    /// Re-sorts `subtables` by lookup index, then data offset. References and feature parameters
    /// contribute no lookups and are moved to the end.
    pub(crate) fn fill(&mut self, subtables: &mut [Subtable]) -> Result<(), OtlError> {
        self.clear();
        subtables.sort_by_key(|subtable| {
            (
                !subtable.defines_lookup(),
                lookup_key(subtable),
                subtable.info.offset,
            )
        });
        let defining = subtables.partition_point(|subtable| subtable.defines_lookup());
        let definitions = &mut subtables[..defining];

        calc_spans(definitions, |s| s.lookup_index, |span, end| span.lookup = end);

        // Subtable data follows the LookupList, so offsets can only be stated once every Lookup
        // has been sized.
        let mut data_offsets = Vec::new();
        let mut lookup_start = 0;
        while lookup_start < definitions.len() {
            let lookup_end = definitions[lookup_start].span.lookup;
            let first = &definitions[lookup_start].info;
            let mark_filtering_set = first
                .lookup_flag
                .contains(LookupFlag::USE_MARK_FILTERING_SET)
                .then_some(first.mark_set_index);

            let offsets = definitions[lookup_start..lookup_end]
                .iter()
                .map(|subtable| subtable.info.offset)
                .collect::<Vec<_>>();

            self.lookups.push(Lookup {
                offset: 0,
                lookup_type: first.lookup_type,
                lookup_flag: first.lookup_flag,
                subtable_offsets: vec![0; offsets.len()],
                mark_filtering_set,
            });
            data_offsets.push(offsets);
            lookup_start = lookup_end;
        }

        let mut offset = size::U16 + self.lookups.len() * size::U16;
        for lookup in self.lookups.iter_mut() {
            lookup.offset = u16::try_from(offset)?;
            offset += lookup.size();
        }
        self.size = offset;

        for (lookup, offsets) in self.lookups.iter_mut().zip(data_offsets) {
            let to_list_end = self.size - usize::from(lookup.offset);
            for (subtable_offset, data_offset) in lookup.subtable_offsets.iter_mut().zip(offsets) {
                *subtable_offset = u16::try_from(to_list_end + usize::try_from(data_offset)?)?;
            }
        }

        Ok(())
    }
}

impl WriteBinary<&Self> for LangSys {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, langsys: &LangSys) -> Result<(), WriteError> {
        U16Be::write(ctxt, 0u16)?; // lookupOrderOffset, reserved
        U16Be::write(ctxt, NO_REQUIRED_FEATURE)?;
        U16Be::write(ctxt, u16::try_from(langsys.feature_indices.len())?)?;
        ctxt.write_iter::<U16Be, _>(langsys.feature_indices.iter().copied())
    }
}

impl WriteBinary<&Self> for ScriptTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, script: &ScriptTable) -> Result<(), WriteError> {
        let default_offset = match script.opt_default_langsys {
            Some(_) => u16::try_from(script.header_size())?,
            None => 0,
        };
        U16Be::write(ctxt, default_offset)?;
        U16Be::write(ctxt, u16::try_from(script.langsys_records.len())?)?;
        for record in &script.langsys_records {
            U32Be::write(ctxt, record.langsys_tag)?;
            U16Be::write(ctxt, record.offset)?;
        }
        if let Some(langsys) = &script.opt_default_langsys {
            LangSys::write(ctxt, langsys)?;
        }
        for record in &script.langsys_records {
            LangSys::write(ctxt, &record.langsys_table)?;
        }

        Ok(())
    }
}

impl WriteBinary<&Self> for ScriptList {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, list: &ScriptList) -> Result<(), WriteError> {
        U16Be::write(ctxt, u16::try_from(list.script_records.len())?)?;
        for record in &list.script_records {
            U32Be::write(ctxt, record.script_tag)?;
            U16Be::write(ctxt, record.offset)?;
        }
        for record in &list.script_records {
            ScriptTable::write(ctxt, &record.script_table)?;
        }

        Ok(())
    }
}

impl WriteBinary<&Self> for FeatureTable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, feature: &FeatureTable) -> Result<(), WriteError> {
        let params_offset = match feature.feature_params {
            None => 0,
            Some(FeatureParams::FromFeature(offset)) => offset,
            // Parameter offsets are fixed up when the table is filled
            Some(FeatureParams::InSubtableBlock(_)) => return Err(WriteError::BadValue),
        };
        U16Be::write(ctxt, params_offset)?;
        U16Be::write(ctxt, u16::try_from(feature.lookup_indices.len())?)?;
        ctxt.write_iter::<U16Be, _>(feature.lookup_indices.iter().copied())
    }
}

impl WriteBinary<&Self> for FeatureList {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, list: &FeatureList) -> Result<(), WriteError> {
        U16Be::write(ctxt, u16::try_from(list.feature_records.len())?)?;
        for record in &list.feature_records {
            U32Be::write(ctxt, record.feature_tag)?;
            U16Be::write(ctxt, record.offset)?;
        }
        for record in &list.feature_records {
            FeatureTable::write(ctxt, &record.feature_table)?;
        }

        Ok(())
    }
}

impl WriteBinary<&Self> for Lookup {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, lookup: &Lookup) -> Result<(), WriteError> {
        U16Be::write(ctxt, lookup.lookup_type)?;
        U16Be::write(ctxt, lookup.lookup_flag.bits())?;
        U16Be::write(ctxt, u16::try_from(lookup.subtable_offsets.len())?)?;
        ctxt.write_iter::<U16Be, _>(lookup.subtable_offsets.iter().copied())?;
        if let Some(mark_filtering_set) = lookup.mark_filtering_set {
            U16Be::write(ctxt, mark_filtering_set)?;
        }

        Ok(())
    }
}

impl WriteBinary<&Self> for LookupList {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, list: &LookupList) -> Result<(), WriteError> {
        U16Be::write(ctxt, u16::try_from(list.lookups.len())?)?;
        ctxt.write_iter::<U16Be, _>(list.lookups.iter().map(|lookup| lookup.offset))?;
        for lookup in &list.lookups {
            Lookup::write(ctxt, lookup)?;
        }

        Ok(())
    }
}
