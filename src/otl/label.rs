//! Assignment of lookup indices from subtable labels.

use std::cmp::Ordering;

use itertools::Itertools;

use crate::error::OtlError;
use crate::otl::subtable::{Label, Subtable};
use crate::tag;

/// An entry of the label table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct LabelInfo {
    pub label: Label,
    pub lookup_index: u16,
    /// Set once a reference label resolves to this lookup.
    pub used: bool,
}

/// Ordering used to number lookups.
///
/// Lookup definitions come first, feature parameter blocks after them and references last.
/// Definitions for the `aalt` feature precede all others, then subtables follow the order in which
/// their data was laid out. References keep their insertion order.
fn lookup_order(a: &Subtable, b: &Subtable) -> Ordering {
    match (a.is_reference(), b.is_reference()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => a
            .is_feature_param()
            .cmp(&b.is_feature_param())
            .then_with(|| (b.info.feature == tag::AALT).cmp(&(a.info.feature == tag::AALT)))
            .then_with(|| a.info.offset.cmp(&b.info.offset)),
    }
}

pub(crate) fn find_label(labels: &[LabelInfo], label: Label) -> Option<usize> {
    labels
        .binary_search_by_key(&label, |info| info.label)
        .ok()
}

/// Number the lookups defined by `subtables` and resolve references to them.
///
/// Fills `labels` with one entry per lookup, sorted by label, and returns the number of lookups.
pub(crate) fn assign_lookup_indices(
    subtables: &mut [Subtable],
    labels: &mut Vec<LabelInfo>,
) -> Result<u16, OtlError> {
    labels.clear();
    subtables.sort_by(lookup_order);

    let defining = subtables
        .iter()
        .take_while(|subtable| subtable.defines_lookup())
        .count();
    let (definitions, rest) = subtables.split_at_mut(defining);

    // `aalt` definitions sort apart from the rest, so offsets are compared in their own order
    if let Some((offset, _)) = definitions
        .iter()
        .map(|subtable| subtable.info.offset)
        .sorted()
        .tuple_windows()
        .find(|(a, b)| a == b)
    {
        return Err(OtlError::DuplicateOffset(offset));
    }

    let mut lookup_count: u16 = 0;
    let mut prev_label = None;
    for subtable in definitions.iter_mut() {
        if prev_label != Some(subtable.label()) {
            labels.push(LabelInfo {
                label: subtable.label(),
                lookup_index: lookup_count,
                used: false,
            });
            lookup_count = lookup_count
                .checked_add(1)
                .ok_or(OtlError::OffsetOverflow)?;
            prev_label = Some(subtable.label());
        }
        subtable.lookup_index = Some(lookup_count - 1);
    }

    labels.sort_by_key(|info| info.label);
    if let Some((a, _)) = labels
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.label == b.label)
    {
        return Err(OtlError::DuplicateLabel(a.label.0));
    }

    for subtable in rest.iter_mut().filter(|subtable| subtable.is_reference()) {
        if subtable.is_feature_param() {
            continue;
        }
        let base = subtable.label().base();
        let index = find_label(labels, base).ok_or(OtlError::MissingLabel(base.0))?;
        labels[index].used = true;
        subtable.lookup_index = Some(labels[index].lookup_index);
    }

    Ok(lookup_count)
}

/// Lookup indices of named stand-alone lookups that no reference label ever pointed at.
///
/// Anonymous lookups are skipped: they are reached from contextual rules rather than through
/// references.
pub(crate) fn unreferenced_stand_alone(subtables: &[Subtable], labels: &[LabelInfo]) -> Vec<u16> {
    subtables
        .iter()
        .filter(|subtable| {
            subtable.is_stand_alone()
                && subtable.defines_lookup()
                && !subtable.label().is_anonymous()
        })
        .filter_map(|subtable| find_label(labels, subtable.label()).map(|index| labels[index]))
        .filter(|info| !info.used)
        .map(|info| info.lookup_index)
        .sorted()
        .dedup()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otl::subtable::SubtableInfo;
    use crate::tag::{AALT, DFLT_LANG, KERN, LATN, LIGA};

    fn subtable(feature: u32, label: u16, offset: u32) -> Subtable {
        Subtable::new(SubtableInfo::new(LATN, DFLT_LANG, feature, Label(label), offset))
    }

    fn lookup_index_of(subtables: &[Subtable], offset: u32) -> Option<u16> {
        subtables
            .iter()
            .find(|subtable| subtable.info.offset == offset && !subtable.is_reference())
            .and_then(|subtable| subtable.lookup_index)
    }

    #[test]
    fn labels_group_into_lookups() {
        let mut subtables = vec![
            subtable(KERN, 5, 0),
            subtable(KERN, 5, 20),
            subtable(LIGA, 9, 40),
        ];
        let mut labels = Vec::new();
        let count = assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        assert_eq!(count, 2);
        assert_eq!(lookup_index_of(&subtables, 0), Some(0));
        assert_eq!(lookup_index_of(&subtables, 20), Some(0));
        assert_eq!(lookup_index_of(&subtables, 40), Some(1));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn ordered_by_offset_not_insertion() {
        let mut subtables = vec![subtable(LIGA, 9, 40), subtable(KERN, 5, 0)];
        let mut labels = Vec::new();
        assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        assert_eq!(lookup_index_of(&subtables, 0), Some(0));
        assert_eq!(lookup_index_of(&subtables, 40), Some(1));
    }

    #[test]
    fn aalt_lookups_come_first() {
        let mut subtables = vec![subtable(KERN, 1, 0), subtable(AALT, 2, 100)];
        let mut labels = Vec::new();
        assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        assert_eq!(lookup_index_of(&subtables, 100), Some(0));
        assert_eq!(lookup_index_of(&subtables, 0), Some(1));
    }

    #[test]
    fn references_resolve_and_mark_used() {
        let mut subtables = vec![
            subtable(KERN, Label(7).to_reference().0, 0),
            subtable(KERN, 3, 10),
            subtable(KERN, 7, 20),
        ];
        let mut labels = Vec::new();
        assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        let reference = subtables.iter().find(|s| s.is_reference()).unwrap();
        assert_eq!(reference.lookup_index, lookup_index_of(&subtables, 20));
        let info = labels[find_label(&labels, Label(7)).unwrap()];
        assert!(info.used);
        let info = labels[find_label(&labels, Label(3)).unwrap()];
        assert!(!info.used);
    }

    #[test]
    fn missing_reference() {
        let mut subtables = vec![
            subtable(KERN, 1, 0),
            subtable(KERN, Label(2).to_reference().0, 0),
        ];
        let mut labels = Vec::new();
        assert_eq!(
            assign_lookup_indices(&mut subtables, &mut labels),
            Err(OtlError::MissingLabel(2))
        );
    }

    #[test]
    fn split_label_is_rejected() {
        let mut subtables = vec![
            subtable(KERN, 1, 0),
            subtable(KERN, 2, 10),
            subtable(KERN, 1, 20),
        ];
        let mut labels = Vec::new();
        assert_eq!(
            assign_lookup_indices(&mut subtables, &mut labels),
            Err(OtlError::DuplicateLabel(1))
        );
    }

    #[test]
    fn shared_offset_is_rejected() {
        let mut subtables = vec![subtable(KERN, 1, 8), subtable(LIGA, 2, 8)];
        let mut labels = Vec::new();
        assert_eq!(
            assign_lookup_indices(&mut subtables, &mut labels),
            Err(OtlError::DuplicateOffset(8))
        );
    }

    #[test]
    fn shared_offset_across_aalt_is_rejected() {
        let mut subtables = vec![
            subtable(AALT, 1, 8),
            subtable(KERN, 2, 0),
            subtable(LIGA, 3, 8),
        ];
        let mut labels = Vec::new();
        assert_eq!(
            assign_lookup_indices(&mut subtables, &mut labels),
            Err(OtlError::DuplicateOffset(8))
        );
    }

    #[test]
    fn feature_params_get_no_lookup() {
        let mut subtables = vec![
            Subtable::new(SubtableInfo::feature_param(LATN, DFLT_LANG, tag::SIZE, 0)),
            subtable(KERN, 1, 10),
        ];
        let mut labels = Vec::new();
        let count = assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        assert_eq!(count, 1);
        let param = subtables.iter().find(|s| s.is_feature_param()).unwrap();
        assert_eq!(param.lookup_index, None);
    }

    #[test]
    fn orphaned_stand_alone_lookups() {
        let mut subtables = vec![
            Subtable::new(SubtableInfo::stand_alone(Label(1), 0)),
            Subtable::new(SubtableInfo::stand_alone(Label(1), 10)),
            Subtable::new(SubtableInfo::stand_alone(Label(2), 20)),
            Subtable::new(SubtableInfo::stand_alone(Label::anonymous(0).unwrap(), 30)),
            subtable(KERN, Label(2).to_reference().0, 0),
        ];
        let mut labels = Vec::new();
        assign_lookup_indices(&mut subtables, &mut labels).unwrap();

        assert_eq!(unreferenced_stand_alone(&subtables, &labels), vec![0]);
    }
}
