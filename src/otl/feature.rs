//! Assignment of feature indices.
//!
//! Every distinct (script, language, feature) triple becomes one Feature table. Indices are
//! numbered in two passes: the first detects where the triple changes, the second orders the
//! features by tag and renumbers them densely in that order.

use crate::error::OtlError;
use crate::otl::subtable::Subtable;

/// Key ordering subtables by script, language and feature, with unbound subtables last.
pub(crate) fn script_order_key(subtable: &Subtable) -> (bool, u32, u32, u32) {
    (
        !subtable.is_feature_bound(),
        subtable.info.script,
        subtable.info.language,
        subtable.info.feature,
    )
}

/// Lookup index as a sort key, with subtables that have none placed last.
pub(crate) fn lookup_key(subtable: &Subtable) -> u32 {
    subtable.lookup_index.map_or(u32::MAX, u32::from)
}

/// Key ordering subtables by feature tag.
///
/// Unlike the lookup ordering, `aalt` receives no special treatment here.
fn feature_order_key(subtable: &Subtable) -> (bool, u32, Option<u16>, u32) {
    (
        !subtable.is_feature_bound(),
        subtable.info.feature,
        subtable.feature_index,
        lookup_key(subtable),
    )
}

/// Number of subtables at the front of a sorted array that belong to a feature.
pub(crate) fn bound_len(subtables: &[Subtable]) -> usize {
    subtables.partition_point(|subtable| subtable.is_feature_bound())
}

/// Assign feature indices to every feature bound subtable and return the number of features.
///
/// Leaves `subtables` ordered by feature tag.
pub(crate) fn assign_feature_indices(subtables: &mut [Subtable]) -> Result<u16, OtlError> {
    subtables.sort_by_key(script_order_key);
    let bound = bound_len(subtables);

    let mut provisional: u16 = 0;
    let mut prev_key = None;
    for subtable in subtables[..bound].iter_mut() {
        let key = script_order_key(subtable);
        if prev_key.is_some() && prev_key != Some(key) {
            provisional = provisional
                .checked_add(1)
                .ok_or(OtlError::OffsetOverflow)?;
        }
        prev_key = Some(key);
        subtable.feature_index = Some(provisional);
    }
    for subtable in subtables[bound..].iter_mut() {
        subtable.feature_index = None;
    }

    subtables.sort_by_key(feature_order_key);

    let mut feature_count: u16 = 0;
    let mut prev_index = None;
    for subtable in subtables[..bound].iter_mut() {
        if prev_index != subtable.feature_index {
            prev_index = subtable.feature_index;
            feature_count = feature_count
                .checked_add(1)
                .ok_or(OtlError::OffsetOverflow)?;
        }
        subtable.feature_index = Some(feature_count - 1);
    }

    Ok(feature_count)
}
