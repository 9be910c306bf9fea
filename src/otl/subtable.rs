//! Classified, pre-encoded lookup subtables and their labels.

use std::fmt;

use bitflags::bitflags;

use crate::tag;

bitflags! {
    /// Lookup qualifiers stored in the `lookupFlag` field of a Lookup table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        /// Lookup table carries a `markFilteringSet` field after its subtable offsets.
        const USE_MARK_FILTERING_SET = 0x0010;
        /// High byte holds the mark attachment class.
        const MARK_ATTACHMENT_TYPE_MASK = 0xFF00;
    }
}

impl LookupFlag {
    /// Build a flag set carrying `class` as the mark attachment type.
    pub fn with_mark_attachment_type(self, class: u8) -> LookupFlag {
        let bits = (self.bits() & !LookupFlag::MARK_ATTACHMENT_TYPE_MASK.bits())
            | (u16::from(class) << 8);
        LookupFlag::from_bits_retain(bits)
    }

    pub fn mark_attachment_type(self) -> u8 {
        (self.bits() >> 8) as u8
    }
}

/// Identifies the lookup a subtable belongs to.
///
/// Label values are partitioned into named labels (lookups given a name by the author), anonymous
/// labels (lookups generated without a name) and reference labels, which have
/// [REFERENCE_BIT](Label::REFERENCE_BIT) set and re-use the lookup named by the rest of the value.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub u16);

impl Label {
    pub const NAMED_MIN: u16 = 0;
    pub const NAMED_MAX: u16 = 0x1FFF;
    pub const ANON_MIN: u16 = Label::NAMED_MAX + 1;
    pub const ANON_MAX: u16 = 0x7FFE;
    pub const REFERENCE_BIT: u16 = 0x8000;
    pub const UNDEF: Label = Label(0xFFFF);

    pub fn named(index: u16) -> Option<Label> {
        (index <= Label::NAMED_MAX).then_some(Label(Label::NAMED_MIN + index))
    }

    pub fn anonymous(index: u16) -> Option<Label> {
        index
            .checked_add(Label::ANON_MIN)
            .filter(|value| *value <= Label::ANON_MAX)
            .map(Label)
    }

    /// A label referring to the lookup defined by `self`.
    pub fn to_reference(self) -> Label {
        Label(self.0 | Label::REFERENCE_BIT)
    }

    pub fn is_reference(self) -> bool {
        self != Label::UNDEF && self.0 & Label::REFERENCE_BIT != 0
    }

    /// The label with the reference bit cleared.
    pub fn base(self) -> Label {
        if self == Label::UNDEF {
            self
        } else {
            Label(self.0 & !Label::REFERENCE_BIT)
        }
    }

    pub fn is_named(self) -> bool {
        self != Label::UNDEF && self.base().0 <= Label::NAMED_MAX
    }

    pub fn is_anonymous(self) -> bool {
        (Label::ANON_MIN..=Label::ANON_MAX).contains(&self.base().0)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reference() {
            write!(f, "Label(ref {:#06x})", self.base().0)
        } else {
            write!(f, "Label({:#06x})", self.0)
        }
    }
}

/// Run-length markers for a sorted run of subtables.
///
/// Only meaningful on the first subtable of a run: each field holds the array index where the
/// next run with a different script, language, feature or lookup starts.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub script: usize,
    pub language: usize,
    pub feature: usize,
    pub lookup: usize,
}

/// The classification arguments of [OtlTable::add_subtable](crate::otl::OtlTable::add_subtable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtableInfo {
    pub script: u32,
    pub language: u32,
    pub feature: u32,
    pub lookup_type: u16,
    pub lookup_flag: LookupFlag,
    /// Only read when `lookup_flag` contains `USE_MARK_FILTERING_SET`.
    pub mark_set_index: u16,
    /// For extension subtables, the type of the wrapped lookup.
    pub extension_lookup_type: u16,
    /// Offset of the encoded subtable from the start of the subtable data block.
    pub offset: u32,
    pub label: Label,
    pub format: u16,
    pub is_feature_param: bool,
}

impl SubtableInfo {
    /// A lookup subtable bound to `script`/`language`/`feature`.
    pub fn new(script: u32, language: u32, feature: u32, label: Label, offset: u32) -> Self {
        SubtableInfo {
            script,
            language,
            feature,
            lookup_type: 1,
            lookup_flag: LookupFlag::empty(),
            mark_set_index: 0,
            extension_lookup_type: 0,
            offset,
            label,
            format: 1,
            is_feature_param: false,
        }
    }

    /// A lookup subtable defined outside of any feature.
    pub fn stand_alone(label: Label, offset: u32) -> Self {
        SubtableInfo::new(
            tag::TAG_STAND_ALONE,
            tag::TAG_STAND_ALONE,
            tag::TAG_STAND_ALONE,
            label,
            offset,
        )
    }

    /// A subtable of an anonymous lookup, such as one generated for a contextual rule.
    ///
    /// `label` is normally in the anonymous range, see [Label::anonymous].
    pub fn anonymous(label: Label, offset: u32) -> Self {
        SubtableInfo::new(tag::TAG_UNDEF, tag::TAG_UNDEF, tag::TAG_UNDEF, label, offset)
    }

    /// A feature parameter block for `feature`, e.g. the `size` feature's parameters.
    pub fn feature_param(script: u32, language: u32, feature: u32, offset: u32) -> Self {
        SubtableInfo {
            is_feature_param: true,
            ..SubtableInfo::new(script, language, feature, Label::UNDEF, offset)
        }
    }

    pub fn lookup_type(self, lookup_type: u16) -> Self {
        SubtableInfo {
            lookup_type,
            ..self
        }
    }

    pub fn lookup_flag(self, lookup_flag: LookupFlag) -> Self {
        SubtableInfo {
            lookup_flag,
            ..self
        }
    }

    pub fn mark_set_index(self, mark_set_index: u16) -> Self {
        SubtableInfo {
            lookup_flag: self.lookup_flag | LookupFlag::USE_MARK_FILTERING_SET,
            mark_set_index,
            ..self
        }
    }

    pub fn extension(self, extension_lookup_type: u16) -> Self {
        SubtableInfo {
            extension_lookup_type,
            ..self
        }
    }

    pub fn format(self, format: u16) -> Self {
        SubtableInfo { format, ..self }
    }
}

/// One subtable as tracked by the assembler.
#[derive(Debug, Clone)]
pub(crate) struct Subtable {
    pub info: SubtableInfo,
    pub feature_index: Option<u16>,
    pub lookup_index: Option<u16>,
    pub span: Span,
}

impl Subtable {
    pub fn new(info: SubtableInfo) -> Self {
        Subtable {
            info,
            feature_index: None,
            lookup_index: None,
            span: Span::default(),
        }
    }

    pub fn label(&self) -> Label {
        self.info.label
    }

    /// Part of a real feature, i.e. reachable from the ScriptList.
    pub fn is_feature_bound(&self) -> bool {
        tag::is_bound(self.info.feature)
    }

    pub fn is_reference(&self) -> bool {
        self.info.label.is_reference()
    }

    pub fn is_feature_param(&self) -> bool {
        self.info.is_feature_param
    }

    /// Defines (rather than references) the lookup identified by its label.
    pub fn defines_lookup(&self) -> bool {
        !self.is_reference() && !self.is_feature_param()
    }

    pub fn is_stand_alone(&self) -> bool {
        self.info.feature == tag::TAG_STAND_ALONE
    }
}

/// Compute span markers over `subtables`, which must already be grouped by `key`.
///
/// `set` stores the end index of each run into the first subtable of that run.
pub(crate) fn calc_spans<K, F, S>(subtables: &mut [Subtable], key: F, mut set: S)
where
    K: PartialEq,
    F: Fn(&Subtable) -> K,
    S: FnMut(&mut Span, usize),
{
    let mut start = 0;
    while start < subtables.len() {
        let current = key(&subtables[start]);
        let end = subtables[start..]
            .iter()
            .position(|subtable| key(subtable) != current)
            .map_or(subtables.len(), |n| start + n);
        set(&mut subtables[start].span, end);
        start = end;
    }
}
