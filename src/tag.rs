//! Script, language, feature and table tags.

use std::fmt;

/// Generate a 4-byte font table tag from byte string
///
/// Example:
///
/// ```ignore
/// assert_eq!(tag!(b"kern"), 0x6B65726E);
/// ```
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

const fn tag(chars: [u8; 4]) -> u32 {
    ((chars[3] as u32) << 0)
        | ((chars[2] as u32) << 8)
        | ((chars[1] as u32) << 16)
        | ((chars[0] as u32) << 24)
}

/// Build a tag from a string of up to four printable ASCII characters, padding with spaces.
///
/// Returns `None` if the string is too long or contains other characters.
pub fn from_string(s: &str) -> Option<u32> {
    if s.len() > 4 {
        return None;
    }

    let mut tag: u32 = 0;
    let mut count = 0;

    for c in s.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return None;
        }

        tag = (tag << 8) | (c as u32);
        count += 1;
    }

    while count < 4 {
        tag = (tag << 8) | (' ' as u32);
        count += 1;
    }

    Some(tag)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.0;
        let mut s = String::with_capacity(4);
        s.push(char::from((tag >> 24) as u8));
        s.push(char::from(((tag >> 16) & 255) as u8));
        s.push(char::from(((tag >> 8) & 255) as u8));
        s.push(char::from((tag & 255) as u8));
        if s.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
            write!(f, "0x{:08x}", tag)
        } else {
            s.fmt(f)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

/// Marks a subtable that is not bound to any script, language or feature.
pub const TAG_UNDEF: u32 = 0xFFFF_FFFF;
/// Marks a lookup defined outside of any feature block.
///
/// Such lookups are only reachable through a reference from a feature or a contextual rule.
pub const TAG_STAND_ALONE: u32 = 0x0101_0101;

/// Returns `true` if `tag` names a real script, language or feature.
pub const fn is_bound(tag: u32) -> bool {
    tag != TAG_UNDEF && tag != TAG_STAND_ALONE
}

pub const AALT: u32 = tag!(b"aalt");
pub const ARAB: u32 = tag!(b"arab");
pub const CALT: u32 = tag!(b"calt");
pub const CCMP: u32 = tag!(b"ccmp");
pub const CYRL: u32 = tag!(b"cyrl");
pub const DEU: u32 = tag!(b"DEU ");
pub const DEVA: u32 = tag!(b"deva");
pub const DFLT: u32 = tag!(b"DFLT");
pub const DFLT_LANG: u32 = tag!(b"dflt");
pub const GPOS: u32 = tag!(b"GPOS");
pub const GREK: u32 = tag!(b"grek");
pub const GSUB: u32 = tag!(b"GSUB");
pub const KERN: u32 = tag!(b"kern");
pub const LATN: u32 = tag!(b"latn");
pub const LIGA: u32 = tag!(b"liga");
pub const LOCL: u32 = tag!(b"locl");
pub const MARK: u32 = tag!(b"mark");
pub const MKMK: u32 = tag!(b"mkmk");
pub const SIZE: u32 = tag!(b"size");
pub const SMCP: u32 = tag!(b"smcp");
pub const TRK: u32 = tag!(b"TRK ");
