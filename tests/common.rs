#![allow(dead_code)]

//! Decoding of the tables written by `OtlTable`, for checking the output structurally.

/// Big-endian reader over a written table.
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data }
    }

    pub fn u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }

    pub fn u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    pub fn u16_array(&self, offset: usize, count: usize) -> Vec<u16> {
        (0..count).map(|i| self.u16(offset + 2 * i)).collect()
    }
}

#[derive(Debug, PartialEq)]
pub struct LangSys {
    pub tag: u32,
    pub required_feature: u16,
    pub feature_indices: Vec<u16>,
}

#[derive(Debug, PartialEq)]
pub struct Script {
    pub tag: u32,
    pub default_langsys: Option<LangSys>,
    pub langsys: Vec<LangSys>,
}

#[derive(Debug, PartialEq)]
pub struct Feature {
    pub tag: u32,
    /// Absolute position of the parameter block, if any.
    pub params: Option<usize>,
    pub lookup_indices: Vec<u16>,
}

#[derive(Debug, PartialEq)]
pub struct Lookup {
    pub lookup_type: u16,
    pub lookup_flag: u16,
    /// Absolute positions of the subtables.
    pub subtables: Vec<usize>,
    pub mark_filtering_set: Option<u16>,
}

#[derive(Debug)]
pub struct Layout {
    pub version: u32,
    pub scripts: Vec<Script>,
    pub features: Vec<Feature>,
    pub lookups: Vec<Lookup>,
}

fn decode_langsys(reader: &Reader<'_>, tag: u32, at: usize) -> LangSys {
    assert_eq!(reader.u16(at), 0, "LookupOrder");
    let count = usize::from(reader.u16(at + 4));
    LangSys {
        tag,
        required_feature: reader.u16(at + 2),
        feature_indices: reader.u16_array(at + 6, count),
    }
}

pub fn decode_layout(data: &[u8]) -> Layout {
    let reader = Reader::new(data);
    let script_list = usize::from(reader.u16(4));
    let feature_list = usize::from(reader.u16(6));
    let lookup_list = usize::from(reader.u16(8));

    let scripts = (0..usize::from(reader.u16(script_list)))
        .map(|i| {
            let record = script_list + 2 + 6 * i;
            let script = script_list + usize::from(reader.u16(record + 4));
            let default_offset = usize::from(reader.u16(script));
            let langsys = (0..usize::from(reader.u16(script + 2)))
                .map(|j| {
                    let record = script + 4 + 6 * j;
                    let at = script + usize::from(reader.u16(record + 4));
                    decode_langsys(&reader, reader.u32(record), at)
                })
                .collect();
            Script {
                tag: reader.u32(record),
                default_langsys: (default_offset != 0).then(|| {
                    decode_langsys(&reader, u32::from_be_bytes(*b"dflt"), script + default_offset)
                }),
                langsys,
            }
        })
        .collect();

    let features = (0..usize::from(reader.u16(feature_list)))
        .map(|i| {
            let record = feature_list + 2 + 6 * i;
            let feature = feature_list + usize::from(reader.u16(record + 4));
            let params = usize::from(reader.u16(feature));
            Feature {
                tag: reader.u32(record),
                params: (params != 0).then(|| feature + params),
                lookup_indices: reader
                    .u16_array(feature + 4, usize::from(reader.u16(feature + 2))),
            }
        })
        .collect();

    let lookups = (0..usize::from(reader.u16(lookup_list)))
        .map(|i| {
            let lookup = lookup_list + usize::from(reader.u16(lookup_list + 2 + 2 * i));
            let lookup_flag = reader.u16(lookup + 2);
            let count = usize::from(reader.u16(lookup + 4));
            Lookup {
                lookup_type: reader.u16(lookup),
                lookup_flag,
                subtables: reader
                    .u16_array(lookup + 6, count)
                    .into_iter()
                    .map(|offset| lookup + usize::from(offset))
                    .collect(),
                mark_filtering_set: (lookup_flag & 0x10 != 0)
                    .then(|| reader.u16(lookup + 6 + 2 * count)),
            }
        })
        .collect();

    Layout {
        version: reader.u32(0),
        scripts,
        features,
        lookups,
    }
}

/// Glyphs listed by the Coverage table at `at`, in coverage index order.
pub fn decode_coverage(data: &[u8], at: usize) -> Vec<u16> {
    let reader = Reader::new(data);
    let count = usize::from(reader.u16(at + 2));
    match reader.u16(at) {
        1 => reader.u16_array(at + 4, count),
        2 => (0..count)
            .flat_map(|i| {
                let record = at + 4 + 6 * i;
                reader.u16(record)..=reader.u16(record + 2)
            })
            .collect(),
        format => panic!("invalid coverage format {}", format),
    }
}

/// (glyph, class) pairs of the Class Definition table at `at`, omitting class 0.
pub fn decode_class(data: &[u8], at: usize) -> Vec<(u16, u16)> {
    let reader = Reader::new(data);
    match reader.u16(at) {
        1 => {
            let start = reader.u16(at + 2);
            let count = usize::from(reader.u16(at + 4));
            reader
                .u16_array(at + 6, count)
                .into_iter()
                .zip(start..)
                .filter(|(class, _)| *class != 0)
                .map(|(class, glyph)| (glyph, class))
                .collect()
        }
        2 => {
            let count = usize::from(reader.u16(at + 2));
            (0..count)
                .flat_map(|i| {
                    let record = at + 4 + 6 * i;
                    let class = reader.u16(record + 4);
                    (reader.u16(record)..=reader.u16(record + 2)).map(move |glyph| (glyph, class))
                })
                .collect()
        }
        format => panic!("invalid class format {}", format),
    }
}
