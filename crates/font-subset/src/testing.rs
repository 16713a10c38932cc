//! Synthetic TrueType fonts for testing.
//!
//! Fonts produced by [`FontBuilder`] contain all tables necessary for subsetting, but their glyph
//! outlines are placeholder triangles.

use std::collections::BTreeMap;

use crate::{
    font::{CmapTable, LocaTable, NameId},
    write::{write_head_table, FontWriter},
    TableTag,
};

#[derive(Debug, Clone)]
enum TestGlyph {
    Simple,
    Composite(Vec<u16>),
}

/// Builder of synthetic TrueType fonts.
///
/// Glyphs are assigned indices in the order chars are added; `.notdef` always has index 0.
#[derive(Debug, Clone)]
pub struct FontBuilder {
    names: BTreeMap<NameId, String>,
    /// Glyphs excluding `.notdef`.
    glyphs: Vec<TestGlyph>,
    char_map: BTreeMap<char, u16>,
    /// Components of `.notdef`; if empty, `.notdef` is a simple glyph.
    notdef_components: Vec<u16>,
    hinting: bool,
}

impl FontBuilder {
    const UNITS_PER_EM: u16 = 1_000;
    const ADVANCE: u16 = 600;

    /// Creates a builder for a font with the specified family and subfamily names.
    pub fn new(family: &str, subfamily: &str) -> Self {
        Self {
            names: BTreeMap::from([
                (NameId::FAMILY, family.to_owned()),
                (NameId::SUBFAMILY, subfamily.to_owned()),
            ]),
            glyphs: vec![],
            char_map: BTreeMap::new(),
            notdef_components: vec![],
            hinting: false,
        }
    }

    /// Sets or overrides a string in the `name` table.
    #[must_use]
    pub fn with_name(mut self, id: NameId, value: &str) -> Self {
        self.names.insert(id, value.to_owned());
        self
    }

    /// Removes a string from the `name` table.
    #[must_use]
    pub fn without_name(mut self, id: NameId) -> Self {
        self.names.remove(&id);
        self
    }

    /// Adds a simple glyph for each of the specified chars. Chars that already have a glyph are skipped.
    #[must_use]
    pub fn with_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        for ch in chars {
            self.ensure_simple_glyph(ch);
        }
        self
    }

    /// Adds a composite glyph for `ch` consisting of glyphs for `components`. Components
    /// without a glyph get a simple glyph.
    ///
    /// # Panics
    ///
    /// Panics if `ch` already has a glyph.
    #[must_use]
    pub fn with_composite(mut self, ch: char, components: &[char]) -> Self {
        assert!(
            !self.char_map.contains_key(&ch),
            "{ch:?} already has a glyph"
        );
        let components = components
            .iter()
            .map(|&component| self.ensure_simple_glyph(component))
            .collect();
        self.glyphs.push(TestGlyph::Composite(components));
        let glyph_idx = self.last_glyph_idx();
        self.char_map.insert(ch, glyph_idx);
        self
    }

    /// Makes `.notdef` a composite glyph consisting of glyphs for `components`. Components
    /// without a glyph get a simple glyph.
    #[must_use]
    pub fn with_composite_notdef(mut self, components: &[char]) -> Self {
        self.notdef_components = components
            .iter()
            .map(|&component| self.ensure_simple_glyph(component))
            .collect();
        self
    }

    /// Adds hinting tables (`cvt `, `fpgm` and `prep`).
    #[must_use]
    pub fn with_hinting(mut self) -> Self {
        self.hinting = true;
        self
    }

    fn last_glyph_idx(&self) -> u16 {
        u16::try_from(self.glyphs.len()).expect("too many glyphs")
    }

    fn ensure_simple_glyph(&mut self, ch: char) -> u16 {
        if let Some(&glyph_idx) = self.char_map.get(&ch) {
            return glyph_idx;
        }
        self.glyphs.push(TestGlyph::Simple);
        let glyph_idx = self.last_glyph_idx();
        self.char_map.insert(ch, glyph_idx);
        glyph_idx
    }

    fn glyph_count(&self) -> u16 {
        self.last_glyph_idx() + 1
    }

    fn write_simple_glyph(seed: u16, buffer: &mut Vec<u8>) {
        let width = 100 + seed % 400;
        // numberOfContours, bounding box, endPtsOfContours, instructionLength
        let words = [1, 0, 0, width, 700, 2, 0];
        for word in words {
            buffer.extend_from_slice(&word.to_be_bytes());
        }
        buffer.extend_from_slice(&[1, 1, 1]); // on-curve point flags
        // x deltas, then y deltas
        for coordinate in [0, width / 2, width / 2, 0, 700, 0] {
            buffer.extend_from_slice(&coordinate.to_be_bytes());
        }
        buffer.push(0); // padding
    }

    fn write_composite_glyph(components: &[u16], buffer: &mut Vec<u8>) {
        const ARGS_ARE_XY_VALUES: u16 = 0x0002;
        const MORE_COMPONENTS: u16 = 0x0020;

        for word in [u16::MAX, 0, 0, Self::ADVANCE, 700] {
            buffer.extend_from_slice(&word.to_be_bytes());
        }
        for (i, &glyph_idx) in components.iter().enumerate() {
            let mut flags = ARGS_ARE_XY_VALUES;
            if i + 1 < components.len() {
                flags |= MORE_COMPONENTS;
            }
            buffer.extend_from_slice(&flags.to_be_bytes());
            buffer.extend_from_slice(&glyph_idx.to_be_bytes());
            buffer.extend_from_slice(&[0, 0]); // x and y offsets
        }
    }

    fn write_names(&self, buffer: &mut Vec<u8>) {
        const RECORD_LEN: usize = 12;

        let count = u16::try_from(self.names.len()).expect("too many names");
        let storage_offset = 6 + RECORD_LEN * self.names.len();
        buffer.extend_from_slice(&0_u16.to_be_bytes()); // format
        buffer.extend_from_slice(&count.to_be_bytes());
        buffer.extend_from_slice(&u16::try_from(storage_offset).expect("too many names").to_be_bytes());

        let mut storage = Vec::new();
        for (id, value) in &self.names {
            let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
            let record = [
                3,     // Windows platform
                1,     // Unicode BMP encoding
                0x409, // English (US)
                id.0,
                u16::try_from(encoded.len()).expect("name is too long"),
                u16::try_from(storage.len()).expect("names are too long"),
            ];
            for word in record {
                buffer.extend_from_slice(&word.to_be_bytes());
            }
            storage.extend_from_slice(&encoded);
        }
        buffer.extend_from_slice(&storage);
    }

    fn write_head(buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&0x_0001_0000_u32.to_be_bytes()); // version
        buffer.extend_from_slice(&0x_0001_0000_u32.to_be_bytes()); // fontRevision
        buffer.extend_from_slice(&0_u32.to_be_bytes()); // checksumAdjustment
        buffer.extend_from_slice(&0x_5f0f_3cf5_u32.to_be_bytes()); // magicNumber
        buffer.extend_from_slice(&0x_000b_u16.to_be_bytes()); // flags
        buffer.extend_from_slice(&Self::UNITS_PER_EM.to_be_bytes());
        buffer.extend_from_slice(&[0; 16]); // created, modified
        for word in [0, 0, Self::ADVANCE, 700] {
            buffer.extend_from_slice(&u16::to_be_bytes(word)); // bounding box
        }
        buffer.extend_from_slice(&0_u16.to_be_bytes()); // macStyle
        buffer.extend_from_slice(&8_u16.to_be_bytes()); // lowestRecPPEM
        buffer.extend_from_slice(&2_u16.to_be_bytes()); // fontDirectionHint
        buffer.extend_from_slice(&0_u16.to_be_bytes()); // indexToLocFormat, patched later
        buffer.extend_from_slice(&0_u16.to_be_bytes()); // glyphDataFormat
    }

    fn write_hhea(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&0x_0001_0000_u32.to_be_bytes());
        // ascender, descender (-200), lineGap, advanceWidthMax, minLeftSideBearing,
        // minRightSideBearing, xMaxExtent, caretSlopeRise, caretSlopeRun, caretOffset
        let words = [800, 0xff38, 0, Self::ADVANCE, 0, 0, Self::ADVANCE, 1, 0, 0];
        let reserved_and_format = [0; 5];
        for word in words.into_iter().chain(reserved_and_format) {
            buffer.extend_from_slice(&u16::to_be_bytes(word));
        }
        buffer.extend_from_slice(&self.glyph_count().to_be_bytes()); // numberOfHMetrics
    }

    /// Builds the font in the TrueType format.
    pub fn build(&self) -> Vec<u8> {
        let mut glyf = vec![];
        let mut locations = vec![0];
        if self.notdef_components.is_empty() {
            Self::write_simple_glyph(0, &mut glyf);
        } else {
            Self::write_composite_glyph(&self.notdef_components, &mut glyf);
        }
        locations.push(glyf.len());
        for (i, glyph) in self.glyphs.iter().enumerate() {
            match glyph {
                TestGlyph::Simple => {
                    let seed = u16::try_from(i + 1).expect("too many glyphs");
                    Self::write_simple_glyph(seed, &mut glyf);
                }
                TestGlyph::Composite(components) => {
                    Self::write_composite_glyph(components, &mut glyf);
                }
            }
            locations.push(glyf.len());
        }
        let mut loca = vec![];
        let loca_format = LocaTable::write(&locations, &mut loca);

        let mut head_template = vec![];
        Self::write_head(&mut head_template);
        let char_map: Vec<_> = self.char_map.iter().map(|(&ch, &idx)| (ch, idx)).collect();
        let cmap = CmapTable::from_map(&char_map);

        let mut writer = FontWriter::default();
        writer.write_table(TableTag::HEAD, |buffer| {
            write_head_table(&head_template, loca_format, buffer);
        });
        writer.write_table(TableTag::HHEA, |buffer| self.write_hhea(buffer));
        writer.write_table(TableTag::MAXP, |buffer| {
            buffer.extend_from_slice(&0x_0000_5000_u32.to_be_bytes());
            buffer.extend_from_slice(&self.glyph_count().to_be_bytes());
        });
        writer.write_table(TableTag::OS2, |buffer| {
            buffer.extend_from_slice(&4_u16.to_be_bytes()); // version
            buffer.extend_from_slice(&[0; 94]);
        });
        writer.write_table(TableTag::HMTX, |buffer| {
            for _ in 0..self.glyph_count() {
                buffer.extend_from_slice(&Self::ADVANCE.to_be_bytes());
                buffer.extend_from_slice(&0_u16.to_be_bytes()); // lsb
            }
        });
        if self.hinting {
            writer.write_raw_table(TableTag::CVT, &[0, 10, 0, 20]);
            writer.write_raw_table(TableTag::FPGM, &[0xb0, 0x00, 0x2c]);
            writer.write_raw_table(TableTag::PREP, &[0xb8, 0x01, 0xff, 0x85]);
        }
        writer.write_table(TableTag::CMAP, |buffer| cmap.write(buffer));
        writer.write_raw_table(TableTag::LOCA, &loca);
        writer.write_raw_table(TableTag::GLYF, &glyf);
        writer.write_table(TableTag::NAME, |buffer| self.write_names(buffer));
        writer.write_table(TableTag::POST, |buffer| {
            buffer.extend_from_slice(&0x_0003_0000_u32.to_be_bytes());
            buffer.extend_from_slice(&[0; 28]);
        });
        writer.into_opentype()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Font, NameTable};

    #[test]
    fn built_font_can_be_parsed() {
        let bytes = FontBuilder::new("Example Sans", "Bold")
            .with_chars('a'..='z')
            .with_composite('ä', &['a', '\u{308}'])
            .with_hinting()
            .build();
        let font = Font::new(&bytes).unwrap();
        // .notdef + 26 letters + combining diaeresis + composite
        assert_eq!(font.glyph_count(), 29);
        assert_eq!(font.map_char('a').unwrap(), 1);
        assert_eq!(font.map_char('ä').unwrap(), 28);
        assert_eq!(font.map_char('A').unwrap(), 0);
        assert!(font.cvt.is_some() && font.fpgm.is_some() && font.prep.is_some());

        let names = NameTable::from_font_data(&bytes).unwrap();
        assert_eq!(names.family().unwrap(), "Example Sans");
        assert_eq!(names.subfamily().unwrap(), "Bold");
    }

    #[test]
    fn removing_names() {
        let bytes = FontBuilder::new("Example Sans", "Regular")
            .without_name(NameId::FAMILY)
            .with_chars(['A'])
            .build();
        let names = Font::new(&bytes).unwrap().names().unwrap();
        assert_eq!(names.family(), None);
        assert_eq!(names.subfamily().unwrap(), "Regular");
    }
}
