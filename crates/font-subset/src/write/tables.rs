//! Serialization of individual font tables.

use core::mem;

use super::{write_u16, write_u32, SearchParams};
use crate::{
    font::{
        CmapTable, Glyph, GlyphWithMetrics, HheaTable, HmtxTable, LocaFormat, LocaTable,
        SegmentDeltas, SegmentWithDelta, SegmentedCoverage, SequentialMapGroup,
    },
    Font,
};

impl CmapTable<'static> {
    /// Creates a `cmap` table from the char map sorted by chars. Format 4 is used if all chars
    /// are in the Basic Multilingual Plane and the subtable length fits into `u16`; otherwise,
    /// format 12 is used.
    pub(crate) fn from_map(map: &[(char, u16)]) -> Self {
        let coverage = SegmentedCoverage::from_map(map);
        let fits_in_bmp = map
            .last()
            .is_none_or(|&(ch, _)| u32::from(ch) < u32::from(u16::MAX));
        // +1 for the terminating segment
        let deltas_len = SegmentDeltas::subtable_len_for(coverage.groups.len() + 1, 0);
        if fits_in_bmp && deltas_len <= usize::from(u16::MAX) {
            Self::Deltas(SegmentDeltas::from_groups(&coverage.groups))
        } else {
            Self::Coverage(coverage)
        }
    }
}

impl CmapTable<'_> {
    pub(crate) fn write(&self, writer: &mut Vec<u8>) {
        write_u16(writer, 0); // version
        write_u16(writer, 1); // numTables

        let (encoding_id, subtable_len) = match self {
            Self::Deltas(deltas) => (3, deltas.subtable_len()),
            Self::Coverage(coverage) => (4, coverage.subtable_len()),
        };
        write_u16(writer, CmapTable::UNICODE_PLATFORM);
        write_u16(writer, encoding_id);
        write_u32(writer, 12); // subtable offset

        let start = writer.len();
        match self {
            Self::Deltas(deltas) => deltas.write(writer),
            Self::Coverage(coverage) => coverage.write(writer),
        }
        debug_assert_eq!(writer.len() - start, subtable_len);
    }
}

impl SegmentDeltas<'static> {
    #[allow(clippy::cast_possible_truncation)] // all groups are within the BMP
    fn from_groups(groups: &[SequentialMapGroup]) -> Self {
        let segments = groups.iter().map(|group| {
            let start_code = group.start_char_code as u16;
            SegmentWithDelta {
                start_code,
                end_code: group.end_char_code as u16,
                id_delta: (group.start_glyph_id as u16).wrapping_sub(start_code),
                id_range_offset: 0,
            }
        });
        // The last segment must map 0xffff; with this delta, it is mapped to the missing glyph.
        let terminator = SegmentWithDelta {
            start_code: u16::MAX,
            end_code: u16::MAX,
            id_delta: 1,
            id_range_offset: 0,
        };
        Self {
            segments: segments.chain([terminator]).collect(),
            glyph_id_array: &[],
        }
    }
}

impl SegmentDeltas<'_> {
    fn subtable_len_for(segment_count: usize, glyph_id_array_len: usize) -> usize {
        16 + 8 * segment_count + glyph_id_array_len
    }

    fn subtable_len(&self) -> usize {
        Self::subtable_len_for(self.segments.len(), self.glyph_id_array.len())
    }

    fn write(&self, writer: &mut Vec<u8>) {
        let subtable_len = u16::try_from(self.subtable_len()).expect("`cmap` subtable is too long");
        let segment_count = u16::try_from(self.segments.len()).expect("too many `cmap` segments");
        let search = SearchParams::new(segment_count, 2);

        write_u16(writer, 4); // format
        write_u16(writer, subtable_len);
        write_u16(writer, 0); // language
        write_u16(writer, 2 * segment_count);
        search.write(writer);

        let columns: [fn(&SegmentWithDelta) -> u16; 4] = [
            |segment| segment.end_code,
            |segment| segment.start_code,
            |segment| segment.id_delta,
            |segment| segment.id_range_offset,
        ];
        for (i, column) in columns.into_iter().enumerate() {
            if i == 1 {
                write_u16(writer, 0); // reservedPad between end and start codes
            }
            for segment in &self.segments {
                write_u16(writer, column(segment));
            }
        }
        writer.extend_from_slice(self.glyph_id_array);
    }
}

impl SegmentedCoverage {
    /// Groups consecutive chars mapped to consecutive glyphs.
    fn from_map(map: &[(char, u16)]) -> Self {
        let mut groups = vec![];
        let [(first_char, first_idx), rest @ ..] = map else {
            return Self::default();
        };
        let mut current = SequentialMapGroup {
            start_char_code: (*first_char).into(),
            end_char_code: (*first_char).into(),
            start_glyph_id: (*first_idx).into(),
        };

        for &(ch, glyph_idx) in rest {
            let extends_current = u32::from(ch) == current.end_char_code + 1
                && u32::from(glyph_idx) == current.map_unchecked(ch);
            if extends_current {
                current.end_char_code += 1;
            } else {
                let next = SequentialMapGroup {
                    start_char_code: ch.into(),
                    end_char_code: ch.into(),
                    start_glyph_id: glyph_idx.into(),
                };
                groups.push(mem::replace(&mut current, next));
            }
        }
        groups.push(current);
        Self { groups }
    }

    fn subtable_len(&self) -> usize {
        16 + 12 * self.groups.len()
    }

    fn write(&self, writer: &mut Vec<u8>) {
        let subtable_len = u32::try_from(self.subtable_len()).expect("`cmap` subtable is too long");
        let group_count = u32::try_from(self.groups.len()).expect("too many `cmap` groups");

        write_u16(writer, 12); // format
        write_u16(writer, 0); // reserved
        write_u32(writer, subtable_len);
        write_u32(writer, 0); // language
        write_u32(writer, group_count);
        for group in &self.groups {
            write_u32(writer, group.start_char_code);
            write_u32(writer, group.end_char_code);
            write_u32(writer, group.start_glyph_id);
        }
    }
}

/// Copies the `head` table, zeroing `checksumAdjustment` and patching `indexToLocFormat`.
pub(crate) fn write_head_table(original: &[u8], loca_format: LocaFormat, writer: &mut Vec<u8>) {
    const BETWEEN_LEN: usize = Font::HEAD_LOCA_FORMAT_OFFSET - Font::HEAD_CHECKSUM_OFFSET - 4;

    let (before_checksum, rest) = original.split_at(Font::HEAD_CHECKSUM_OFFSET);
    let (_, rest) = rest.split_at(4);
    let (before_loca_format, rest) = rest.split_at(BETWEEN_LEN);
    let (_, after_loca_format) = rest.split_at(2);

    writer.extend_from_slice(before_checksum);
    write_u32(writer, 0); // adjusted once all tables are written
    writer.extend_from_slice(before_loca_format);
    write_u16(writer, loca_format as u16);
    writer.extend_from_slice(after_loca_format);
}

impl HmtxTable<'_> {
    /// Writes metrics for `glyphs`, omitting trailing advances equal to the last long metric.
    /// Returns `numberOfHMetrics` for the `hhea` table.
    pub(crate) fn write_for_glyphs(glyphs: &[GlyphWithMetrics<'_>], writer: &mut Vec<u8>) -> u16 {
        let mut long_metrics_count = glyphs.len();
        while let Some([prev, current]) = glyphs[..long_metrics_count].last_chunk::<2>() {
            if prev.advance != current.advance {
                break;
            }
            long_metrics_count -= 1;
        }

        let (long_metrics, short_metrics) = glyphs.split_at(long_metrics_count);
        for glyph in long_metrics {
            write_u16(writer, glyph.advance);
            write_u16(writer, glyph.lsb);
        }
        for glyph in short_metrics {
            write_u16(writer, glyph.lsb);
        }

        // The number of glyphs doesn't exceed `u16::MAX`
        u16::try_from(long_metrics_count).expect("too many glyphs")
    }
}

impl HheaTable<'_> {
    pub(crate) fn write(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.raw[..Self::EXPECTED_LEN - 2]);
        write_u16(writer, self.number_of_h_metrics);
    }
}

impl LocaTable<'_> {
    /// Writes glyph `locations` (which include the end of the last glyph) choosing
    /// the most compact format.
    pub(crate) fn write(locations: &[usize], writer: &mut Vec<u8>) -> LocaFormat {
        let fits_short = locations
            .iter()
            .all(|&loc| loc % 2 == 0 && loc / 2 <= usize::from(u16::MAX));
        if fits_short {
            for &loc in locations {
                #[allow(clippy::cast_possible_truncation)] // checked above
                write_u16(writer, (loc / 2) as u16);
            }
            LocaFormat::Short
        } else {
            for &loc in locations {
                write_u32(writer, u32::try_from(loc).expect("glyph location overflow"));
            }
            LocaFormat::Long
        }
    }
}

impl Glyph<'_> {
    pub(crate) fn write(&self, writer: &mut Vec<u8>) {
        match self {
            Self::Empty => {}
            Self::Simple(bytes) => writer.extend_from_slice(bytes),
            Self::Composite {
                bbox,
                components,
                instructions,
            } => {
                write_u16(writer, u16::MAX); // numberOfContours = -1
                writer.extend_from_slice(bbox);
                for component in components {
                    write_u16(writer, component.flags);
                    write_u16(writer, component.glyph_idx);
                    writer.extend_from_slice(component.tail);
                }
                writer.extend_from_slice(instructions);
            }
        }
    }
}
