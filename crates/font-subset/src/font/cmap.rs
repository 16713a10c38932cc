//! `cmap` table: mapping chars to glyph indices.

use super::Cursor;
use crate::{errors::ParseErrorKind, ParseError, TableTag};

#[derive(Debug)]
enum CmapTableFormat {
    /// Segment mapping to delta values (format 4).
    SegmentDeltas,
    /// Segmented coverage (format 12).
    SegmentedCoverage,
}

/// Reads the subtable format and checks that it's `expected`.
fn check_format(cursor: &mut Cursor<'_>, expected: u16) -> Result<(), ParseError> {
    cursor.read_u16_checked(|format| {
        if format == expected {
            Ok(())
        } else {
            Err(ParseErrorKind::UnexpectedTableFormat { format })
        }
    })
}

/// Restricts `cursor` to the subtable, given the subtable length and the number of header bytes
/// already read.
fn subtable_body(
    cursor: Cursor<'_>,
    subtable_len: usize,
    read_len: usize,
) -> Result<Cursor<'_>, ParseError> {
    let body_len = subtable_len
        .checked_sub(read_len)
        .ok_or_else(|| cursor.err(ParseErrorKind::UnexpectedEof))?;
    cursor.range(0..body_len)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentWithDelta {
    pub(crate) start_code: u16,
    pub(crate) end_code: u16,
    pub(crate) id_delta: u16,
    pub(crate) id_range_offset: u16,
}

/// Segment mapping to delta values (format 4) subtable of the `cmap` table.
#[derive(Debug, Clone)]
pub(crate) struct SegmentDeltas<'a> {
    pub(crate) segments: Vec<SegmentWithDelta>,
    pub(crate) glyph_id_array: &'a [u8],
}

impl<'a> SegmentDeltas<'a> {
    fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        check_format(&mut cursor, 4)?;
        let subtable_len = usize::from(cursor.read_u16()?);
        let mut cursor = subtable_body(cursor, subtable_len, 4)?;
        cursor.skip(2)?; // language
        let segment_count = usize::from(cursor.read_u16()? / 2);
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        // Columns follow each other; there's a reserved word after `endCode`.
        let mut end_codes = cursor.split_at(2 * segment_count)?;
        cursor.skip(2)?;
        let mut start_codes = cursor.split_at(2 * segment_count)?;
        let mut id_deltas = cursor.split_at(2 * segment_count)?;
        let mut id_range_offsets = cursor.split_at(2 * segment_count)?;

        let mut segments = Vec::with_capacity(segment_count);
        for _ in 0..segment_count {
            segments.push(SegmentWithDelta {
                start_code: start_codes.read_u16()?,
                end_code: end_codes.read_u16()?,
                id_delta: id_deltas.read_u16()?,
                id_range_offset: id_range_offsets.read_u16()?,
            });
        }
        Ok(Self {
            segments,
            glyph_id_array: cursor.bytes,
        })
    }

    fn map_char(&self, ch: char) -> Result<u16, ParseErrorKind> {
        // Format 4 only covers the Basic Multilingual Plane.
        let Ok(ch) = u16::try_from(u32::from(ch)) else {
            return Ok(0);
        };
        let segment_idx = self.segments.partition_point(|segment| segment.end_code < ch);
        let Some(segment) = self.segments.get(segment_idx) else {
            return Ok(0);
        };
        if segment.start_code > ch {
            return Ok(0);
        }
        if segment.id_range_offset == 0 {
            return Ok(segment.id_delta.wrapping_add(ch));
        }

        // `idRangeOffset` is a byte offset from its own position in the `idRangeOffset` column,
        // which ends right before `glyphIdArray`.
        let word_idx = (usize::from(segment.id_range_offset) / 2
            + usize::from(ch - segment.start_code))
        .checked_sub(self.segments.len() - segment_idx)
        .ok_or(ParseErrorKind::InvalidCmapOffset)?;
        let glyph_id = self
            .glyph_id_array
            .get(2 * word_idx..2 * word_idx + 2)
            .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
            .ok_or(ParseErrorKind::InvalidCmapOffset)?;
        Ok(if glyph_id == 0 {
            0
        } else {
            segment.id_delta.wrapping_add(glyph_id)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SequentialMapGroup {
    pub(crate) start_char_code: u32,
    pub(crate) end_char_code: u32,
    pub(crate) start_glyph_id: u32,
}

impl SequentialMapGroup {
    /// Maps `ch` assuming that it's within this group.
    pub(crate) fn map_unchecked(&self, ch: char) -> u32 {
        u32::from(ch) - self.start_char_code + self.start_glyph_id
    }
}

/// Segmented coverage (format 12) subtable of the `cmap` table.
#[derive(Debug, Default, Clone)]
pub(crate) struct SegmentedCoverage {
    pub(crate) groups: Vec<SequentialMapGroup>,
}

impl SegmentedCoverage {
    const GROUP_LEN: usize = 12;

    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        check_format(&mut cursor, 12)?;
        cursor.skip(2)?; // reserved
        let subtable_len = cursor.read_u32()? as usize;
        let mut cursor = subtable_body(cursor, subtable_len, 8)?;
        cursor.skip(4)?; // language
        let group_count = cursor.read_u32()? as usize;

        // Bounds-checked before allocating `groups`.
        let mut groups_cursor = cursor.split_at(group_count.saturating_mul(Self::GROUP_LEN))?;
        let mut groups = Vec::with_capacity(group_count);
        for _ in 0..group_count {
            groups.push(SequentialMapGroup {
                start_char_code: groups_cursor.read_u32()?,
                end_char_code: groups_cursor.read_u32()?,
                start_glyph_id: groups_cursor.read_u32()?,
            });
        }
        Ok(Self { groups })
    }

    fn map_char(&self, ch: char) -> u16 {
        let group_idx = self
            .groups
            .partition_point(|group| group.end_char_code < u32::from(ch));
        match self.groups.get(group_idx) {
            Some(group) if group.start_char_code <= u32::from(ch) => {
                // Glyph IDs beyond `u16::MAX` cannot refer to an actual glyph.
                u16::try_from(group.map_unchecked(ch)).unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CmapTable<'a> {
    Deltas(SegmentDeltas<'a>),
    Coverage(SegmentedCoverage),
}

impl<'a> CmapTable<'a> {
    pub(crate) const UNICODE_PLATFORM: u16 = 0;
    const WINDOWS_PLATFORM: u16 = 3;

    pub(crate) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let table_cursor = cursor;
        cursor.read_u16_checked(|version| {
            if version != 0 {
                return Err(ParseErrorKind::UnexpectedTableVersion {
                    version: version.into(),
                });
            }
            Ok(())
        })?;

        let num_tables = cursor.read_u16()?;
        let mut this = None;
        for _ in 0..num_tables {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let offset = cursor.read_u32()?;
            let expected_table_format = match (platform_id, encoding_id) {
                (Self::UNICODE_PLATFORM, 3) | (Self::WINDOWS_PLATFORM, 1) => {
                    CmapTableFormat::SegmentDeltas
                }
                (Self::UNICODE_PLATFORM, 4) | (Self::WINDOWS_PLATFORM, 10) => {
                    CmapTableFormat::SegmentedCoverage
                }
                _ => continue, // unsupported table format
            };

            let mut subtable = table_cursor;
            subtable.skip(offset as usize)?;
            match expected_table_format {
                // Segmented coverage spans all Unicode planes, so it takes priority over deltas.
                CmapTableFormat::SegmentedCoverage
                    if !matches!(this, Some(Self::Coverage(_))) =>
                {
                    this = Some(Self::Coverage(SegmentedCoverage::parse(subtable)?));
                }
                CmapTableFormat::SegmentDeltas if this.is_none() => {
                    this = Some(Self::Deltas(SegmentDeltas::parse(subtable)?));
                }
                _ => { /* We've already got a better table; do nothing */ }
            }
        }

        this.ok_or_else(|| cursor.err(ParseErrorKind::NoSupportedCmap))
    }

    pub(crate) fn map_char(&self, ch: char) -> Result<u16, ParseError> {
        match self {
            Self::Deltas(deltas) => deltas.map_char(ch).map_err(|kind| ParseError {
                kind,
                offset: 0,
                table: Some(TableTag::CMAP),
            }),
            Self::Coverage(coverage) => Ok(coverage.map_char(ch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16s(buffer: &mut Vec<u8>, values: &[u16]) {
        for value in values {
            buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn wrap_subtable(platform_id: u16, encoding_id: u16, subtable: &[u8]) -> Vec<u8> {
        let mut table = vec![];
        push_u16s(&mut table, &[0, 1, platform_id, encoding_id, 0, 12]);
        table.extend_from_slice(subtable);
        table
    }

    #[test]
    fn mapping_chars_via_glyph_id_array() {
        let mut subtable = vec![];
        push_u16s(&mut subtable, &[4, 38, 0, 4, 4, 1, 0]); // header
        push_u16s(&mut subtable, &[0x43, 0xffff, 0]); // end codes + padding
        push_u16s(&mut subtable, &[0x41, 0xffff]); // start codes
        push_u16s(&mut subtable, &[0, 1]); // ID deltas
        push_u16s(&mut subtable, &[4, 0]); // ID range offsets
        push_u16s(&mut subtable, &[5, 0, 7]); // glyph ID array
        let table = wrap_subtable(3, 1, &subtable);

        let cmap = CmapTable::parse(Cursor::new(&table)).unwrap();
        assert!(matches!(cmap, CmapTable::Deltas(_)));
        assert_eq!(cmap.map_char('A').unwrap(), 5);
        assert_eq!(cmap.map_char('B').unwrap(), 0);
        assert_eq!(cmap.map_char('C').unwrap(), 7);
        assert_eq!(cmap.map_char('D').unwrap(), 0);
        assert_eq!(cmap.map_char('@').unwrap(), 0);
        assert_eq!(cmap.map_char('\u{1f600}').unwrap(), 0);
    }

    #[test]
    fn mapping_chars_via_segmented_coverage() {
        let mut subtable = vec![];
        push_u16s(&mut subtable, &[12, 0, 0, 40, 0, 0, 0, 2]); // header
        push_u16s(&mut subtable, &[0, 0x41, 0, 0x5a, 0, 1]);
        push_u16s(&mut subtable, &[1, 0xf600, 1, 0xf601, 0, 30]);
        let table = wrap_subtable(3, 10, &subtable);

        let cmap = CmapTable::parse(Cursor::new(&table)).unwrap();
        assert!(matches!(cmap, CmapTable::Coverage(_)));
        assert_eq!(cmap.map_char('A').unwrap(), 1);
        assert_eq!(cmap.map_char('Z').unwrap(), 26);
        assert_eq!(cmap.map_char('a').unwrap(), 0);
        assert_eq!(cmap.map_char('\u{1f601}').unwrap(), 31);
        assert_eq!(cmap.map_char('\u{1f602}').unwrap(), 0);
    }

    #[test]
    fn unsupported_cmap_is_rejected() {
        let table = wrap_subtable(1, 0, &[0; 8]);
        let err = CmapTable::parse(Cursor::new(&table)).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::NoSupportedCmap));
    }
}
