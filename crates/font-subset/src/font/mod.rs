//! OpenType parsing logic.

use core::{fmt, ops};

pub(crate) use self::{
    cmap::{CmapTable, SegmentDeltas, SegmentWithDelta, SegmentedCoverage, SequentialMapGroup},
    glyph::{Glyph, GlyphWithMetrics},
};
pub use self::name::{NameId, NameTable};
use crate::errors::{ParseError, ParseErrorKind};

mod cmap;
mod glyph;
mod name;

/// Tag of an OpenType table, such as `cmap` or `glyf`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableTag(pub(crate) [u8; 4]);

impl fmt::Debug for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "TableTag({self})")
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            let ch = if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                char::REPLACEMENT_CHARACTER
            };
            fmt::Write::write_char(formatter, ch)?;
        }
        Ok(())
    }
}

impl TableTag {
    /// Character to glyph mapping.
    pub const CMAP: Self = Self(*b"cmap");
    /// Font header.
    pub const HEAD: Self = Self(*b"head");
    /// Horizontal header.
    pub const HHEA: Self = Self(*b"hhea");
    /// Horizontal metrics.
    pub const HMTX: Self = Self(*b"hmtx");
    /// Maximum profile.
    pub const MAXP: Self = Self(*b"maxp");
    /// Naming table.
    pub const NAME: Self = Self(*b"name");
    /// OS/2 and Windows-specific metrics.
    pub const OS2: Self = Self(*b"OS/2");
    /// PostScript information.
    pub const POST: Self = Self(*b"post");
    /// Index to location.
    pub const LOCA: Self = Self(*b"loca");
    /// Glyph data.
    pub const GLYF: Self = Self(*b"glyf");
    /// Control value table.
    pub const CVT: Self = Self(*b"cvt ");
    /// Font program.
    pub const FPGM: Self = Self(*b"fpgm");
    /// Control value program.
    pub const PREP: Self = Self(*b"prep");

    /// Returns the raw bytes of this tag.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// Read-only view into font data that keeps track of its position for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    pub(crate) bytes: &'a [u8],
    offset: usize,
    table: Option<TableTag>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            table: None,
        }
    }

    fn for_table(bytes: &'a [u8], tag: TableTag) -> Self {
        Self {
            bytes,
            offset: 0,
            table: Some(tag),
        }
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.offset,
            table: self.table,
        }
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        self.split_at(len).map(drop)
    }

    /// Splits off the first `len` bytes, advancing this cursor past them.
    pub(crate) fn split_at(&mut self, len: usize) -> Result<Self, ParseError> {
        if self.bytes.len() < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        let (head, tail) = self.bytes.split_at(len);
        let head = Self {
            bytes: head,
            ..*self
        };
        self.bytes = tail;
        self.offset += len;
        Ok(head)
    }

    pub(crate) fn range(self, range: ops::Range<usize>) -> Result<Self, ParseError> {
        let bytes = self.bytes.get(range.clone()).ok_or_else(|| {
            self.err(ParseErrorKind::RangeOutOfBounds {
                range: range.clone(),
                len: self.bytes.len(),
            })
        })?;
        Ok(Self {
            bytes,
            offset: self.offset + range.start,
            table: self.table,
        })
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let head = self.split_at(N)?;
        let mut array = [0_u8; N];
        array.copy_from_slice(head.bytes);
        Ok(array)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_byte_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_byte_array().map(u32::from_be_bytes)
    }

    /// Reads a `u16` and checks it; errors returned by `check` are attributed to the start of the value.
    pub(crate) fn read_u16_checked<T>(
        &mut self,
        check: impl FnOnce(u16) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let start = *self;
        let value = self.read_u16()?;
        check(value).map_err(|kind| start.err(kind))
    }

    pub(crate) fn read_u32_checked<T>(
        &mut self,
        check: impl FnOnce(u32) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let start = *self;
        let value = self.read_u32()?;
        check(value).map_err(|kind| start.err(kind))
    }
}

/// Table directory at the start of an OpenType font.
#[derive(Debug)]
pub(crate) struct TableDirectory<'a> {
    tables: Vec<(TableTag, Cursor<'a>)>,
}

impl<'a> TableDirectory<'a> {
    pub(crate) fn parse(font_bytes: &'a [u8]) -> Result<Self, ParseError> {
        let font_cursor = Cursor::new(font_bytes);
        let mut cursor = font_cursor;
        cursor.read_u32_checked(|version| {
            if version == Font::SFNT_VERSION || version == Font::APPLE_SFNT_VERSION {
                Ok(())
            } else {
                Err(ParseErrorKind::UnexpectedFontVersion(version))
            }
        })?;
        let table_count = cursor.read_u16()?;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let mut tables = Vec::with_capacity(table_count.into());
        for _ in 0..table_count {
            let tag = TableTag(cursor.read_byte_array()?);
            cursor.skip(4)?; // checksum
            let offset = cursor.read_u32()? as usize;
            let len = cursor.read_u32()? as usize;
            let table = font_cursor.range(offset..offset.saturating_add(len))?;
            tables.push((tag, Cursor::for_table(table.bytes, tag)));
        }
        Ok(Self { tables })
    }

    pub(crate) fn table(&self, tag: TableTag) -> Option<Cursor<'a>> {
        self.tables
            .iter()
            .find_map(|(table_tag, cursor)| (*table_tag == tag).then_some(*cursor))
    }

    pub(crate) fn required_table(&self, tag: TableTag) -> Result<Cursor<'a>, ParseError> {
        self.table(tag).ok_or_else(|| ParseError::missing_table(tag))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HheaTable<'a> {
    pub(crate) raw: &'a [u8],
    pub(crate) number_of_h_metrics: u16,
}

impl<'a> HheaTable<'a> {
    pub(crate) const EXPECTED_LEN: usize = 36; // 18 words

    fn parse(cursor: Cursor<'a>) -> Result<Self, ParseError> {
        if cursor.bytes.len() != Self::EXPECTED_LEN {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected: Self::EXPECTED_LEN,
                actual: cursor.bytes.len(),
            }));
        }
        let mut tail = cursor.range(Self::EXPECTED_LEN - 2..Self::EXPECTED_LEN)?;
        Ok(Self {
            raw: cursor.bytes,
            number_of_h_metrics: tail.read_u16()?,
        })
    }
}

#[derive(Debug)]
pub(crate) struct HmtxTable<'a> {
    cursor: Cursor<'a>,
    number_of_h_metrics: u16,
}

impl HmtxTable<'_> {
    fn advance_and_lsb(&self, glyph_idx: u16) -> Result<(u16, u16), ParseError> {
        let long_metrics_len = usize::from(self.number_of_h_metrics) * 4;
        if glyph_idx < self.number_of_h_metrics {
            let mut cursor = self.cursor;
            cursor.skip(usize::from(glyph_idx) * 4)?;
            Ok((cursor.read_u16()?, cursor.read_u16()?))
        } else {
            // Glyphs after the last long metric share its advance.
            let mut cursor = self.cursor;
            cursor.skip(long_metrics_len.saturating_sub(4))?;
            let advance = cursor.read_u16()?;

            let mut cursor = self.cursor;
            cursor.skip(long_metrics_len + usize::from(glyph_idx - self.number_of_h_metrics) * 2)?;
            Ok((advance, cursor.read_u16()?))
        }
    }
}

/// Values correspond to `indexToLocFormat` in the `head` table.
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
pub(crate) enum LocaFormat {
    Short = 0,
    Long = 1,
}

impl LocaFormat {
    const fn bytes_per_offset(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LocaTable<'a> {
    format: LocaFormat,
    cursor: Cursor<'a>,
}

impl<'a> LocaTable<'a> {
    fn new(format: LocaFormat, glyph_count: u16, cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let expected = format.bytes_per_offset() * (usize::from(glyph_count) + 1);
        if cursor.bytes.len() == expected {
            Ok(Self { format, cursor })
        } else {
            Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected,
                actual: cursor.bytes.len(),
            }))
        }
    }

    fn glyph_count(&self) -> usize {
        self.cursor.bytes.len() / self.format.bytes_per_offset() - 1
    }

    fn glyph_range(&self, glyph_idx: u16) -> Result<ops::Range<usize>, ParseError> {
        let mut cursor = self.cursor;
        let glyph_idx = usize::from(glyph_idx);
        Ok(match self.format {
            LocaFormat::Short => {
                cursor.skip(glyph_idx * 2)?;
                let start_offset = usize::from(cursor.read_u16()?) * 2;
                let end_offset = usize::from(cursor.read_u16()?) * 2;
                start_offset..end_offset
            }
            LocaFormat::Long => {
                cursor.skip(glyph_idx * 4)?;
                let start_offset = cursor.read_u32()? as usize;
                let end_offset = cursor.read_u32()? as usize;
                start_offset..end_offset
            }
        })
    }
}

/// OpenType font with TrueType outlines.
///
/// Only the tables necessary to produce a subset are parsed; all other tables are ignored.
#[derive(Debug)]
pub struct Font<'a> {
    pub(crate) cmap: CmapTable<'a>,
    pub(crate) head: &'a [u8],
    pub(crate) hhea: HheaTable<'a>,
    pub(crate) hmtx: HmtxTable<'a>,
    pub(crate) maxp: &'a [u8],
    pub(crate) name: Cursor<'a>,
    pub(crate) os2: &'a [u8],
    pub(crate) post: &'a [u8],
    pub(crate) loca: LocaTable<'a>,
    pub(crate) glyf: Cursor<'a>,
    pub(crate) cvt: Option<&'a [u8]>,
    pub(crate) fpgm: Option<&'a [u8]>,
    pub(crate) prep: Option<&'a [u8]>,
}

impl<'a> Font<'a> {
    pub(crate) const SFNT_VERSION: u32 = 0x_0001_0000;
    const APPLE_SFNT_VERSION: u32 = u32::from_be_bytes(*b"true");
    pub(crate) const SFNT_CHECKSUM: u32 = 0x_b1b0_afba;
    pub(crate) const HEAD_CHECKSUM_OFFSET: usize = 8;
    pub(crate) const HEAD_LOCA_FORMAT_OFFSET: usize = 50;
    pub(crate) const MIN_POST_LEN: usize = 32;

    /// Parses a font from the provided bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the font is malformed, misses a required table, or has
    /// non-TrueType outlines.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let directory = TableDirectory::parse(bytes)?;

        let head = directory.required_table(TableTag::HEAD)?;
        let loca_format = Self::parse_loca_format(head)?;
        let maxp = directory.required_table(TableTag::MAXP)?;
        let glyph_count = Self::parse_glyph_count(maxp)?;
        let loca = directory.required_table(TableTag::LOCA)?;
        let loca = LocaTable::new(loca_format, glyph_count, loca)?;
        let hhea = HheaTable::parse(directory.required_table(TableTag::HHEA)?)?;
        let hmtx = HmtxTable {
            cursor: directory.required_table(TableTag::HMTX)?,
            number_of_h_metrics: hhea.number_of_h_metrics,
        };
        let post = directory.required_table(TableTag::POST)?;
        if post.bytes.len() < Self::MIN_POST_LEN {
            return Err(post.err(ParseErrorKind::UnexpectedTableLen {
                expected: Self::MIN_POST_LEN,
                actual: post.bytes.len(),
            }));
        }

        Ok(Self {
            cmap: CmapTable::parse(directory.required_table(TableTag::CMAP)?)?,
            head: head.bytes,
            hhea,
            hmtx,
            maxp: maxp.bytes,
            name: directory.required_table(TableTag::NAME)?,
            os2: directory.required_table(TableTag::OS2)?.bytes,
            post: post.bytes,
            loca,
            glyf: directory.required_table(TableTag::GLYF)?,
            cvt: directory.table(TableTag::CVT).map(|cursor| cursor.bytes),
            fpgm: directory.table(TableTag::FPGM).map(|cursor| cursor.bytes),
            prep: directory.table(TableTag::PREP).map(|cursor| cursor.bytes),
        })
    }

    fn parse_loca_format(mut head: Cursor<'_>) -> Result<LocaFormat, ParseError> {
        if head.bytes.len() < Self::HEAD_LOCA_FORMAT_OFFSET + 4 {
            return Err(head.err(ParseErrorKind::UnexpectedTableLen {
                expected: 54,
                actual: head.bytes.len(),
            }));
        }
        head.read_u32_checked(|version| {
            if version == 0x_0001_0000 {
                Ok(())
            } else {
                Err(ParseErrorKind::UnexpectedTableVersion { version })
            }
        })?;
        head.skip(Self::HEAD_LOCA_FORMAT_OFFSET - 4)?;
        // ^ fontRevision, checksumAdjustment, magicNumber, flags, unitsPerEm, created, modified,
        // bounding box, macStyle, lowestRecPPEM, fontDirectionHint

        head.read_u16_checked(|format| match format {
            0 => Ok(LocaFormat::Short),
            1 => Ok(LocaFormat::Long),
            _ => Err(ParseErrorKind::UnexpectedLocaFormat(format)),
        })
    }

    fn parse_glyph_count(mut maxp: Cursor<'_>) -> Result<u16, ParseError> {
        maxp.read_u32_checked(|version| {
            if version == 0x_0000_5000 || version == 0x_0001_0000 {
                Ok(())
            } else {
                Err(ParseErrorKind::UnexpectedTableVersion { version })
            }
        })?;
        maxp.read_u16()
    }

    /// Returns the number of glyphs in this font, including the missing glyph `.notdef`.
    pub fn glyph_count(&self) -> usize {
        self.loca.glyph_count()
    }

    /// Maps a char to a glyph index. Returns 0 (the missing glyph) if the font has no glyph for `ch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `cmap` table is malformed.
    pub fn map_char(&self, ch: char) -> Result<u16, ParseError> {
        self.cmap.map_char(ch)
    }

    /// Parses the `name` table of this font.
    ///
    /// # Errors
    ///
    /// Returns an error if the `name` table is malformed.
    pub fn names(&self) -> Result<NameTable<'a>, ParseError> {
        NameTable::parse(self.name)
    }

    pub(crate) fn glyph(&self, glyph_idx: u16) -> Result<GlyphWithMetrics<'a>, ParseError> {
        let range = self.loca.glyph_range(glyph_idx)?;
        let inner = Glyph::parse(self.glyf.range(range)?)?;
        let (advance, lsb) = self.hmtx.advance_and_lsb(glyph_idx)?;
        Ok(GlyphWithMetrics {
            inner,
            advance,
            lsb,
        })
    }

    /// Computes the table checksum: a wrapping sum of big-endian `u32` words, with the tail
    /// padded with zeros.
    pub(crate) fn checksum(data: &[u8]) -> u32 {
        let mut chunks = data.chunks_exact(4);
        let mut sum = chunks
            .by_ref()
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .fold(0_u32, u32::wrapping_add);
        let remainder = chunks.remainder();
        if !remainder.is_empty() {
            let mut padded = [0_u8; 4];
            padded[..remainder.len()].copy_from_slice(remainder);
            sum = sum.wrapping_add(u32::from_be_bytes(padded));
        }
        sum
    }
}
