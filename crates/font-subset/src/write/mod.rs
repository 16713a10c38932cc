//! Serialization of [`FontSubset`]s into TrueType and WOFF2 containers.

use core::iter;

pub(crate) use self::tables::write_head_table;
use crate::{
    font::{CmapTable, HmtxTable, LocaTable},
    Font, FontSubset, TableTag,
};

mod brotli;
mod tables;

fn write_u16(writer: &mut Vec<u8>, value: u16) {
    writer.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(writer: &mut Vec<u8>, value: u32) {
    writer.extend_from_slice(&value.to_be_bytes());
}

fn pad_to_4_bytes(buffer: &mut Vec<u8>) {
    let padding = buffer.len().next_multiple_of(4) - buffer.len();
    buffer.extend(iter::repeat_n(0_u8, padding));
}

/// Length of a `UIntBase128` value in WOFF2.
fn uint_base128_len(val: u32) -> usize {
    if val == 0 {
        1
    } else {
        val.ilog2() as usize / 7 + 1
    }
}

#[allow(clippy::cast_possible_truncation)] // intentional
fn write_uint_base128(buffer: &mut Vec<u8>, val: u32) {
    let len = uint_base128_len(val);
    for i in (1..len).rev() {
        buffer.push(0x80 | (val >> (7 * i)) as u8);
    }
    buffer.push((val & 0x7f) as u8);
}

/// Binary search params used in the sfnt header and `cmap` format 4 subtables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchParams {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchParams {
    /// Computes params for `count` entries, each taking `unit_len` bytes.
    #[allow(clippy::cast_possible_truncation)] // `ilog2()` of a `u16` is less than 16
    fn new(count: u16, unit_len: u16) -> Self {
        let entry_selector = if count == 0 { 0 } else { count.ilog2() as u16 };
        let search_range = unit_len << entry_selector;
        Self {
            search_range,
            entry_selector,
            range_shift: (unit_len * count).saturating_sub(search_range),
        }
    }

    fn write(self, writer: &mut Vec<u8>) {
        write_u16(writer, self.search_range);
        write_u16(writer, self.entry_selector);
        write_u16(writer, self.range_shift);
    }
}

impl FontSubset<'_> {
    /// Serializes this subset to the TrueType format.
    pub fn to_truetype(&self) -> Vec<u8> {
        self.to_writer().into_opentype()
    }

    /// Serializes this subset to the WOFF2 format. Table data is compressed with Brotli;
    /// no table transforms are applied.
    pub fn to_woff2(&self) -> Vec<u8> {
        self.to_writer().into_woff2()
    }

    /// Writes tables in the order suggested for WOFF2. In particular, `loca` must follow `glyf`.
    fn to_writer(&self) -> FontWriter {
        let font = &self.font;
        let mut writer = FontWriter::default();

        let cmap = CmapTable::from_map(&self.char_map);
        writer.write_table(TableTag::CMAP, |buffer| cmap.write(buffer));
        for (tag, table) in [(TableTag::CVT, font.cvt), (TableTag::FPGM, font.fpgm)] {
            if let Some(table) = table {
                writer.write_raw_table(tag, table);
            }
        }

        let mut hhea = font.hhea;
        hhea.number_of_h_metrics = writer.write_table(TableTag::HMTX, |buffer| {
            HmtxTable::write_for_glyphs(&self.glyphs, buffer)
        });
        writer.write_table(TableTag::HHEA, |buffer| hhea.write(buffer));

        let glyph_count = u16::try_from(self.glyphs.len()).expect("too many glyphs");
        writer.write_table(TableTag::MAXP, |buffer| {
            // Only `numGlyphs` at bytes 4..6 is patched.
            buffer.extend_from_slice(&font.maxp[..4]);
            write_u16(buffer, glyph_count);
            buffer.extend_from_slice(&font.maxp[6..]);
        });

        // `name` and `OS/2` are copied as is; the subset retains names and vertical metrics.
        writer.write_raw_table(TableTag::NAME, font.name.bytes);
        writer.write_raw_table(TableTag::OS2, font.os2);
        writer.write_table(TableTag::POST, |buffer| {
            // Version 3 has no glyph names, which would be invalidated by subsetting.
            write_u32(buffer, 0x_0003_0000);
            buffer.extend_from_slice(&font.post[4..Font::MIN_POST_LEN]);
        });
        if let Some(prep) = font.prep {
            writer.write_raw_table(TableTag::PREP, prep);
        }

        let locations = writer.write_table(TableTag::GLYF, |buffer| {
            let start = buffer.len();
            let mut locations = Vec::with_capacity(self.glyphs.len() + 1);
            locations.push(0);
            for glyph in &self.glyphs {
                glyph.inner.write(buffer);
                locations.push(buffer.len() - start);
            }
            locations
        });
        let loca_format =
            writer.write_table(TableTag::LOCA, |buffer| LocaTable::write(&locations, buffer));
        writer.write_table(TableTag::HEAD, |buffer| {
            write_head_table(font.head, loca_format, buffer);
        });
        writer
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(test, derive(PartialEq))]
struct TableRecord {
    tag: TableTag,
    checksum: u32,
    /// Relative to the start of table data until [`FontWriter::finalize()`]; always 4-byte aligned.
    offset: u32,
    length: u32,
}

impl TableRecord {
    const BYTE_LEN: usize = 16;

    /// Tags with a known index in the WOFF2 table directory, in the index order.
    const WOFF2_KNOWN_TAGS: [TableTag; 13] = [
        TableTag::CMAP,
        TableTag::HEAD,
        TableTag::HHEA,
        TableTag::HMTX,
        TableTag::MAXP,
        TableTag::NAME,
        TableTag::OS2,
        TableTag::POST,
        TableTag::CVT,
        TableTag::FPGM,
        TableTag::GLYF,
        TableTag::LOCA,
        TableTag::PREP,
    ];
    /// Index signalling that the tag is written explicitly after the flags.
    const WOFF2_ARBITRARY_TAG: u8 = 0x3f;

    fn write_opentype(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.tag.0);
        write_u32(writer, self.checksum);
        write_u32(writer, self.offset);
        write_u32(writer, self.length);
    }

    fn self_checksum(&self) -> u32 {
        u32::from_be_bytes(self.tag.0)
            .wrapping_add(self.checksum)
            .wrapping_add(self.offset)
            .wrapping_add(self.length)
    }

    #[allow(clippy::cast_possible_truncation)] // there are 13 known tags
    fn woff2_tag_index(&self) -> Option<u8> {
        Self::WOFF2_KNOWN_TAGS
            .iter()
            .position(|&tag| tag == self.tag)
            .map(|idx| idx as u8)
    }

    fn woff2_len(&self) -> usize {
        let tag_len = if self.woff2_tag_index().is_some() { 0 } else { 4 };
        1 + tag_len + uint_base128_len(self.length)
    }

    fn write_woff2(&self, buffer: &mut Vec<u8>) {
        // Transform version 3 is the null transform for `glyf` and `loca`; for other tables, it's 0.
        const NULL_GLYF_TRANSFORM: u8 = 0b_1100_0000;

        if let Some(idx) = self.woff2_tag_index() {
            let flags = if matches!(self.tag, TableTag::GLYF | TableTag::LOCA) {
                idx | NULL_GLYF_TRANSFORM
            } else {
                idx
            };
            buffer.push(flags);
        } else {
            buffer.push(Self::WOFF2_ARBITRARY_TAG);
            buffer.extend_from_slice(&self.tag.0);
        }
        write_uint_base128(buffer, self.length);
    }
}

/// Accumulates tables and serializes them into a TrueType or WOFF2 font.
#[derive(Debug, Clone, Default)]
pub(crate) struct FontWriter {
    tables: Vec<TableRecord>,
    /// Table data; each table is padded to a 4-byte boundary.
    table_data: Vec<u8>,
}

impl FontWriter {
    const SFNT_HEADER_LEN: usize = 12;
    const WOFF2_HEADER_LEN: usize = 48;
    const WOFF2_SIGNATURE: u32 = u32::from_be_bytes(*b"wOF2");

    /// Writes a table using the provided closure and returns the closure output.
    pub(crate) fn write_table<T>(
        &mut self,
        tag: TableTag,
        with: impl FnOnce(&mut Vec<u8>) -> T,
    ) -> T {
        let offset = self.table_data.len();
        debug_assert_eq!(offset % 4, 0, "unaligned offset: {offset}");

        let output = with(&mut self.table_data);
        let length = self.table_data.len() - offset;
        pad_to_4_bytes(&mut self.table_data);

        self.tables.push(TableRecord {
            tag,
            checksum: Font::checksum(&self.table_data[offset..]),
            offset: u32::try_from(offset).expect("table offset overflow"),
            length: u32::try_from(length).expect("table length overflow"),
        });
        output
    }

    pub(crate) fn write_raw_table(&mut self, tag: TableTag, content: &[u8]) {
        self.write_table(tag, |buffer| buffer.extend_from_slice(content));
    }

    fn table_count(&self) -> u16 {
        u16::try_from(self.tables.len()).expect("too many tables")
    }

    fn write_sfnt_header(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(Self::SFNT_HEADER_LEN);
        write_u32(&mut buffer, Font::SFNT_VERSION);
        write_u16(&mut buffer, self.table_count());
        SearchParams::new(self.table_count(), 16).write(&mut buffer);
        debug_assert_eq!(buffer.len(), Self::SFNT_HEADER_LEN);
        buffer
    }

    /// Offset of table data in the TrueType font.
    fn data_offset(&self) -> usize {
        Self::SFNT_HEADER_LEN + self.tables.len() * TableRecord::BYTE_LEN
    }

    /// Makes table offsets absolute and sets `checksumAdjustment` in the `head` table.
    fn finalize(&mut self, sfnt_header: &[u8]) {
        let data_offset = self.data_offset();
        let data_offset_u32 = u32::try_from(data_offset).expect("data offset overflow");

        let mut file_checksum = Font::checksum(sfnt_header);
        for record in &mut self.tables {
            record.offset += data_offset_u32;
            file_checksum = file_checksum
                .wrapping_add(record.self_checksum())
                .wrapping_add(record.checksum);
        }

        let head = self
            .tables
            .iter()
            .find(|record| record.tag == TableTag::HEAD)
            .expect("`head` table is always written");
        let adjustment_offset = head.offset as usize - data_offset + Font::HEAD_CHECKSUM_OFFSET;
        let checksum_adjustment = Font::SFNT_CHECKSUM.wrapping_sub(file_checksum);
        self.table_data[adjustment_offset..adjustment_offset + 4]
            .copy_from_slice(&checksum_adjustment.to_be_bytes());
    }

    pub(crate) fn into_opentype(mut self) -> Vec<u8> {
        let mut buffer = self.write_sfnt_header();
        self.finalize(&buffer);

        // Records are sorted by tag; table data retains the writing order.
        self.tables.sort_unstable_by_key(|record| record.tag.0);
        for record in &self.tables {
            record.write_opentype(&mut buffer);
        }
        buffer.extend(self.table_data);
        buffer
    }

    pub(crate) fn into_woff2(mut self) -> Vec<u8> {
        let sfnt_header = self.write_sfnt_header();
        self.finalize(&sfnt_header);

        let compressed_data = self.compress_data();
        let directory_len = self.tables.iter().map(TableRecord::woff2_len).sum::<usize>();
        let file_len = (Self::WOFF2_HEADER_LEN + directory_len + compressed_data.len())
            .next_multiple_of(4);
        let total_sfnt_size = self.data_offset() + self.table_data.len();

        let mut buffer = Vec::with_capacity(file_len);
        write_u32(&mut buffer, Self::WOFF2_SIGNATURE);
        write_u32(&mut buffer, Font::SFNT_VERSION);
        write_u32(&mut buffer, file_len.try_into().expect("file length overflow"));
        write_u16(&mut buffer, self.table_count());
        write_u16(&mut buffer, 0); // reserved
        write_u32(&mut buffer, total_sfnt_size.try_into().expect("font size overflow"));
        write_u32(&mut buffer, compressed_data.len().try_into().expect("font size overflow"));
        // Version, metadata offset / length / original length, private block offset / length
        for _ in 0..6 {
            write_u32(&mut buffer, 0);
        }
        debug_assert_eq!(buffer.len(), Self::WOFF2_HEADER_LEN);

        for record in &self.tables {
            record.write_woff2(&mut buffer);
        }
        debug_assert_eq!(buffer.len(), Self::WOFF2_HEADER_LEN + directory_len);
        buffer.extend(compressed_data);
        pad_to_4_bytes(&mut buffer);
        debug_assert_eq!(buffer.len(), file_len);
        buffer
    }
}
