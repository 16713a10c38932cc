//! Brotli compression of the WOFF2 table data stream.

use core::slice;

use brotli::enc::{backward_references::BrotliEncoderMode, BrotliEncoderParams};

use super::{FontWriter, TableRecord};

/// Reads table data in the table order, skipping padding between tables.
struct TableDataReader<'a> {
    table_data: &'a [u8],
    /// Offset of the first table; table offsets may already be absolute.
    data_offset: usize,
    tables: slice::Iter<'a, TableRecord>,
    current_table: &'a [u8],
}

impl<'a> TableDataReader<'a> {
    fn new(writer: &'a FontWriter) -> Self {
        debug_assert!(
            writer.tables.is_sorted_by_key(|record| record.offset),
            "table records need to be ordered by offsets"
        );
        Self {
            table_data: &writer.table_data,
            data_offset: writer.tables.first().map_or(0, |record| record.offset as usize),
            tables: writer.tables.iter(),
            current_table: &[],
        }
    }

    fn next_table(&mut self) -> Option<&'a [u8]> {
        let record = self.tables.next()?;
        let start = record.offset as usize - self.data_offset;
        Some(&self.table_data[start..start + record.length as usize])
    }
}

impl brotli::CustomRead<()> for TableDataReader<'_> {
    fn read(&mut self, data: &mut [u8]) -> Result<usize, ()> {
        let mut total_read = 0;
        while total_read < data.len() {
            if self.current_table.is_empty() {
                let Some(table) = self.next_table() else {
                    break;
                };
                self.current_table = table;
                continue;
            }

            let chunk_len = self.current_table.len().min(data.len() - total_read);
            let (chunk, rest) = self.current_table.split_at(chunk_len);
            data[total_read..total_read + chunk_len].copy_from_slice(chunk);
            self.current_table = rest;
            total_read += chunk_len;
        }
        Ok(total_read)
    }
}

#[derive(Default)]
struct VecSink(Vec<u8>);

impl brotli::CustomWrite<()> for VecSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.0.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct BoxedSlice<T>(Box<[T]>);

impl<T> Default for BoxedSlice<T> {
    fn default() -> Self {
        Self(Box::default())
    }
}

impl<T> brotli::SliceWrapper<T> for BoxedSlice<T> {
    fn slice(&self) -> &[T] {
        self.0.as_ref()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<T> brotli::SliceWrapperMut<T> for BoxedSlice<T> {
    fn slice_mut(&mut self) -> &mut [T] {
        self.0.as_mut()
    }
}

#[derive(Debug)]
struct HeapAlloc;

impl<T: Clone + Default> brotli::enc::Allocator<T> for HeapAlloc {
    type AllocatedMemory = BoxedSlice<T>;

    fn alloc_cell(&mut self, len: usize) -> Self::AllocatedMemory {
        BoxedSlice(vec![T::default(); len].into())
    }

    fn free_cell(&mut self, data: Self::AllocatedMemory) {
        drop(data);
    }
}

impl brotli::enc::BrotliAlloc for HeapAlloc {}

impl FontWriter {
    /// Compresses table data (without the table directory) as a single Brotli stream.
    pub(super) fn compress_data(&self) -> Vec<u8> {
        let params = BrotliEncoderParams {
            mode: BrotliEncoderMode::BROTLI_MODE_FONT,
            quality: 11,
            size_hint: self.table_data.len(),
            ..BrotliEncoderParams::default()
        };
        let mut sink = VecSink::default();
        ::brotli::BrotliCompressCustomIo(
            &mut TableDataReader::new(self),
            &mut sink,
            &mut [0_u8; 4_096],
            &mut [0_u8; 4_096],
            &params,
            HeapAlloc,
            &mut |_, _, _, _| { /* no metablock callbacks */ },
            (),
        )
        .expect("writing to a `Vec` never fails");

        sink.0
    }
}

#[cfg(test)]
mod tests {
    use brotli::CustomRead;
    use test_casing::{test_casing, Product};

    use super::*;
    use crate::{tests::TestFont, Font, FontSubset};

    #[test_casing(10, Product(([TestFont::Sans, TestFont::Emoji], [1, 7, 100, 1_000, 100_000])))]
    fn table_data_reader_concatenates_tables(font: TestFont, chunk_size: usize) {
        let font_bytes = font.build();
        let font = Font::new(&font_bytes).unwrap();
        let chars = (' '..='\u{1f64f}').collect();
        let writer = FontSubset::new(font, &chars).unwrap().to_writer();

        let mut data_reader = TableDataReader::new(&writer);
        let mut buffer = vec![0; 100_000];
        let read = buffer
            .chunks_mut(chunk_size)
            .map(|chunk| data_reader.read(chunk).unwrap())
            .sum::<usize>();
        let expected_read = writer
            .tables
            .iter()
            .map(|record| record.length as usize)
            .sum::<usize>();
        assert_eq!(read, expected_read);

        let mut pos = 0;
        for record in &writer.tables {
            let offset = record.offset as usize;
            let len = record.length as usize;
            assert_eq!(
                writer.table_data[offset..offset + len],
                buffer[pos..pos + len],
                "{:?}",
                record.tag
            );
            pos += len;
        }
    }

    #[test]
    fn compressed_data_can_be_decompressed() {
        let font_bytes = TestFont::Sans.build();
        let font = Font::new(&font_bytes).unwrap();
        let writer = font.subset(&('A'..='z').collect()).unwrap().to_writer();
        let compressed = writer.compress_data();
        assert!(compressed.len() < writer.table_data.len());

        let mut decompressed = vec![];
        brotli::BrotliDecompress(&mut compressed.as_slice(), &mut decompressed).unwrap();
        let expected: Vec<u8> = writer
            .tables
            .iter()
            .flat_map(|record| {
                let offset = record.offset as usize;
                writer.table_data[offset..offset + record.length as usize].iter().copied()
            })
            .collect();
        assert_eq!(decompressed, expected);
    }
}
