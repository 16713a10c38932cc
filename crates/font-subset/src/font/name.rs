//! `name` table processing.

use encoding_rs::{Encoding, MACINTOSH, UTF_16BE};

use super::{Cursor, TableDirectory};
use crate::{errors::ParseErrorKind, ParseError, TableTag};

/// Identifier of a string in the [`NameTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameId(pub u16);

impl NameId {
    /// Copyright notice.
    pub const COPYRIGHT: Self = Self(0);
    /// Font family name, e.g. "Example Sans".
    pub const FAMILY: Self = Self(1);
    /// Font subfamily name, e.g. "Regular" or "Bold Italic".
    pub const SUBFAMILY: Self = Self(2);
    /// Full font name.
    pub const FULL_NAME: Self = Self(4);
    /// PostScript name.
    pub const POSTSCRIPT_NAME: Self = Self(6);
    /// Typographic family name. Only present if it differs from [`Self::FAMILY`].
    pub const TYPOGRAPHIC_FAMILY: Self = Self(16);
    /// Typographic subfamily name. Only present if it differs from [`Self::SUBFAMILY`].
    pub const TYPOGRAPHIC_SUBFAMILY: Self = Self(17);
}

#[derive(Debug, Clone, Copy)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: NameId,
    len: usize,
    offset: usize,
}

impl NameRecord {
    const UNICODE_PLATFORM: u16 = 0;
    const MAC_PLATFORM: u16 = 1;
    const WINDOWS_PLATFORM: u16 = 3;
    const WINDOWS_ENGLISH_US: u16 = 0x409;

    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            platform_id: cursor.read_u16()?,
            encoding_id: cursor.read_u16()?,
            language_id: cursor.read_u16()?,
            name_id: NameId(cursor.read_u16()?),
            len: cursor.read_u16()?.into(),
            offset: cursor.read_u16()?.into(),
        })
    }

    fn encoding(&self) -> Option<&'static Encoding> {
        match (self.platform_id, self.encoding_id) {
            (Self::UNICODE_PLATFORM, _) | (Self::WINDOWS_PLATFORM, 0 | 1 | 10) => Some(UTF_16BE),
            (Self::MAC_PLATFORM, 0) => Some(MACINTOSH),
            _ => None,
        }
    }

    /// Lower is better; `None` means that the record cannot be decoded.
    fn priority(&self) -> Option<u8> {
        self.encoding()?;
        Some(match (self.platform_id, self.language_id) {
            (Self::WINDOWS_PLATFORM, Self::WINDOWS_ENGLISH_US) => 0,
            (Self::MAC_PLATFORM, 0) => 1,
            (Self::UNICODE_PLATFORM, _) => 2,
            (Self::WINDOWS_PLATFORM, _) => 3,
            _ => 4,
        })
    }
}

/// Naming table of a font containing human-readable strings, such as the family name.
#[derive(Debug)]
pub struct NameTable<'a> {
    records: Vec<NameRecord>,
    storage: Cursor<'a>,
}

impl<'a> NameTable<'a> {
    /// Reads the `name` table from raw font data. Unlike [`Font::new()`](crate::Font::new()),
    /// this only parses the table directory and the `name` table itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the font data is malformed or has no `name` table.
    pub fn from_font_data(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let directory = TableDirectory::parse(bytes)?;
        Self::parse(directory.required_table(TableTag::NAME)?)
    }

    pub(super) fn parse(table: Cursor<'a>) -> Result<Self, ParseError> {
        let mut cursor = table;
        cursor.read_u16_checked(|format| {
            if format > 1 {
                return Err(ParseErrorKind::UnexpectedTableFormat { format });
            }
            Ok(())
        })?;
        let count = cursor.read_u16()?;
        let storage_offset = cursor.read_u16()?;
        let records = (0..count).map(|_| NameRecord::parse(&mut cursor));
        let records = records.collect::<Result<_, _>>()?;
        // Language tag records for format 1 are ignored; they are located before the storage.

        let mut storage = table;
        storage.skip(storage_offset.into())?;
        Ok(Self { records, storage })
    }

    /// Gets a string with the specified ID. If there are several localized versions of the string,
    /// English is preferred.
    ///
    /// Returns `None` if the string is missing or cannot be decoded.
    pub fn get(&self, id: NameId) -> Option<String> {
        let record = self
            .records
            .iter()
            .filter(|record| record.name_id == id)
            .filter_map(|record| Some((record.priority()?, record)))
            .min_by_key(|(priority, _)| *priority)?
            .1;
        let raw = self
            .storage
            .range(record.offset..record.offset + record.len)
            .ok()?;
        let (decoded, _) = record.encoding()?.decode_without_bom_handling(raw.bytes);
        Some(decoded.into_owned())
    }

    /// Returns the font family name ([`NameId::FAMILY`]).
    pub fn family(&self) -> Option<String> {
        self.get(NameId::FAMILY)
    }

    /// Returns the font subfamily name ([`NameId::SUBFAMILY`]).
    pub fn subfamily(&self) -> Option<String> {
        self.get(NameId::SUBFAMILY)
    }
}
