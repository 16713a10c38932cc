use core::{fmt, ops};

use crate::TableTag;

/// Kind of a font [`ParseError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Unexpected end of the font data.
    UnexpectedEof,
    /// Unexpected font version (e.g., a CFF-flavored OpenType font, which is not supported).
    UnexpectedFontVersion(u32),
    /// Missing required font table (e.g., `head`).
    MissingTable,
    /// No supported subtable in the `cmap` table.
    NoSupportedCmap,
    /// Offset inferred from the `cmap` table data points outside the glyph ID array.
    InvalidCmapOffset,
    /// Range inferred from the table data is out of bounds.
    RangeOutOfBounds {
        /// Inferred range.
        range: ops::Range<usize>,
        /// Length of the indexed data.
        len: usize,
    },
    /// Unexpected table version.
    UnexpectedTableVersion {
        /// Version read from the font data.
        version: u32,
    },
    /// Unexpected table length.
    UnexpectedTableLen {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// Unexpected table format (e.g., for a `cmap` subtable).
    UnexpectedTableFormat {
        /// Format read from the font data.
        format: u16,
    },
    /// Unexpected `indexToLocFormat` value in the `head` table.
    UnexpectedLocaFormat(u16),
    /// Composite glyph components are nested too deeply (e.g., because they reference each other).
    ComponentDepth(u16),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => formatter.write_str("unexpected end of the font data"),
            Self::UnexpectedFontVersion(version) => {
                write!(formatter, "unexpected font version ({version:#010x})")
            }
            Self::MissingTable => formatter.write_str("missing required font table"),
            Self::NoSupportedCmap => {
                formatter.write_str("no supported subtable in the `cmap` table")
            }
            Self::InvalidCmapOffset => {
                formatter.write_str("`cmap` offset points outside the glyph ID array")
            }
            Self::RangeOutOfBounds { range, len } => {
                write!(
                    formatter,
                    "range ({range:?}) inferred from the table data is out of bounds (..{len})"
                )
            }
            Self::UnexpectedTableVersion { version } => {
                write!(formatter, "unexpected table version ({version:#x})")
            }
            Self::UnexpectedTableLen { expected, actual } => {
                write!(
                    formatter,
                    "unexpected table length: expected {expected}, got {actual}"
                )
            }
            Self::UnexpectedTableFormat { format } => {
                write!(formatter, "unexpected table format ({format})")
            }
            Self::UnexpectedLocaFormat(format) => {
                write!(formatter, "unexpected `loca` format ({format})")
            }
            Self::ComponentDepth(glyph_idx) => {
                write!(
                    formatter,
                    "components of glyph #{glyph_idx} are nested too deeply"
                )
            }
        }
    }
}

impl std::error::Error for ParseErrorKind {}

/// Errors that can occur when parsing an OpenType [`Font`](crate::Font).
#[derive(Debug)]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) offset: usize,
    pub(crate) table: Option<TableTag>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = self.table {
            write!(formatter, "[{table}] ")?;
        }
        if self.offset > 0 {
            write!(formatter, "{}: ", self.offset)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub(crate) fn missing_table(tag: TableTag) -> Self {
        Self {
            kind: ParseErrorKind::MissingTable,
            offset: 0,
            table: Some(tag),
        }
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Gets the table this error relates to.
    pub fn table(&self) -> Option<TableTag> {
        self.table
    }

    /// Gets the offset in the font data.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Kind of a [`RangeError`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RangeErrorKind {
    /// The range item is empty (e.g., a trailing comma).
    Empty,
    /// The item contains a non-hexadecimal digit, or has an unsupported number of digits.
    InvalidHex,
    /// The range start is greater than its end.
    Reversed {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
    /// The code point exceeds the Unicode code space (`U+10FFFF`).
    OutOfBounds(u32),
    /// Wildcard characters (`?`) are combined with an explicit range.
    WildcardInRange,
}

impl fmt::Display for RangeErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("empty range item"),
            Self::InvalidHex => formatter.write_str("expected 1 to 6 hexadecimal digits"),
            Self::Reversed { start, end } => {
                write!(formatter, "range start U+{start:04X} exceeds its end U+{end:04X}")
            }
            Self::OutOfBounds(value) => {
                write!(formatter, "U+{value:04X} is outside the Unicode code space")
            }
            Self::WildcardInRange => {
                formatter.write_str("wildcards cannot be combined with an explicit range")
            }
        }
    }
}

/// Errors that can occur when parsing [`UnicodeRanges`](crate::UnicodeRanges).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError {
    pub(crate) item: String,
    pub(crate) kind: RangeErrorKind,
}

impl fmt::Display for RangeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "invalid range item `{}`: {}", self.item, self.kind)
    }
}

impl std::error::Error for RangeError {}

impl RangeError {
    /// Gets the error kind.
    pub fn kind(&self) -> &RangeErrorKind {
        &self.kind
    }

    /// Gets the offending range item as it was written.
    pub fn item(&self) -> &str {
        &self.item
    }
}
