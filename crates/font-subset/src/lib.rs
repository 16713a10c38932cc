//! OpenType font subsetting and WOFF2 serialization.
//!
//! The crate parses TrueType-flavored OpenType fonts, restricts them to a set of chars
//! (retaining glyphs referenced by composite glyphs), and serializes the result as
//! TrueType or WOFF2. It also provides [`UnicodeRanges`] to parse CSS `unicode-range` values,
//! and [`NameTable`] to read human-readable font names.
//!
//! # Limitations
//!
//! Layout tables (`GSUB`, `GPOS` and `kern`) are not retained in subsets, so kerning
//! and other OpenType features of the original font are lost. Only fonts with TrueType
//! outlines are supported.
//!
//! # Examples
//!
//! ```no_run
//! use font_subset::{Font, UnicodeRanges};
//!
//! let font_bytes = std::fs::read("ExampleSans-Regular.ttf")?;
//! let font = Font::new(&font_bytes)?;
//! let chars = UnicodeRanges::parse("U+0000-00FF, U+0131")?.to_char_set();
//! let subset = font.subset(&chars)?;
//! if !subset.is_empty() {
//!     std::fs::write("example.latin.woff2", subset.to_woff2())?;
//! }
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/font-subset/0.1.0")]

mod errors;
mod font;
mod ranges;
mod subset;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
#[cfg(test)]
pub(crate) mod tests;
mod write;

pub use crate::{
    errors::{ParseError, ParseErrorKind, RangeError, RangeErrorKind},
    font::{Font, NameId, NameTable, TableTag},
    ranges::UnicodeRanges,
    subset::FontSubset,
};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
