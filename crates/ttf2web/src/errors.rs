//! Error handling.

use std::{io, path::PathBuf};

use font_subset::{ParseError, RangeError};
use thiserror::Error;

/// Errors that can occur when converting a font.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Subset catalog line doesn't consist of exactly two fields.
    #[error(
        "malformed subset definition at line {line}: expected 2 whitespace-separated fields \
         (name and Unicode ranges), got {fields}"
    )]
    MalformedCatalogEntry {
        /// 1-based line number.
        line: usize,
        /// Line contents.
        content: String,
        /// Number of fields in the line.
        fields: usize,
    },
    /// Unicode range expression in a subset definition cannot be parsed.
    #[error("invalid Unicode ranges for subset `{name}`: {expr}")]
    InvalidUnicodeRange {
        /// Subset name.
        name: String,
        /// Range expression as written in the catalog.
        expr: String,
        /// Parsing error.
        #[source]
        source: RangeError,
    },
    /// Font doesn't specify the family name.
    #[error("font `{}` has no family name", .path.display())]
    MissingFontMetadata {
        /// Path to the font.
        path: PathBuf,
    },
    /// Font cannot be parsed.
    #[error("failed loading font `{}`{}", .path.display(), subset_suffix(.subset.as_deref()))]
    FontLoad {
        /// Path to the font.
        path: PathBuf,
        /// Subset being processed, if any.
        subset: Option<String>,
        /// Parsing error.
        #[source]
        source: ParseError,
    },
    /// I/O error.
    #[error("failed {action} `{}`", .path.display())]
    Io {
        /// Action that has failed, e.g. "reading font".
        action: &'static str,
        /// Path to the file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

fn subset_suffix(subset: Option<&str>) -> String {
    subset
        .map(|name| format!(" for subset `{name}`"))
        .unwrap_or_default()
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
