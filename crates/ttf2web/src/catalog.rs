//! Catalog of Unicode subsets.

use std::{collections::BTreeSet, fs, path::Path};

use font_subset::UnicodeRanges;

use crate::Error;

/// Named Unicode subset, e.g. `latin` covering `U+0000-00FF,U+0131`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetSpec {
    name: String,
    range_expr: String,
    codepoints: BTreeSet<char>,
}

impl SubsetSpec {
    /// Creates a subset by expanding the provided range expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUnicodeRange`] if the range expression is malformed.
    pub fn new(name: &str, range_expr: &str) -> Result<Self, Error> {
        let ranges =
            UnicodeRanges::parse(range_expr).map_err(|source| Error::InvalidUnicodeRange {
                name: name.to_owned(),
                expr: range_expr.to_owned(),
                source,
            })?;
        Ok(Self {
            name: name.to_owned(),
            range_expr: range_expr.to_owned(),
            codepoints: ranges.to_char_set(),
        })
    }

    /// Returns the subset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the Unicode range expression as written in the catalog.
    pub fn range_expr(&self) -> &str {
        &self.range_expr
    }

    /// Returns the expanded set of code points. Surrogate code points are not included.
    pub fn codepoints(&self) -> &BTreeSet<char> {
        &self.codepoints
    }
}

/// Ordered collection of [`SubsetSpec`]s with unique names.
///
/// # Format
///
/// Each non-blank line contains exactly two whitespace-separated fields: the subset name
/// and its Unicode range expression (items separated by commas, without whitespace).
/// Blank lines are skipped.
///
/// ```text
/// latin    U+0000-00FF,U+0131,U+0152-0153
/// greek    U+0370-03FF
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubsetCatalog {
    subsets: Vec<SubsetSpec>,
}

impl SubsetCatalog {
    const BUILTIN: &'static str = include_str!("subsets");

    /// Returns the built-in catalog covering common scripts (Latin, Cyrillic, Greek, etc.).
    ///
    /// # Panics
    ///
    /// Panics if the built-in catalog is malformed, which is checked by tests.
    pub fn builtin() -> Self {
        Self::parse(Self::BUILTIN).expect("built-in subset catalog is malformed")
    }

    /// Reads a catalog from a UTF-8 file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if its contents are malformed.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::io("reading subset catalog", path, err))?;
        Self::parse(&text)
    }

    /// Parses a catalog from text. No subsets are produced if any of the lines is malformed.
    ///
    /// # Errors
    ///
    /// - Returns [`Error::MalformedCatalogEntry`] if a line doesn't contain exactly 2 fields.
    /// - Returns [`Error::InvalidUnicodeRange`] if a range expression is malformed.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut entries = vec![];
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<_> = trimmed.split_whitespace().collect();
            let [name, range_expr] = fields[..] else {
                return Err(Error::MalformedCatalogEntry {
                    line: i + 1,
                    content: line.to_owned(),
                    fields: fields.len(),
                });
            };
            entries.push((name, range_expr));
        }

        let mut subsets: Vec<SubsetSpec> = Vec::with_capacity(entries.len());
        for (name, range_expr) in entries {
            let spec = SubsetSpec::new(name, range_expr)?;
            if let Some(existing) = subsets.iter_mut().find(|existing| existing.name == name) {
                log::warn!("Subset `{name}` is defined multiple times; using the last definition");
                *existing = spec;
            } else {
                subsets.push(spec);
            }
        }
        Ok(Self { subsets })
    }

    /// Returns the number of subsets.
    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    /// Checks whether this catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    /// Iterates over subsets in the definition order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SubsetSpec> + '_ {
        self.subsets.iter()
    }

    /// Gets a subset by its name.
    pub fn get(&self, name: &str) -> Option<&SubsetSpec> {
        self.subsets.iter().find(|spec| spec.name == name)
    }
}

impl<'a> IntoIterator for &'a SubsetCatalog {
    type Item = &'a SubsetSpec;
    type IntoIter = std::slice::Iter<'a, SubsetSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.subsets.iter()
    }
}
