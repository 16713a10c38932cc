//! Producing WOFF2 subsets of a font.

use std::{
    fs,
    path::{Path, PathBuf},
};

use font_subset::{Font, FontSubset, ParseError};

use crate::{catalog::SubsetSpec, Error, SubsetCatalog};

/// Information about a generated subset font file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SubsetResult {
    /// Subset name.
    pub name: String,
    /// Unicode range expression for the subset as written in the catalog.
    pub range_expr: String,
    /// Path to the generated WOFF2 file.
    pub output_path: PathBuf,
    /// Number of glyphs in the subset, excluding the missing glyph.
    pub glyph_count: usize,
    /// Number of chars from the subset covered by the font.
    pub mapped_chars: usize,
}

/// Returns the font file name without the extension, e.g. `example` for `fonts/example.ttf`.
pub(crate) fn font_basename(font_path: &Path) -> String {
    font_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Produces WOFF2 subsets of a font, one file per catalog entry.
#[derive(Debug)]
pub struct SubsetProcessor<'a> {
    font_path: &'a Path,
    basename: String,
    asset_dir: &'a Path,
}

impl<'a> SubsetProcessor<'a> {
    /// Creates a processor for the font at `font_path` outputting files to `asset_dir`.
    pub fn new(font_path: &'a Path, asset_dir: &'a Path) -> Self {
        Self {
            font_path,
            basename: font_basename(font_path),
            asset_dir,
        }
    }

    /// Returns the output path for the specified subset: `<asset_dir>/<basename>.<name>.woff2`.
    pub fn output_path(&self, subset_name: &str) -> PathBuf {
        self.asset_dir
            .join(format!("{}.{subset_name}.woff2", self.basename))
    }

    fn load_error(&self, spec: &SubsetSpec, source: ParseError) -> Error {
        Error::FontLoad {
            path: self.font_path.to_owned(),
            subset: Some(spec.name().to_owned()),
            source,
        }
    }

    /// Processes a single subset. Returns `Ok(None)` if the font covers none of the subset chars;
    /// in this case, no file is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be read or parsed, or if the output cannot be written.
    pub fn process(&self, spec: &SubsetSpec) -> Result<Option<SubsetResult>, Error> {
        log::debug!("Processing {}", spec.name());

        // The font is re-read for each subset and dropped at the end of this method.
        let font_bytes = fs::read(self.font_path)
            .map_err(|err| Error::io("reading font", self.font_path, err))?;
        let font = Font::new(&font_bytes).map_err(|err| self.load_error(spec, err))?;
        let subset =
            FontSubset::new(font, spec.codepoints()).map_err(|err| self.load_error(spec, err))?;

        let codepoint_count = spec.codepoints().len();
        if subset.is_empty() {
            log::debug!("Found no glyphs for any of {codepoint_count} code points");
            return Ok(None);
        }

        let output_path = self.output_path(spec.name());
        fs::create_dir_all(self.asset_dir)
            .map_err(|err| Error::io("creating asset directory", self.asset_dir, err))?;
        fs::write(&output_path, subset.to_woff2())
            .map_err(|err| Error::io("writing subset", &output_path, err))?;

        let result = SubsetResult {
            name: spec.name().to_owned(),
            range_expr: spec.range_expr().to_owned(),
            output_path,
            glyph_count: subset.glyph_count(),
            mapped_chars: subset.chars().len(),
        };
        log::info!("Generated {}", result.output_path.display());
        log::debug!(
            "Found {} glyphs for {} out of {codepoint_count} code points",
            result.glyph_count,
            result.mapped_chars
        );
        Ok(Some(result))
    }

    /// Processes all subsets in the catalog order, stopping on the first error.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::process()`].
    pub fn process_all(&self, catalog: &SubsetCatalog) -> Result<Vec<SubsetResult>, Error> {
        let mut results = Vec::with_capacity(catalog.len());
        for spec in catalog {
            if let Some(result) = self.process(spec)? {
                results.push(result);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use font_subset::testing::FontBuilder;

    use super::*;

    fn write_font(dir: &Path) -> PathBuf {
        let font_path = dir.join("example.ttf");
        let font = FontBuilder::new("Example Sans", "Regular")
            .with_chars(' '..='~')
            .with_composite('é', &['e', '\u{301}'])
            .build();
        fs::write(&font_path, font).unwrap();
        font_path
    }

    #[test]
    fn basename_is_file_stem() {
        assert_eq!(font_basename(Path::new("fonts/Example-Bold.ttf")), "Example-Bold");
        assert_eq!(font_basename(Path::new("example")), "example");
        assert_eq!(font_basename(Path::new("example.tar.ttf")), "example.tar");
    }

    #[test]
    fn processing_subset() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = write_font(dir.path());
        let asset_dir = dir.path().join("assets");
        let processor = SubsetProcessor::new(&font_path, &asset_dir);

        let spec = SubsetSpec::new("latin", "U+0000-00FF").unwrap();
        let result = processor.process(&spec).unwrap().unwrap();
        assert_eq!(result.name, "latin");
        assert_eq!(result.range_expr, "U+0000-00FF");
        assert_eq!(result.output_path, asset_dir.join("example.latin.woff2"));
        // 95 ASCII chars + 'é'
        assert_eq!(result.mapped_chars, 96);
        // ... plus the combining acute accent
        assert_eq!(result.glyph_count, 97);

        let woff2 = fs::read(&result.output_path).unwrap();
        assert_eq!(woff2[..4], *b"wOF2");
    }

    #[test]
    fn empty_subset_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = write_font(dir.path());
        let asset_dir = dir.path().join("assets");
        let processor = SubsetProcessor::new(&font_path, &asset_dir);

        let spec = SubsetSpec::new("greek", "U+0370-03FF").unwrap();
        assert_eq!(processor.process(&spec).unwrap(), None);
        assert!(!processor.output_path("greek").exists());
        assert!(!asset_dir.exists());
    }

    #[test]
    fn processing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = write_font(dir.path());
        let asset_dir = dir.path().join("assets");
        let processor = SubsetProcessor::new(&font_path, &asset_dir);

        let catalog =
            SubsetCatalog::parse("digits U+0030-0039\ngreek U+0370-03FF\nacute U+00E9\n")
                .unwrap();
        let results = processor.process_all(&catalog).unwrap();
        let names: Vec<_> = results.iter().map(|result| result.name.as_str()).collect();
        assert_eq!(names, ["digits", "acute"]);
        assert_eq!(results[1].glyph_count, 3);

        let mut files: Vec<_> = fs::read_dir(&asset_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        assert_eq!(files, ["example.acute.woff2", "example.digits.woff2"]);
    }

    #[test]
    fn malformed_font_aborts_processing() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("example.ttf");
        fs::write(&font_path, b"\0\x01\0\0garbage").unwrap();
        let asset_dir = dir.path().join("assets");
        let processor = SubsetProcessor::new(&font_path, &asset_dir);

        let catalog = SubsetCatalog::parse("latin U+0000-00FF\n").unwrap();
        let err = processor.process_all(&catalog).unwrap_err();
        assert!(
            matches!(&err, Error::FontLoad { subset: Some(name), .. } if name == "latin"),
            "{err:?}"
        );
        let message = err.to_string();
        assert!(message.starts_with("failed loading font `"), "{message}");
        assert!(message.ends_with("example.ttf` for subset `latin`"), "{message}");
        assert!(!asset_dir.exists());
    }

    #[test]
    fn missing_font_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("missing.ttf");
        let asset_dir = dir.path().join("assets");
        let processor = SubsetProcessor::new(&font_path, &asset_dir);

        let spec = SubsetSpec::new("latin", "U+0000-00FF").unwrap();
        let err = processor.process(&spec).unwrap_err();
        assert!(matches!(err, Error::Io { action: "reading font", .. }), "{err:?}");
    }
}
