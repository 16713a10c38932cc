//! Splits TrueType fonts into WOFF2 subsets and generates a CSS stylesheet with `@font-face` rules
//! for them.
//!
//! Each subset covers a named set of Unicode code points (e.g., `latin` or `cyrillic`) and is
//! referenced from the stylesheet together with its `unicode-range`, so that browsers only
//! download subsets for the chars present on a page.
//!
//! Layout tables (`GSUB`, `GPOS` and `kern`) are not retained in subsets; see
//! [`font_subset`] for other limitations of the subsetting engine.
//!
//! # Examples
//!
//! ```no_run
//! use ttf2web::{Options, Ttf2Web};
//!
//! let mut options = Options::new("fonts/ExampleSans-Regular.ttf");
//! options.asset_dir = "static/fonts".into();
//! let report = Ttf2Web::new(options)?.run()?;
//! for subset in &report.subsets {
//!     println!("{}: {}", subset.name, subset.output_path.display());
//! }
//! println!("stylesheet: {}", report.css_path.display());
//! # Ok::<_, ttf2web::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/ttf2web/0.1.0")]

use std::path::PathBuf;

pub use crate::{
    catalog::{SubsetCatalog, SubsetSpec},
    css::{render_font_face, write_stylesheet},
    errors::Error,
    metadata::{FontMetadata, FontStyle},
    processor::{SubsetProcessor, SubsetResult},
};

mod catalog;
mod css;
mod errors;
mod metadata;
mod processor;

/// Options for [`Ttf2Web`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Options {
    /// Path to the source TrueType font.
    pub font_path: PathBuf,
    /// Path to the subset catalog. If not specified, the [built-in catalog](SubsetCatalog::builtin())
    /// is used.
    pub catalog_path: Option<PathBuf>,
    /// Directory to write subset files to. Created if missing.
    pub asset_dir: PathBuf,
    /// Path to the generated stylesheet. If not specified, it is `<basename>.css` in the working
    /// directory, where `<basename>` is the font file name without the extension.
    pub css_path: Option<PathBuf>,
    /// Overrides the `font-style` derived from the font subfamily.
    pub font_style: Option<FontStyle>,
    /// Overrides the `font-weight` derived from the font subfamily.
    pub font_weight: Option<String>,
}

impl Options {
    /// Default directory for subset files.
    pub const DEFAULT_ASSET_DIR: &'static str = "assets";

    /// Creates options with default values for the specified font.
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            catalog_path: None,
            asset_dir: Self::DEFAULT_ASSET_DIR.into(),
            css_path: None,
            font_style: None,
            font_weight: None,
        }
    }
}

/// Outcome of a [`Ttf2Web::run()`].
#[derive(Debug)]
#[non_exhaustive]
pub struct Report {
    /// Path to the generated stylesheet.
    pub css_path: PathBuf,
    /// Generated subsets in the catalog order. Subsets not covered by the font are skipped.
    pub subsets: Vec<SubsetResult>,
}

/// Font conversion pipeline.
#[derive(Debug)]
pub struct Ttf2Web {
    options: Options,
    metadata: FontMetadata,
}

impl Ttf2Web {
    /// Prepares conversion by reading font metadata and applying overrides from `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be read, or has no family name.
    pub fn new(options: Options) -> Result<Self, Error> {
        let mut metadata = FontMetadata::from_font_path(&options.font_path)?;
        if let Some(style) = options.font_style {
            metadata = metadata.with_style(style);
        }
        if let Some(weight) = &options.font_weight {
            metadata = metadata.with_weight(weight.as_str());
        }
        Ok(Self { options, metadata })
    }

    /// Returns metadata used in the generated stylesheet.
    pub fn metadata(&self) -> &FontMetadata {
        &self.metadata
    }

    /// Returns the path to the generated stylesheet.
    pub fn css_path(&self) -> PathBuf {
        self.options.css_path.clone().unwrap_or_else(|| {
            let basename = processor::font_basename(&self.options.font_path);
            PathBuf::from(format!("{basename}.css"))
        })
    }

    /// Loads the subset catalog, generates subset files and writes the stylesheet.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. Subset files generated before the error
    /// are retained.
    pub fn run(&self) -> Result<Report, Error> {
        let catalog = match &self.options.catalog_path {
            Some(path) => SubsetCatalog::from_path(path)?,
            None => SubsetCatalog::builtin(),
        };
        log::debug!("Loaded {} subsets", catalog.len());

        let processor = SubsetProcessor::new(&self.options.font_path, &self.options.asset_dir);
        let subsets = processor.process_all(&catalog)?;

        let css_path = self.css_path();
        write_stylesheet(&css_path, &self.metadata, &subsets)?;
        Ok(Report { css_path, subsets })
    }
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
