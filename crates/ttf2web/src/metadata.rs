//! Font metadata used in `@font-face` rules.

use std::{fmt, fs, path::Path, str::FromStr};

use font_subset::NameTable;

use crate::Error;

/// Value of the CSS `font-style` descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FontStyle {
    /// Upright font.
    #[default]
    Normal,
    /// Italic font.
    Italic,
}

impl FontStyle {
    /// Returns the CSS keyword for this style.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "italic" => Ok(Self::Italic),
            _ => Err(format!("unknown font style `{s}`; expected `normal` or `italic`")),
        }
    }
}

/// Font family, style and weight as used in `@font-face` rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMetadata {
    /// Font family name.
    pub family: String,
    /// Value of the `font-style` descriptor.
    pub style: FontStyle,
    /// Value of the `font-weight` descriptor, e.g. `400`.
    pub weight: String,
}

impl FontMetadata {
    /// Derives metadata from the family and subfamily names.
    ///
    /// The style is `italic` only if the subfamily is exactly `Italic`, and the weight is `700`
    /// only if the subfamily is exactly `Bold`. Other subfamilies (including `Bold Italic`)
    /// produce the `normal` style and `400` weight.
    pub fn from_names(family: &str, subfamily: &str) -> Self {
        Self {
            family: family.to_owned(),
            style: if subfamily == "Italic" {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            },
            weight: if subfamily == "Bold" { "700" } else { "400" }.to_owned(),
        }
    }

    /// Reads metadata from the `name` table of the font at `path`. Glyph data is not parsed.
    ///
    /// # Errors
    ///
    /// - Returns an error if the font cannot be read or if its `name` table is malformed.
    /// - Returns [`Error::MissingFontMetadata`] if the font has no family name.
    pub fn from_font_path(path: &Path) -> Result<Self, Error> {
        let font_bytes = fs::read(path).map_err(|err| Error::io("reading font", path, err))?;
        let names = NameTable::from_font_data(&font_bytes).map_err(|source| Error::FontLoad {
            path: path.to_owned(),
            subset: None,
            source,
        })?;

        let family = names
            .family()
            .filter(|family| !family.is_empty())
            .ok_or_else(|| Error::MissingFontMetadata {
                path: path.to_owned(),
            })?;
        let subfamily = names.subfamily().unwrap_or_default();
        log::debug!("Read font family `{family}`, subfamily `{subfamily}` from {}", path.display());
        Ok(Self::from_names(&family, &subfamily))
    }

    /// Overrides the font style.
    #[must_use]
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    /// Overrides the font weight.
    #[must_use]
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }
}
