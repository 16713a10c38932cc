use std::collections::{BTreeMap, BTreeSet};

use crate::{
    errors::ParseErrorKind,
    font::{Font, Glyph, GlyphWithMetrics},
    ParseError, TableTag,
};

/// Subset of a [`Font`] produced by removing some of its glyphs and related data.
///
/// The subset retains glyphs for the requested chars that are present in the font,
/// together with all glyphs they reference as composite components.
#[derive(Debug)]
pub struct FontSubset<'a> {
    pub(crate) font: Font<'a>,
    pub(crate) char_map: Vec<(char, u16)>,
    pub(crate) old_to_new_glyph_idx: BTreeMap<u16, u16>,
    pub(crate) glyphs: Vec<GlyphWithMetrics<'a>>,
}

impl<'a> FontSubset<'a> {
    /// Guards against cyclic component references.
    const MAX_COMPONENT_DEPTH: usize = 16;

    /// Creates a subset of `font` restricted to `chars`. Chars not covered by the font are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the glyph data for any of the covered chars is malformed.
    pub fn new(font: Font<'a>, chars: &BTreeSet<char>) -> Result<Self, ParseError> {
        let mut this = Self::empty(font)?;
        for &ch in chars {
            this.push_char(ch)?;
        }
        Ok(this)
    }

    fn empty(font: Font<'a>) -> Result<Self, ParseError> {
        let mut missing_glyph = font.glyph(0)?;
        let mut this = Self {
            font,
            char_map: vec![],
            // The 0th glyph must always be mapped to itself
            old_to_new_glyph_idx: BTreeMap::from([(0, 0)]),
            // Replaced with the missing glyph once its components are remapped
            glyphs: vec![GlyphWithMetrics {
                inner: Glyph::Empty,
                advance: 0,
                lsb: 0,
            }],
        };
        this.remap_components(&mut missing_glyph, 0)?;
        this.glyphs[0] = missing_glyph;
        Ok(this)
    }

    fn remap_components(
        &mut self,
        glyph: &mut GlyphWithMetrics<'a>,
        depth: usize,
    ) -> Result<(), ParseError> {
        if let Glyph::Composite { components, .. } = &mut glyph.inner {
            for component in components {
                component.glyph_idx = self.ensure_glyph(component.glyph_idx, depth + 1)?;
            }
        }
        Ok(())
    }

    fn ensure_glyph(&mut self, old_idx: u16, depth: usize) -> Result<u16, ParseError> {
        if let Some(new_idx) = self.old_to_new_glyph_idx.get(&old_idx) {
            return Ok(*new_idx);
        }
        if depth > Self::MAX_COMPONENT_DEPTH {
            return Err(ParseError {
                kind: ParseErrorKind::ComponentDepth(old_idx),
                offset: 0,
                table: Some(TableTag::GLYF),
            });
        }

        let mut glyph = self.font.glyph(old_idx)?;
        self.remap_components(&mut glyph, depth)?;

        // The subset cannot have more glyphs than the original font, which are indexed by `u16`.
        let new_idx = u16::try_from(self.glyphs.len()).unwrap_or(u16::MAX);
        self.glyphs.push(glyph);
        self.old_to_new_glyph_idx.insert(old_idx, new_idx);
        Ok(new_idx)
    }

    /// Must be called with increasing `ch`.
    fn push_char(&mut self, ch: char) -> Result<(), ParseError> {
        let old_idx = self.font.map_char(ch)?;
        if old_idx == 0 {
            return Ok(()); // the font doesn't cover `ch`
        }
        let new_idx = self.ensure_glyph(old_idx, 0)?;
        self.char_map.push((ch, new_idx));
        Ok(())
    }

    /// Checks whether the subset maps no chars, i.e., the font doesn't cover any of the requested chars.
    pub fn is_empty(&self) -> bool {
        self.char_map.is_empty()
    }

    /// Returns chars mapped by this subset in increasing order.
    pub fn chars(&self) -> impl ExactSizeIterator<Item = char> + '_ {
        self.char_map.iter().map(|&(ch, _)| ch)
    }

    /// Returns the number of glyphs in this subset, *excluding* the missing glyph `.notdef`.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len() - 1
    }
}

impl<'a> Font<'a> {
    /// Creates a subset of this font restricted to `chars`. This is a shortcut for [`FontSubset::new()`].
    ///
    /// # Errors
    ///
    /// Returns an error if the glyph data for any of the covered chars is malformed.
    pub fn subset(self, chars: &BTreeSet<char>) -> Result<FontSubset<'a>, ParseError> {
        FontSubset::new(self, chars)
    }
}
