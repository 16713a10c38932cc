//! Glyph data from the `glyf` table.

use super::Cursor;
use crate::ParseError;

/// Glyph outline. Only composite glyphs are parsed; their components need to be remapped
/// when subsetting.
#[derive(Debug)]
pub(crate) enum Glyph<'a> {
    Empty,
    Simple(&'a [u8]),
    Composite {
        /// Bounding box: xMin, yMin, xMax, yMax
        bbox: [u8; 8],
        components: Vec<GlyphComponent<'a>>,
        /// Instructions following the last component, if any.
        instructions: &'a [u8],
    },
}

impl<'a> Glyph<'a> {
    pub(super) fn parse(raw: Cursor<'a>) -> Result<Self, ParseError> {
        if raw.bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let mut cursor = raw;
        // `numberOfContours` is negative for composite glyphs.
        if cursor.read_u16()? & 0x8000 == 0 {
            return Ok(Self::Simple(raw.bytes));
        }

        let bbox = cursor.read_byte_array::<8>()?;
        let mut components = vec![];
        loop {
            let component = GlyphComponent::parse(&mut cursor)?;
            let has_more = component.has_more();
            components.push(component);
            if !has_more {
                break;
            }
        }
        Ok(Self::Composite {
            bbox,
            components,
            instructions: cursor.bytes,
        })
    }
}

/// Component of a composite glyph. Everything except for the glyph index is retained as is.
#[derive(Debug)]
pub(crate) struct GlyphComponent<'a> {
    pub(crate) flags: u16,
    pub(crate) glyph_idx: u16,
    /// Offset arguments and the optional transform.
    pub(crate) tail: &'a [u8],
}

impl<'a> GlyphComponent<'a> {
    const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
    const WE_HAVE_A_SCALE: u16 = 0x0008;
    const MORE_COMPONENTS: u16 = 0x0020;
    const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
    const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

    fn tail_len(flags: u16) -> usize {
        let args_len = if flags & Self::ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        let transform_len = if flags & Self::WE_HAVE_A_SCALE != 0 {
            2
        } else if flags & Self::WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            4
        } else if flags & Self::WE_HAVE_A_TWO_BY_TWO != 0 {
            8
        } else {
            0
        };
        args_len + transform_len
    }

    fn parse(cursor: &mut Cursor<'a>) -> Result<Self, ParseError> {
        let flags = cursor.read_u16()?;
        let glyph_idx = cursor.read_u16()?;
        let tail = cursor.split_at(Self::tail_len(flags))?.bytes;
        Ok(Self {
            flags,
            glyph_idx,
            tail,
        })
    }

    fn has_more(&self) -> bool {
        self.flags & Self::MORE_COMPONENTS != 0
    }
}

/// [`Glyph`] together with metrics read from the `hmtx` table.
#[derive(Debug)]
pub(crate) struct GlyphWithMetrics<'a> {
    pub(crate) inner: Glyph<'a>,
    pub(crate) advance: u16,
    pub(crate) lsb: u16,
}
