// SPDX-License-Identifier: MPL-2.0

//! Overlay text rasterized from the embedded Hack font
//!
//! Glyphs are outlined with `ab_glyph` and handed out with their pixel
//! bounds; callers blend the coverage into their own pixel buffer.

use ab_glyph::{Font, FontRef, GlyphId, InvalidFont, OutlinedGlyph, ScaleFont, point};

/// Monospace font used for every overlay field
#[derive(Debug, Clone)]
pub struct OverlayFont {
    font: FontRef<'static>,
}

impl OverlayFont {
    pub fn load() -> Result<Self, InvalidFont> {
        let font = FontRef::try_from_slice(epaint_default_fonts::HACK_REGULAR)?;
        Ok(Self { font })
    }

    /// Distance from the top of a `px`-high line to its baseline
    pub fn ascent(&self, px: f32) -> f32 {
        self.font.as_scaled(px).ascent()
    }

    /// Advance width of `text` at `px`, kerning included
    pub fn text_width(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(px);
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for c in text.chars() {
            let id = self.font.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    /// Outlines for `text` laid out on one line from (`left`, `baseline`)
    ///
    /// Whitespace and characters the font lacks produce no outline but
    /// still advance the caret.
    pub fn outline(&self, text: &str, px: f32, left: f32, baseline: f32) -> Vec<OutlinedGlyph> {
        let scaled = self.font.as_scaled(px);
        let mut caret = left;
        let mut previous: Option<GlyphId> = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars() {
            let id = self.font.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(px, point(caret, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        glyphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_font_loads() {
        let font = OverlayFont::load().unwrap();
        assert!(font.ascent(20.0) > 10.0);
        assert!(font.ascent(20.0) < 20.0);
    }

    #[test]
    fn test_monospace_width() {
        let font = OverlayFont::load().unwrap();
        let one = font.text_width("0", 20.0);
        assert!(one > 0.0);
        assert!((font.text_width("0123456789", 20.0) - one * 10.0).abs() < 0.5);
        assert_eq!(font.text_width("", 20.0), 0.0);
    }

    #[test]
    fn test_spaces_advance_without_outline() {
        let font = OverlayFont::load().unwrap();
        let glyphs = font.outline("4 2", 20.0, 0.0, 16.0);
        assert_eq!(glyphs.len(), 2);
        let gap = glyphs[1].px_bounds().min.x - glyphs[0].px_bounds().min.x;
        assert!(gap >= font.text_width("4 ", 20.0) - 1.0);
    }

    #[test]
    fn test_outline_covers_pixels() {
        let font = OverlayFont::load().unwrap();
        let glyphs = font.outline("km/h", 24.0, 0.0, 20.0);
        let mut covered = 0;
        for glyph in &glyphs {
            glyph.draw(|_, _, coverage| {
                if coverage > 0.5 {
                    covered += 1;
                }
            });
        }
        assert!(covered > 20);
    }
}
