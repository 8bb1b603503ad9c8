//! Global font and glyph specific metrics.
//!
//! Both metric types are expressed with two dimensional vectors: the `x`
//! component carries the value used for horizontal layout (from the `hhea`
//! and `hmtx` tables) and the `y` component the value used for vertical
//! layout (from `vhea`/`vmtx` when the font provides them, zero otherwise).
//!
//! A [`Font`](crate::Font) reports metrics in font design units; a
//! [`Face`](crate::Face) reports the same metrics multiplied by its current
//! scale factor.

use crate::geometry::{Rect, Vec2};

/// Metrics shared between all glyphs in a font.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
#[repr(C)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the alignment box.
    pub ascender: Vec2,
    /// Distance from the baseline to the bottom of the alignment box.
    pub descender: Vec2,
    /// Recommended additional spacing between lines.
    pub line_gap: Vec2,
    /// Maximum extent reached by any glyph.
    pub max_extent: Vec2,
    /// Maximum advance of any glyph.
    pub max_advance: Vec2,
    /// Minimum bearing at the start of a glyph (left/top side).
    pub min_bearing_start: Vec2,
    /// Minimum bearing at the end of a glyph (right/bottom side).
    pub min_bearing_end: Vec2,
}

impl FontMetrics {
    /// Returns these metrics with every value multiplied by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            ascender: self.ascender.scaled(factor),
            descender: self.descender.scaled(factor),
            line_gap: self.line_gap.scaled(factor),
            max_extent: self.max_extent.scaled(factor),
            max_advance: self.max_advance.scaled(factor),
            min_bearing_start: self.min_bearing_start.scaled(factor),
            min_bearing_end: self.min_bearing_end.scaled(factor),
        }
    }
}

/// Metrics for a single glyph.
#[derive(Copy, Clone, PartialEq, Debug)]
#[repr(C)]
pub struct GlyphMetrics {
    /// The bounding box of the glyph.
    pub bounds: Rect,
    /// The bearing for the glyph: left side bearing in `x`, top side
    /// bearing in `y`.
    pub bearing: Vec2,
    /// The advance for the glyph.
    pub advance: Vec2,
    /// The overall scale applied to the glyph.
    pub scale: f32,
    /// Synthetic thickness to apply when rendering.
    pub thickness: f32,
    /// Synthetic shear to apply when rendering.
    pub shear: f32,
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            bearing: Vec2::ZERO,
            advance: Vec2::ZERO,
            scale: 1.0,
            thickness: 1.0,
            shear: 0.0,
        }
    }
}

impl GlyphMetrics {
    /// Returns these metrics scaled by `factor`, recording the factor in
    /// the `scale` field. Synthetic thickness and shear are unaffected.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            bounds: self.bounds.scaled(factor),
            bearing: self.bearing.scaled(factor),
            advance: self.advance.scaled(factor),
            scale: self.scale * factor,
            thickness: self.thickness,
            shear: self.shear,
        }
    }
}
