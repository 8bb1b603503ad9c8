//! Realized glyphs and glyph type flags.

use bitflags::bitflags;
use kurbo::BezPath;

use crate::bitmap::EmbeddedBitmap;
use crate::metrics::GlyphMetrics;
use crate::raster::Coverage;
use crate::GlyphId;

bitflags! {
    /// Bit-flags describing the representations a glyph may carry.
    ///
    /// Callers request glyph data with an OR of acceptable flags (for
    /// example [`GlyphType::OUTLINE`] for "any outline") and receive the
    /// single flag that was actually resolved.
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
    pub struct GlyphType: u32 {
        /// Embedded PNG bitmap from the `sbix` table.
        const SBIX = 0x01;
        /// Embedded monochrome/gray bitmap from the `EBDT` table.
        const EBDT = 0x02;
        /// Embedded color bitmap from the `CBDT` table.
        const CBDT = 0x04;
        /// Any embedded bitmap representation.
        const BITMAP = Self::SBIX.bits() | Self::EBDT.bits() | Self::CBDT.bits();

        /// TrueType (`glyf`) outline.
        const TTF = 0x10;
        /// PostScript (`CFF`) outline.
        const CFF = 0x20;
        /// PostScript (`CFF2`) outline.
        const CFF2 = 0x40;
        /// Any outline representation.
        const OUTLINE = Self::TTF.bits() | Self::CFF.bits() | Self::CFF2.bits();

        /// SVG document from the `SVG` table.
        const SVG = 0x100;
        /// Any representation.
        const ANY = Self::BITMAP.bits() | Self::OUTLINE.bits() | Self::SVG.bits();
    }
}

impl GlyphType {
    /// No representation; the glyph carries no data.
    pub const NONE: Self = Self::empty();
}

/// The realized representation of a glyph.
#[derive(Clone, Debug)]
pub(crate) enum GlyphSource {
    /// No data was resolved for the glyph.
    None,
    /// Outline geometry in pixel space, y-up, origin on the baseline.
    Outline(BezPath),
    /// Embedded bitmap decoded to an 8-bit coverage plane.
    Bitmap(EmbeddedBitmap),
    /// Raw (possibly compressed) SVG document bytes.
    Svg(Vec<u8>),
}

/// A glyph resolved through a [`Face`](crate::Face).
///
/// The glyph carries one of the representations described by
/// [`GlyphType`] together with metrics already scaled to the face
/// configuration it was resolved through. It is owned by the caller that
/// requested it; resolving the same identifier again produces a fresh,
/// independent glyph.
#[derive(Clone, Debug)]
pub struct Glyph {
    id: GlyphId,
    kind: GlyphType,
    source: GlyphSource,
    metrics: GlyphMetrics,
}

impl Glyph {
    pub(crate) fn new(
        id: GlyphId,
        kind: GlyphType,
        source: GlyphSource,
        metrics: GlyphMetrics,
    ) -> Self {
        Self {
            id,
            kind,
            source,
            metrics,
        }
    }

    /// Creates a glyph representing "no data resolved".
    ///
    /// This is the normal result for [`GLYPH_MISSING`](crate::GLYPH_MISSING)
    /// or for an identifier none of the faces in the fallback chain can
    /// represent; it is not an error.
    pub(crate) fn none(id: GlyphId) -> Self {
        Self {
            id,
            kind: GlyphType::NONE,
            source: GlyphSource::None,
            metrics: GlyphMetrics::default(),
        }
    }

    /// Returns the glyph identifier this glyph was resolved for.
    pub fn id(&self) -> GlyphId {
        self.id
    }

    /// Returns the single type flag that was resolved, or
    /// [`GlyphType::NONE`].
    pub fn glyph_type(&self) -> GlyphType {
        self.kind
    }

    /// Returns the glyph metrics, scaled to the resolving face.
    pub fn metrics(&self) -> GlyphMetrics {
        self.metrics
    }

    /// Returns true if the glyph resolved to any representation.
    pub fn has_data(&self) -> bool {
        !matches!(self.source, GlyphSource::None)
    }

    /// Returns the outline geometry, if the glyph resolved to an outline.
    ///
    /// Coordinates are in pixel space (scaled to the face configuration),
    /// y-up, with the origin on the baseline.
    pub fn outline(&self) -> Option<&BezPath> {
        match &self.source {
            GlyphSource::Outline(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the raw bytes of the SVG document, if the glyph resolved to
    /// an SVG representation. The document may be gzip compressed.
    pub fn svg_data(&self) -> Option<&[u8]> {
        match &self.source {
            GlyphSource::Svg(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the SVG document as text, if the glyph resolved to an
    /// uncompressed UTF-8 SVG representation.
    pub fn svg(&self) -> Option<&str> {
        std::str::from_utf8(self.svg_data()?).ok()
    }

    pub(crate) fn source(&self) -> &GlyphSource {
        &self.source
    }

    /// Rasterizes the glyph to an anti-aliased coverage bitmap.
    ///
    /// See [`Coverage`] for the buffer layout. The buffer is a fresh
    /// allocation on every call; rasterizing the same glyph twice yields
    /// byte-identical results.
    pub fn rasterize(&self) -> Coverage {
        crate::raster::rasterize(self, true)
    }

    /// Rasterizes the glyph to a binary (0 or 255) coverage bitmap.
    pub fn rasterize_aliased(&self) -> Coverage {
        crate::raster::rasterize(self, false)
    }
}
