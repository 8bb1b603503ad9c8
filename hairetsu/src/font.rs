//! A single font within a container.

use std::fmt;
use std::sync::Arc;

use read_fonts::{FontRef, ReadError, TableProvider};
use skrifa::instance::{LocationRef, Size};
use skrifa::string::StringId;
use skrifa::MetadataProvider;

use crate::face::Face;
use crate::geometry::{Rect, Vec2};
use crate::glyph::GlyphType;
use crate::metrics::{FontMetrics, GlyphMetrics};
use crate::{Error, GlyphId, GLYPH_MISSING};

/// One font of a [`FontFile`](crate::FontFile).
///
/// A font is an immutable, cheaply cloneable handle: clones share the
/// underlying font data and all descriptive metadata, which is extracted
/// once at construction. Scaling and rendering state live on
/// [`Face`]s created from the font.
#[derive(Clone)]
pub struct Font {
    inner: Arc<FontInner>,
}

struct FontInner {
    data: Arc<Vec<u8>>,
    index: u32,
    name: String,
    family: String,
    subfamily: String,
    kinds: GlyphType,
    upem: u16,
    lowest_ppem: u16,
    glyph_count: u16,
    metrics: FontMetrics,
}

impl Font {
    /// Binds font `index` of the container in `data`.
    ///
    /// Fails if the index is out of range or the font's required tables do
    /// not parse. Metadata that is merely optional (names, vertical
    /// metrics, bitmap strikes) degrades to defaults instead of failing.
    pub(crate) fn new(data: Arc<Vec<u8>>, index: u32) -> Result<Self, Error> {
        let font = FontRef::from_index(&data, index)?;
        let head = font.head()?;
        let upem = head.units_per_em();
        let lowest_ppem = head.lowest_rec_ppem();
        let glyph_count = font.maxp()?.num_glyphs();
        let kinds = available_kinds(&font);
        let name = string(&font, StringId::FULL_NAME);
        let family = string(&font, StringId::FAMILY_NAME);
        let subfamily = string(&font, StringId::SUBFAMILY_NAME);
        let metrics = design_metrics(&font);
        log::debug!(
            "bound font {index} ({name:?}): {glyph_count} glyphs, {upem} upem, kinds {kinds:?}"
        );
        Ok(Self {
            inner: Arc::new(FontInner {
                data,
                index,
                name,
                family,
                subfamily,
                kinds,
                upem,
                lowest_ppem,
                glyph_count,
                metrics,
            }),
        })
    }

    /// Re-binds the underlying table directory.
    ///
    /// The data was validated at construction, so this only fails if the
    /// container is malformed in a way the initial parse did not touch.
    pub(crate) fn raw(&self) -> Result<FontRef<'_>, ReadError> {
        FontRef::from_index(&self.inner.data, self.inner.index)
    }

    /// Full name of the font, e.g. "Noto Sans Bold".
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Family name, e.g. "Noto Sans".
    pub fn family(&self) -> &str {
        &self.inner.family
    }

    /// Subfamily (style) name, e.g. "Bold".
    pub fn subfamily(&self) -> &str {
        &self.inner.subfamily
    }

    /// The glyph representations this font carries.
    pub fn glyph_types(&self) -> GlyphType {
        self.inner.kinds
    }

    /// Number of glyphs in the font.
    pub fn glyph_count(&self) -> u16 {
        self.inner.glyph_count
    }

    /// Design units per em.
    pub fn upem(&self) -> u16 {
        self.inner.upem
    }

    /// Smallest readable size in pixels per em, as recommended by the
    /// designer.
    pub fn lowest_ppem(&self) -> u16 {
        self.inner.lowest_ppem
    }

    /// Global metrics in font design units.
    pub fn metrics(&self) -> FontMetrics {
        self.inner.metrics
    }

    /// Maps a character to its glyph identifier.
    ///
    /// Returns [`GLYPH_MISSING`] when the character mapping has no entry;
    /// this is not an error.
    pub fn find_glyph(&self, codepoint: char) -> GlyphId {
        self.find_glyph_raw(codepoint as u32)
    }

    /// [`find_glyph`](Self::find_glyph) for a raw codepoint value.
    pub fn find_glyph_raw(&self, codepoint: u32) -> GlyphId {
        self.raw()
            .ok()
            .and_then(|font| font.charmap().map(codepoint))
            .unwrap_or(GLYPH_MISSING)
    }

    /// Metrics for a single glyph in font design units.
    pub fn glyph_metrics(&self, glyph_id: GlyphId) -> GlyphMetrics {
        let Ok(font) = self.raw() else {
            return GlyphMetrics::default();
        };
        let metrics = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let advance_x = metrics.advance_width(glyph_id).unwrap_or_default();
        let advance_y = font
            .vmtx()
            .ok()
            .and_then(|vmtx| vmtx.advance(glyph_id))
            .map(f32::from)
            .unwrap_or_default();
        let bounds = metrics
            .bounds(glyph_id)
            .map(|b| {
                Rect::new(
                    Vec2::new(b.x_min, b.y_min),
                    Vec2::new(b.x_max, b.y_max),
                )
            })
            .unwrap_or_default();
        let bearing_x = metrics.left_side_bearing(glyph_id).unwrap_or_default();
        GlyphMetrics {
            bounds,
            bearing: Vec2::new(bearing_x, bounds.max.y),
            advance: Vec2::new(advance_x, advance_y),
            ..Default::default()
        }
    }

    /// Creates a new face for scaling and rendering this font.
    ///
    /// The face starts at the font's design size (`ppem == upem`, scale 1)
    /// with hinting disabled.
    pub fn create_face(&self) -> Face {
        Face::new(self.clone())
    }

    pub(crate) fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.inner.name)
            .field("index", &self.inner.index)
            .field("glyph_count", &self.inner.glyph_count)
            .field("kinds", &self.inner.kinds)
            .finish()
    }
}

fn string(font: &FontRef, id: StringId) -> String {
    font.localized_strings(id)
        .english_or_first()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn available_kinds(font: &FontRef) -> GlyphType {
    use skrifa::bitmap::BitmapFormat;
    use skrifa::outline::OutlineGlyphFormat;
    let mut kinds = GlyphType::NONE;
    match font.outline_glyphs().format() {
        Some(OutlineGlyphFormat::Glyf) => kinds |= GlyphType::TTF,
        Some(OutlineGlyphFormat::Cff) => kinds |= GlyphType::CFF,
        Some(OutlineGlyphFormat::Cff2) => kinds |= GlyphType::CFF2,
        // VARC composites draw through their glyf component glyphs.
        Some(OutlineGlyphFormat::Varc) => kinds |= GlyphType::TTF,
        None => {}
    }
    match skrifa::bitmap::BitmapStrikes::new(font).format() {
        Some(BitmapFormat::Sbix) => kinds |= GlyphType::SBIX,
        Some(BitmapFormat::Ebdt) => kinds |= GlyphType::EBDT,
        Some(BitmapFormat::Cbdt) => kinds |= GlyphType::CBDT,
        None => {}
    }
    if font.svg().is_ok() {
        kinds |= GlyphType::SVG;
    }
    kinds
}

/// Collects the global metrics from the horizontal and (when present)
/// vertical header tables.
fn design_metrics(font: &FontRef) -> FontMetrics {
    let mut metrics = FontMetrics::default();
    if let Ok(hhea) = font.hhea() {
        metrics.ascender.x = hhea.ascender().to_i16() as f32;
        metrics.descender.x = hhea.descender().to_i16() as f32;
        metrics.line_gap.x = hhea.line_gap().to_i16() as f32;
        metrics.max_extent.x = hhea.x_max_extent().to_i16() as f32;
        metrics.max_advance.x = hhea.advance_width_max().to_u16() as f32;
        metrics.min_bearing_start.x = hhea.min_left_side_bearing().to_i16() as f32;
        metrics.min_bearing_end.x = hhea.min_right_side_bearing().to_i16() as f32;
    }
    if let Ok(vhea) = font.vhea() {
        metrics.ascender.y = vhea.ascender().to_i16() as f32;
        metrics.descender.y = vhea.descender().to_i16() as f32;
        metrics.line_gap.y = vhea.line_gap().to_i16() as f32;
        metrics.max_extent.y = vhea.y_max_extent().to_i16() as f32;
        metrics.max_advance.y = vhea.advance_height_max().to_u16() as f32;
        metrics.min_bearing_start.y = vhea.min_top_side_bearing().to_i16() as f32;
        metrics.min_bearing_end.y = vhea.min_bottom_side_bearing().to_i16() as f32;
    }
    metrics
}

#[cfg(test)]
mod tests {
    use crate::test_font;
    use crate::{GlyphType, GLYPH_MISSING};

    #[test]
    fn metadata_is_extracted() {
        let file = test_font::simple_file();
        let font = file.font(0).unwrap();
        assert_eq!(font.upem(), test_font::UPEM);
        assert!(font.glyph_count() >= 2);
        assert!(font.glyph_types().contains(GlyphType::TTF));
        assert!(!font.glyph_types().intersects(GlyphType::BITMAP));
    }

    #[test]
    fn character_lookup() {
        let file = test_font::simple_file();
        let font = file.font(0).unwrap();
        let gid = font.find_glyph('A');
        assert_ne!(gid, GLYPH_MISSING);
        // Unmapped characters report the missing glyph, not an error.
        assert_eq!(font.find_glyph('\u{3042}'), GLYPH_MISSING);
    }

    #[test]
    fn design_unit_metrics() {
        let file = test_font::simple_file();
        let font = file.font(0).unwrap();
        let metrics = font.metrics();
        assert_eq!(metrics.ascender.x, test_font::ASCENDER as f32);
        assert_eq!(metrics.descender.x, test_font::DESCENDER as f32);
        // No vertical tables in the test font.
        assert_eq!(metrics.ascender.y, 0.0);

        let gid = font.find_glyph('A');
        let glyph = font.glyph_metrics(gid);
        assert_eq!(glyph.advance.x, test_font::ADVANCE as f32);
        assert_eq!(glyph.scale, 1.0);
    }

    #[test]
    fn clones_share_identity() {
        let file = test_font::simple_file();
        let font = file.font(0).unwrap();
        let clone = font.clone();
        assert!(super::Font::ptr_eq(&font, &clone));
    }
}
