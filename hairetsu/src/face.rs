//! Scaled, configurable views of a font.

use std::fmt;
use std::sync::{Arc, Weak};

use kurbo::BezPath;
use parking_lot::RwLock;
use read_fonts::TableProvider;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, HintingInstance, HintingOptions, OutlinePen};
use skrifa::MetadataProvider;

use crate::font::Font;
use crate::glyph::{Glyph, GlyphSource, GlyphType};
use crate::metrics::{FontMetrics, GlyphMetrics};
use crate::{GlyphId, GLYPH_MISSING};

/// Upper bound on the fallback chain walk.
///
/// Cycles are rejected when a fallback is assigned, but faces on the
/// chain mutate independently, so resolution still bounds the walk.
const MAX_FALLBACK_DEPTH: usize = 32;

/// A view of a [`Font`] at a particular size.
///
/// Faces carry the mutable rendering configuration: size in pixels or
/// points, dots per inch, hinting, and an optional fallback face
/// consulted when this face cannot provide a requested glyph. Clones are
/// cheap handles onto the same configuration; reconfiguring one clone is
/// observed by all of them.
///
/// The fallback reference is non-owning: dropping the last real handle to
/// a fallback face detaches it from every chain it was part of.
#[derive(Clone)]
pub struct Face {
    inner: Arc<FaceInner>,
}

struct FaceInner {
    font: Font,
    state: RwLock<FaceState>,
}

struct FaceState {
    /// Effective size in pixels per em.
    px: f32,
    /// Point size, when the face was last configured in points.
    pt: Option<f32>,
    dpi: f32,
    hinting: bool,
    fallback: Option<Weak<FaceInner>>,
}

impl Face {
    pub(crate) fn new(font: Font) -> Self {
        let px = font.upem() as f32;
        Self {
            inner: Arc::new(FaceInner {
                font,
                state: RwLock::new(FaceState {
                    px,
                    pt: None,
                    dpi: 96.0,
                    hinting: false,
                    fallback: None,
                }),
            }),
        }
    }

    /// The font this face views.
    pub fn font(&self) -> &Font {
        &self.inner.font
    }

    /// Design units per em of the underlying font.
    pub fn upem(&self) -> u16 {
        self.inner.font.upem()
    }

    /// Number of glyphs in the underlying font.
    pub fn glyph_count(&self) -> u16 {
        self.inner.font.glyph_count()
    }

    /// Current size in pixels per em.
    pub fn px(&self) -> f32 {
        self.inner.state.read().px
    }

    /// Sets the size in pixels per em and clears any point size.
    pub fn set_px(&self, px: f32) {
        let mut state = self.inner.state.write();
        state.px = px.max(0.0);
        state.pt = None;
    }

    /// Current size in points, derived from the pixel size when the face
    /// was configured in pixels.
    pub fn pt(&self) -> f32 {
        let state = self.inner.state.read();
        state.pt.unwrap_or(state.px * 72.0 / state.dpi)
    }

    /// Sets the size in points; the pixel size becomes `pt * dpi / 72`.
    pub fn set_pt(&self, pt: f32) {
        let mut state = self.inner.state.write();
        let pt = pt.max(0.0);
        state.pt = Some(pt);
        state.px = pt * state.dpi / 72.0;
    }

    /// Current dots-per-inch. Defaults to 96.
    pub fn dpi(&self) -> f32 {
        self.inner.state.read().dpi
    }

    /// Sets the dots-per-inch used for point conversions.
    ///
    /// When the face is configured in points the pixel size is
    /// recomputed.
    pub fn set_dpi(&self, dpi: f32) {
        let mut state = self.inner.state.write();
        state.dpi = dpi.max(1.0);
        if let Some(pt) = state.pt {
            state.px = pt * state.dpi / 72.0;
        }
    }

    /// Pixels per em; alias of [`px`](Self::px).
    pub fn ppem(&self) -> f32 {
        self.px()
    }

    /// The factor from font design units to pixels at the current size.
    pub fn scale(&self) -> f32 {
        let upem = self.upem();
        if upem == 0 {
            return 0.0;
        }
        self.px() / upem as f32
    }

    /// Whether hinting is applied to outlines.
    pub fn hinting(&self) -> bool {
        self.inner.state.read().hinting
    }

    /// Enables or disables hinting for outlines.
    pub fn set_hinting(&self, hinting: bool) {
        self.inner.state.write().hinting = hinting;
    }

    /// Global metrics scaled to the current size.
    pub fn metrics(&self) -> FontMetrics {
        self.inner.font.metrics().scaled(self.scale())
    }

    /// Metrics for `glyph_id` scaled to the current size.
    pub fn glyph_metrics(&self, glyph_id: GlyphId) -> GlyphMetrics {
        self.inner.font.glyph_metrics(glyph_id).scaled(self.scale())
    }

    /// The face consulted when this one cannot provide a glyph, if it is
    /// still alive.
    pub fn fallback(&self) -> Option<Face> {
        let weak = self.inner.state.read().fallback.clone()?;
        weak.upgrade().map(|inner| Face { inner })
    }

    /// Assigns (or with `None` clears) the fallback face.
    ///
    /// An assignment that would make this face reachable from itself is
    /// rejected: the fallback is cleared instead and a warning is logged.
    pub fn set_fallback(&self, fallback: Option<&Face>) {
        let assign = match fallback {
            Some(face) if self.reachable_from(face) => {
                log::warn!(
                    "rejected fallback assignment for {:?}: would create a cycle",
                    self.inner.font.name()
                );
                None
            }
            Some(face) => Some(Arc::downgrade(&face.inner)),
            None => None,
        };
        self.inner.state.write().fallback = assign;
    }

    /// Returns true if `self` appears in `other`'s fallback chain
    /// (including `other` itself).
    fn reachable_from(&self, other: &Face) -> bool {
        let mut current = other.inner.clone();
        for _ in 0..MAX_FALLBACK_DEPTH {
            if Arc::ptr_eq(&current, &self.inner) {
                return true;
            }
            let next = current
                .state
                .read()
                .fallback
                .as_ref()
                .and_then(Weak::upgrade);
            match next {
                Some(next) => current = next,
                None => return false,
            }
        }
        true
    }

    /// The faces consulted during resolution: this face, then live
    /// fallbacks in order.
    fn chain(&self) -> Vec<Face> {
        let mut chain = vec![self.clone()];
        let mut current = self.clone();
        while chain.len() < MAX_FALLBACK_DEPTH {
            match current.fallback() {
                Some(next) => {
                    if chain.iter().any(|f| Arc::ptr_eq(&f.inner, &next.inner)) {
                        break;
                    }
                    chain.push(next.clone());
                    current = next;
                }
                None => break,
            }
        }
        chain
    }

    /// Resolves `glyph_id` to a realized glyph.
    ///
    /// `accept` is an OR of acceptable representations; the first face on
    /// the fallback chain that can provide one wins, preferring outlines
    /// over embedded bitmaps over SVG documents. The glyph is realized
    /// with *this* face's configuration (pixel size and hinting)
    /// regardless of which face resolved it.
    ///
    /// [`GLYPH_MISSING`] and unresolvable requests yield a
    /// [`GlyphType::NONE`] glyph; neither is an error.
    pub fn glyph(&self, glyph_id: GlyphId, accept: GlyphType) -> Glyph {
        if glyph_id == GLYPH_MISSING {
            return Glyph::none(glyph_id);
        }
        let px = self.px();
        let hinting = self.hinting();
        for face in self.chain() {
            let font = face.inner.font.clone();
            if glyph_id.to_u32() >= u32::from(font.glyph_count()) {
                continue;
            }
            let available = font.glyph_types() & accept;
            if available.intersects(GlyphType::OUTLINE) {
                if let Some(glyph) = realize_outline(&font, glyph_id, px, hinting) {
                    return glyph;
                }
            }
            if available.intersects(GlyphType::BITMAP) {
                if let Some(glyph) = realize_bitmap(&font, glyph_id, px) {
                    return glyph;
                }
            }
            if available.contains(GlyphType::SVG) {
                if let Some(glyph) = realize_svg(&font, glyph_id, px) {
                    return glyph;
                }
            }
        }
        Glyph::none(glyph_id)
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Face")
            .field("font", &self.inner.font.name())
            .field("px", &state.px)
            .field("dpi", &state.dpi)
            .field("hinting", &state.hinting)
            .finish()
    }
}

/// Collects drawn outline segments into a [`BezPath`].
struct PathPen(BezPath);

impl OutlinePen for PathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.0
            .quad_to((cx0 as f64, cy0 as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.0.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.0.close_path();
    }
}

fn realize_outline(font: &Font, glyph_id: GlyphId, px: f32, hinting: bool) -> Option<Glyph> {
    let raw = font.raw().ok()?;
    let outlines = raw.outline_glyphs();
    let outline = outlines.get(glyph_id)?;
    let size = Size::new(px);
    let mut pen = PathPen(BezPath::new());
    let hinted = if hinting {
        HintingInstance::new(&outlines, size, LocationRef::default(), HintingOptions::default())
            .map_err(|e| log::warn!("hinting unavailable for {:?}: {e}", font.name()))
            .ok()
    } else {
        None
    };
    let settings = match &hinted {
        Some(instance) => DrawSettings::hinted(instance, false),
        None => DrawSettings::unhinted(size, LocationRef::default()),
    };
    if let Err(e) = outline.draw(settings, &mut pen) {
        log::warn!("failed to draw glyph {glyph_id} of {:?}: {e}", font.name());
        return None;
    }
    let scale = px / font.upem() as f32;
    let metrics = font.glyph_metrics(glyph_id).scaled(scale);
    let kind = font.glyph_types() & GlyphType::OUTLINE;
    Some(Glyph::new(
        glyph_id,
        kind,
        GlyphSource::Outline(pen.0),
        metrics,
    ))
}

fn realize_bitmap(font: &Font, glyph_id: GlyphId, px: f32) -> Option<Glyph> {
    let raw = font.raw().ok()?;
    let upem_scale = px / font.upem() as f32;
    let (bitmap, kind, mut metrics) = crate::bitmap::embedded(&raw, glyph_id, px, upem_scale)?;
    if metrics.advance.x == 0.0 {
        // sbix strikes have no advance of their own; use the hmtx one.
        metrics.advance = font.glyph_metrics(glyph_id).scaled(upem_scale).advance;
    }
    Some(Glyph::new(
        glyph_id,
        kind,
        GlyphSource::Bitmap(bitmap),
        metrics,
    ))
}

fn realize_svg(font: &Font, glyph_id: GlyphId, px: f32) -> Option<Glyph> {
    let raw = font.raw().ok()?;
    let document = raw.svg().ok()?.glyph_data(glyph_id).ok()??;
    let scale = px / font.upem() as f32;
    let metrics = font.glyph_metrics(glyph_id).scaled(scale);
    Some(Glyph::new(
        glyph_id,
        GlyphType::SVG,
        GlyphSource::Svg(document.to_vec()),
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_font;

    fn face() -> Face {
        test_font::simple_file().font(0).unwrap().create_face()
    }

    #[test]
    fn defaults_to_design_size() {
        let face = face();
        assert_eq!(face.px(), test_font::UPEM as f32);
        assert_eq!(face.scale(), 1.0);
        assert_eq!(face.dpi(), 96.0);
        assert!(!face.hinting());
    }

    #[test]
    fn pixel_and_point_sizes() {
        let face = face();
        face.set_px(20.0);
        assert_eq!(face.px(), 20.0);
        assert_eq!(face.scale(), 20.0 / test_font::UPEM as f32);

        // 12pt at 96 dpi is 16px.
        face.set_pt(12.0);
        assert_eq!(face.px(), 16.0);
        assert_eq!(face.pt(), 12.0);

        // Changing dpi re-derives the pixel size from the point size.
        face.set_dpi(192.0);
        assert_eq!(face.px(), 32.0);

        // Setting pixels directly leaves points derived.
        face.set_px(96.0);
        assert_eq!(face.pt(), 36.0);
    }

    #[test]
    fn clones_share_configuration() {
        let face = face();
        let clone = face.clone();
        face.set_px(20.0);
        assert_eq!(clone.px(), 20.0);
    }

    #[test]
    fn metrics_scale_with_size() {
        let face = face();
        face.set_px(test_font::UPEM as f32 / 2.0);
        let metrics = face.metrics();
        assert_eq!(metrics.ascender.x, test_font::ASCENDER as f32 / 2.0);

        let gid = face.font().find_glyph('A');
        let glyph = face.glyph_metrics(gid);
        assert_eq!(glyph.advance.x, test_font::ADVANCE as f32 / 2.0);
        assert_eq!(glyph.scale, 0.5);
    }

    #[test]
    fn outline_resolution_scales_to_face() {
        let face = face();
        face.set_px(20.0);
        let gid = face.font().find_glyph('A');
        let glyph = face.glyph(gid, GlyphType::ANY);
        assert_eq!(glyph.glyph_type(), GlyphType::TTF);
        assert!(glyph.has_data());
        let outline = glyph.outline().unwrap();
        // All points must fit within the em box at 20px.
        let bounds = kurbo::Shape::bounding_box(outline);
        assert!(bounds.x1 <= 20.5 && bounds.y1 <= 20.5);
        assert_eq!(glyph.metrics().scale, 20.0 / test_font::UPEM as f32);
    }

    #[test]
    fn missing_glyph_resolves_to_none() {
        let face = face();
        let glyph = face.glyph(crate::GLYPH_MISSING, GlyphType::ANY);
        assert!(!glyph.has_data());
        assert_eq!(glyph.glyph_type(), GlyphType::NONE);
    }

    #[test]
    fn mask_filters_representations() {
        let face = face();
        let gid = face.font().find_glyph('A');
        // The test font has no bitmap strikes, so restricting to bitmaps
        // resolves nothing.
        let glyph = face.glyph(gid, GlyphType::BITMAP);
        assert!(!glyph.has_data());
        let glyph = face.glyph(gid, GlyphType::OUTLINE);
        assert!(glyph.has_data());
    }

    #[test]
    fn svg_resolution_exposes_document() {
        let document = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
        let file = crate::FontFile::from_memory(test_font::with_svg(document)).unwrap();
        let face = file.font(0).unwrap().create_face();
        let gid = face.font().find_glyph('A');
        let glyph = face.glyph(gid, GlyphType::SVG);
        assert_eq!(glyph.glyph_type(), GlyphType::SVG);
        assert_eq!(glyph.svg_data(), Some(&document[..]));
        // SVG documents are exposed, not rendered.
        assert!(glyph.rasterize().is_empty());
    }

    #[test]
    fn fallback_chain_resolution() {
        // `primary` maps only 'A'; `other` maps only 'B'.
        let primary = face();
        let other = test_font::secondary_file().font(0).unwrap().create_face();
        primary.set_fallback(Some(&other));
        primary.set_px(20.0);
        other.set_px(100.0);

        let gid = other.font().find_glyph('B');
        let glyph = primary.glyph(gid, GlyphType::OUTLINE);
        assert!(glyph.has_data());
        // Scaled to the requesting face, not the resolving one.
        assert_eq!(glyph.metrics().scale, 20.0 / test_font::UPEM as f32);
    }

    #[test]
    fn fallback_resolution_uses_requesting_configuration() {
        let primary = face();
        let other = test_font::secondary_file().font(0).unwrap().create_face();
        primary.set_fallback(Some(&other));
        primary.set_px(20.0);
        other.set_px(100.0);
        other.set_hinting(true);

        let gid = other.font().find_glyph('B');
        let via_chain = primary.glyph(gid, GlyphType::OUTLINE);
        assert_eq!(via_chain.metrics().scale, 0.02);
        // The chain face's hinting flag does not leak into resolution:
        // the result matches an unhinted direct lookup at the requesting
        // size.
        let direct = other.font().create_face();
        direct.set_px(20.0);
        let expected = direct.glyph(gid, GlyphType::OUTLINE);
        assert_eq!(via_chain.rasterize(), expected.rasterize());
    }

    #[test]
    fn fallback_cycles_are_rejected() {
        let a = face();
        let b = face();
        let c = face();
        a.set_fallback(Some(&b));
        b.set_fallback(Some(&c));
        // Closing the loop is rejected and leaves c without a fallback.
        c.set_fallback(Some(&a));
        assert!(c.fallback().is_none());
        assert!(a.fallback().is_some());
        assert!(b.fallback().is_some());
        // Self reference is the smallest cycle.
        a.set_fallback(Some(&a));
        assert!(a.fallback().is_none());
    }

    #[test]
    fn fallback_is_not_owning() {
        let a = face();
        {
            let b = face();
            a.set_fallback(Some(&b));
            assert!(a.fallback().is_some());
        }
        // The fallback face was dropped; the chain ends at `a`.
        assert!(a.fallback().is_none());
    }
}
