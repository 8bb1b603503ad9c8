//! Embedded bitmap (sbix/EBDT/CBDT) glyph resolution.
//!
//! Strike selection and table access go through `skrifa`; this module
//! decodes the selected bitmap into an owned 8-bit coverage plane and
//! computes placement metrics in the face's pixel space, so that
//! rasterization only has to resample.

use skrifa::bitmap::{BitmapData, BitmapFormat, BitmapGlyph, BitmapStrikes, Origin};
use skrifa::instance::Size;
use skrifa::raw::FontRef;

use crate::geometry::{Rect, Vec2};
use crate::glyph::GlyphType;
use crate::metrics::GlyphMetrics;
use crate::GlyphId;

/// An embedded bitmap decoded to a single channel coverage plane.
///
/// `coverage` holds `width * height` bytes in row-major order with the
/// origin at the top-left. `scale` is the factor from strike pixels to
/// face pixels; rasterization resamples by it.
#[derive(Clone, Debug)]
pub(crate) struct EmbeddedBitmap {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
    pub scale: f32,
}

impl EmbeddedBitmap {
    /// Size of the bitmap after resampling to the face configuration.
    pub fn target_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.scale).round().max(0.0) as u32,
            (self.height as f32 * self.scale).round().max(0.0) as u32,
        )
    }
}

/// Resolves the best embedded bitmap for `glyph_id` at `ppem` pixels.
///
/// Returns the decoded bitmap, its type flag (which of sbix/EBDT/CBDT
/// provided it), and placement metrics in face pixel space. `upem_scale`
/// is `ppem / units_per_em`, used for the font-unit bearings sbix reports.
pub(crate) fn embedded(
    font: &FontRef,
    glyph_id: GlyphId,
    ppem: f32,
    upem_scale: f32,
) -> Option<(EmbeddedBitmap, GlyphType, GlyphMetrics)> {
    let strikes = BitmapStrikes::new(font);
    let kind = match strikes.format()? {
        BitmapFormat::Sbix => GlyphType::SBIX,
        BitmapFormat::Ebdt => GlyphType::EBDT,
        BitmapFormat::Cbdt => GlyphType::CBDT,
    };
    let glyph = strikes.glyph_for_size(Size::new(ppem), glyph_id)?;
    let scale = if glyph.ppem_y > 0.0 {
        ppem / glyph.ppem_y
    } else {
        1.0
    };
    let coverage = decode_coverage(&glyph)?;
    let bitmap = EmbeddedBitmap {
        width: glyph.width,
        height: glyph.height,
        coverage,
        scale,
    };
    let metrics = placement_metrics(&glyph, &bitmap, scale, upem_scale);
    Some((bitmap, kind, metrics))
}

fn placement_metrics(
    glyph: &BitmapGlyph,
    bitmap: &EmbeddedBitmap,
    scale: f32,
    upem_scale: f32,
) -> GlyphMetrics {
    let (width, height) = bitmap.target_size();
    let (width, height) = (width as f32, height as f32);
    let bounds = match glyph.placement_origin {
        // EBDT/CBDT bearings are strike pixels from the origin to the
        // top-left corner of the image.
        Origin::TopLeft => {
            let left = glyph.inner_bearing_x * scale;
            let top = glyph.inner_bearing_y * scale;
            Rect::new(Vec2::new(left, top - height), Vec2::new(left + width, top))
        }
        // sbix outer bearings are font units to the bottom-left corner,
        // inner bearings strike pixels.
        Origin::BottomLeft => {
            let left = glyph.bearing_x * upem_scale + glyph.inner_bearing_x * scale;
            let bottom = glyph.bearing_y * upem_scale + glyph.inner_bearing_y * scale;
            Rect::new(
                Vec2::new(left, bottom),
                Vec2::new(left + width, bottom + height),
            )
        }
    };
    GlyphMetrics {
        bounds,
        bearing: Vec2::new(bounds.min.x, bounds.max.y),
        advance: Vec2::new(glyph.advance.unwrap_or(0.0) * scale, 0.0),
        scale,
        ..Default::default()
    }
}

/// Expands bitmap data to one coverage byte per pixel.
fn decode_coverage(glyph: &BitmapGlyph) -> Option<Vec<u8>> {
    let pixel_count = glyph.width.checked_mul(glyph.height)? as usize;
    match &glyph.data {
        BitmapData::Mask(mask) => {
            let max = (1u16 << mask.bpp) - 1;
            let mut out = Vec::with_capacity(pixel_count);
            if mask.is_packed {
                // One continuous bit stream, rows are not padded.
                for index in 0..pixel_count {
                    let bit = index * mask.bpp as usize;
                    out.push(expand(read_bits(mask.data, bit, mask.bpp)?, max));
                }
            } else {
                // Each row padded to the next byte boundary.
                let row_bits = glyph.width as usize * mask.bpp as usize;
                let row_bytes = row_bits.div_ceil(8);
                for y in 0..glyph.height as usize {
                    for x in 0..glyph.width as usize {
                        let bit = y * row_bytes * 8 + x * mask.bpp as usize;
                        out.push(expand(read_bits(mask.data, bit, mask.bpp)?, max));
                    }
                }
            }
            Some(out)
        }
        BitmapData::Bgra(data) => {
            if data.len() < pixel_count * 4 {
                return None;
            }
            Some(data.chunks_exact(4).take(pixel_count).map(|px| px[3]).collect())
        }
        BitmapData::Png(data) => {
            let image = image::load_from_memory_with_format(data, image::ImageFormat::Png)
                .map_err(|e| log::warn!("failed to decode embedded png bitmap: {e}"))
                .ok()?;
            let rgba = image.to_rgba8();
            if (rgba.width(), rgba.height()) != (glyph.width, glyph.height) {
                log::warn!(
                    "embedded png dimensions {}x{} disagree with glyph record {}x{}",
                    rgba.width(),
                    rgba.height(),
                    glyph.width,
                    glyph.height
                );
                return None;
            }
            Some(rgba.pixels().map(|px| px.0[3]).collect())
        }
    }
}

/// Reads `bpp` bits starting at bit offset `bit`, most significant first.
fn read_bits(data: &[u8], bit: usize, bpp: u8) -> Option<u16> {
    let mut value = 0u16;
    for i in 0..bpp as usize {
        let index = bit + i;
        let byte = *data.get(index / 8)?;
        value = (value << 1) | ((byte >> (7 - index % 8)) & 1) as u16;
    }
    Some(value)
}

/// Expands an n-bit gray value to the full 0..=255 range.
fn expand(value: u16, max: u16) -> u8 {
    if max == 0 {
        0
    } else {
        ((value as u32 * 255 + (max as u32 / 2)) / max as u32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reader_msb_first() {
        let data = [0b1010_0110u8, 0b1100_0000];
        assert_eq!(read_bits(&data, 0, 1), Some(1));
        assert_eq!(read_bits(&data, 1, 1), Some(0));
        assert_eq!(read_bits(&data, 0, 4), Some(0b1010));
        assert_eq!(read_bits(&data, 4, 4), Some(0b0110));
        assert_eq!(read_bits(&data, 6, 4), Some(0b1011));
        assert_eq!(read_bits(&data, 15, 1), Some(0));
        assert_eq!(read_bits(&data, 16, 1), None);
    }

    #[test]
    fn gray_expansion_covers_full_range() {
        // 1 bpp
        assert_eq!(expand(0, 1), 0);
        assert_eq!(expand(1, 1), 255);
        // 2 bpp
        assert_eq!(expand(3, 3), 255);
        assert_eq!(expand(1, 3), 85);
        // 8 bpp is the identity
        assert_eq!(expand(137, 255), 137);
    }

    #[test]
    fn target_size_rounds_to_pixels() {
        let bitmap = EmbeddedBitmap {
            width: 10,
            height: 20,
            coverage: vec![0; 200],
            scale: 0.75,
        };
        assert_eq!(bitmap.target_size(), (8, 15));
    }
}
