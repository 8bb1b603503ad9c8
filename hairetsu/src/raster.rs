//! Scan conversion of realized glyphs to coverage bitmaps.
//!
//! Outlines are flattened to line segments and filled with the nonzero
//! winding rule. Anti-aliased output takes four vertical samples per pixel
//! row and accumulates fractional horizontal coverage per span; aliased
//! output takes a single sample through the pixel center and writes 0 or
//! 255. Embedded bitmaps are resampled to the face scale instead of scan
//! converted.

use kurbo::{BezPath, PathEl, Shape};

use crate::bitmap::EmbeddedBitmap;
use crate::glyph::{Glyph, GlyphSource};

/// Tolerance for flattening curves to line segments, in pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Vertical samples per pixel row for anti-aliased output.
const SUBSAMPLES: u32 = 4;

/// A single channel coverage bitmap.
///
/// `data` holds `width * height` bytes in row-major order, origin at the
/// top-left, with 0 meaning no coverage and 255 full coverage. A glyph
/// with nothing to render produces an empty (0x0) bitmap.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Coverage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Coverage bytes, one per pixel.
    pub data: Vec<u8>,
}

impl Coverage {
    pub(crate) fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Returns true if the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the coverage value at `(x, y)`, or `None` when out of
    /// bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            self.data.get((y * self.width + x) as usize).copied()
        } else {
            None
        }
    }
}

pub(crate) fn rasterize(glyph: &Glyph, antialias: bool) -> Coverage {
    match glyph.source() {
        GlyphSource::None | GlyphSource::Svg(_) => Coverage::empty(),
        GlyphSource::Outline(path) => rasterize_outline(path, antialias),
        GlyphSource::Bitmap(bitmap) => resample_bitmap(bitmap, antialias),
    }
}

/// A line segment in device space with its winding direction.
struct Edge {
    /// Endpoint with the smaller y.
    x0: f32,
    y0: f32,
    /// Endpoint with the larger y.
    x1: f32,
    y1: f32,
    /// +1 when the original segment went downward in device space.
    winding: i32,
}

impl Edge {
    /// x coordinate where the edge crosses the horizontal line at `y`.
    fn crossing_at(&self, y: f32) -> f32 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

fn rasterize_outline(path: &BezPath, antialias: bool) -> Coverage {
    let bounds = path.bounding_box();
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Coverage::empty();
    }
    // Pixel grid enclosing the outline. Glyph space is y-up with the
    // origin on the baseline; device space is y-down with the origin at
    // the top-left of the grid.
    let left = bounds.x0.floor();
    let top = bounds.y1.ceil();
    let width = (bounds.x1.ceil() - left).max(0.0) as u32;
    let height = (top - bounds.y0.floor()).max(0.0) as u32;
    if width == 0 || height == 0 {
        return Coverage::empty();
    }
    let Some(pixels) = width.checked_mul(height) else {
        return Coverage::empty();
    };

    let edges = flatten_to_edges(path, left, top);
    let mut data = vec![0u8; pixels as usize];
    let mut crossings: Vec<(f32, i32)> = Vec::new();
    let mut row = vec![0f32; width as usize];

    for y in 0..height {
        let samples = if antialias { SUBSAMPLES } else { 1 };
        row.iter_mut().for_each(|v| *v = 0.0);
        for sub in 0..samples {
            let sample_y = y as f32 + (sub as f32 + 0.5) / samples as f32;
            crossings.clear();
            for edge in &edges {
                if sample_y >= edge.y0 && sample_y < edge.y1 {
                    crossings.push((edge.crossing_at(sample_y), edge.winding));
                }
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));
            accumulate_spans(&crossings, &mut row, 1.0 / samples as f32, antialias);
        }
        let out = &mut data[(y * width) as usize..((y + 1) * width) as usize];
        for (dst, cov) in out.iter_mut().zip(&row) {
            *dst = if antialias {
                (cov.clamp(0.0, 1.0) * 255.0).round() as u8
            } else if *cov > 0.0 {
                255
            } else {
                0
            };
        }
    }
    Coverage {
        width,
        height,
        data,
    }
}

/// Flattens `path` to device-space edges, dropping horizontal segments.
fn flatten_to_edges(path: &BezPath, left: f64, top: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut start = kurbo::Point::ZERO;
    let mut last = kurbo::Point::ZERO;
    let mut push = |a: kurbo::Point, b: kurbo::Point| {
        // Flip y so rows grow downward.
        let (ax, ay) = ((a.x - left) as f32, (top - a.y) as f32);
        let (bx, by) = ((b.x - left) as f32, (top - b.y) as f32);
        if ay < by {
            edges.push(Edge {
                x0: ax,
                y0: ay,
                x1: bx,
                y1: by,
                winding: 1,
            });
        } else if by < ay {
            edges.push(Edge {
                x0: bx,
                y0: by,
                x1: ax,
                y1: ay,
                winding: -1,
            });
        }
    };
    kurbo::flatten(
        path.elements().iter().copied(),
        FLATTEN_TOLERANCE,
        |el| match el {
            PathEl::MoveTo(p) => {
                start = p;
                last = p;
            }
            PathEl::LineTo(p) => {
                push(last, p);
                last = p;
            }
            PathEl::ClosePath => {
                push(last, start);
                last = start;
            }
            // flatten() only emits the variants above
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        },
    );
    edges
}

/// Accumulates nonzero-winding spans from sorted crossings into `row`.
///
/// With `fractional` set, partially covered boundary pixels receive a
/// proportional share of `weight`; otherwise a pixel counts when its
/// center lies inside the span.
fn accumulate_spans(crossings: &[(f32, i32)], row: &mut [f32], weight: f32, fractional: bool) {
    let mut winding = 0;
    let mut span_start = 0.0f32;
    for &(x, dir) in crossings {
        if winding == 0 {
            span_start = x;
        }
        winding += dir;
        if winding == 0 {
            fill_span(span_start, x, row, weight, fractional);
        }
    }
}

fn fill_span(xa: f32, xb: f32, row: &mut [f32], weight: f32, fractional: bool) {
    let limit = row.len() as f32;
    let xa = xa.clamp(0.0, limit);
    let xb = xb.clamp(0.0, limit);
    if xa >= xb {
        return;
    }
    if fractional {
        let first = xa.floor() as usize;
        let last = (xb.ceil() as usize).min(row.len());
        for px in first..last {
            let cover = (xb.min(px as f32 + 1.0) - xa.max(px as f32)).max(0.0);
            row[px] += cover * weight;
        }
    } else {
        for (px, value) in row.iter_mut().enumerate() {
            let center = px as f32 + 0.5;
            if center >= xa && center < xb {
                *value = 1.0;
            }
        }
    }
}

/// Nearest-neighbor resample of an embedded bitmap to the face scale.
fn resample_bitmap(bitmap: &EmbeddedBitmap, antialias: bool) -> Coverage {
    let (width, height) = bitmap.target_size();
    if width == 0 || height == 0 || bitmap.coverage.is_empty() {
        return Coverage::empty();
    }
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        let src_y = ((y as f32 + 0.5) / bitmap.scale) as u32;
        let src_y = src_y.min(bitmap.height - 1);
        for x in 0..width {
            let src_x = ((x as f32 + 0.5) / bitmap.scale) as u32;
            let src_x = src_x.min(bitmap.width - 1);
            let value = bitmap.coverage[(src_y * bitmap.width + src_x) as usize];
            data.push(if antialias {
                value
            } else if value >= 128 {
                255
            } else {
                0
            });
        }
    }
    Coverage {
        width,
        height,
        data,
    }
}
