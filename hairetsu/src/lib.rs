//! Font loading, glyph resolution and rasterization for OpenType fonts.
//!
//! Hairetsu is a mid level library that sits above low level font parsing
//! (provided by [`read-fonts`](https://crates.io/crates/read-fonts) and
//! [`skrifa`](https://crates.io/crates/skrifa)) and below a text layout
//! engine. It provides the object graph a renderer needs to go from raw
//! font bytes to pixel coverage:
//!
//! [`FontFile`] → [`Font`] → [`Face`] → [`Glyph`] → [`Coverage`]
//!
//! A [`FontFile`] owns a decoded byte buffer and the fonts found in it (a
//! collection file may contain several). A [`Font`] is an immutable,
//! shareable view of one of those fonts. A [`Face`] configures a font at a
//! concrete pixel or point size and resolves glyphs, consulting an optional
//! fallback chain. A [`Glyph`] carries the realized representation (outline,
//! embedded bitmap or SVG document) together with metrics already scaled to
//! the face configuration, and can be rasterized into a single channel
//! coverage bitmap.
//!
//! Lazy discovery is provided by [`Collection`], [`Family`] and
//! [`FaceInfo`], which describe faces (including their character coverage)
//! without paying the full parse cost until [`FaceInfo::realize`] is called.

#![forbid(unsafe_code)]

/// Expose our "raw" underlying parser crate.
pub extern crate read_fonts as raw;

mod bitmap;
mod collection;
mod engine;
mod error;
mod face;
mod file;
mod font;
mod geometry;
mod glyph;
mod metrics;
mod raster;

pub use collection::{Collection, FaceInfo, Family, FontDiscovery};
pub use engine::{is_initialized, try_initialize, try_shutdown};
pub use error::Error;
pub use face::Face;
pub use file::FontFile;
pub use font::Font;
pub use geometry::{Rect, RectI, Vec2, Vec2I};
pub use glyph::{Glyph, GlyphType};
pub use metrics::{FontMetrics, GlyphMetrics};
pub use raster::Coverage;

/// Type for a glyph identifier.
pub type GlyphId = read_fonts::types::GlyphId;

/// Type for a 4-byte tag used to identify font tables and other resources.
pub type Tag = read_fonts::types::Tag;

/// Reserved glyph identifier returned when a character has no mapping.
///
/// This is a valid lookup result, not an error: requesting the glyph for
/// this identifier yields a [`GlyphType::NONE`] glyph with no data.
pub const GLYPH_MISSING: GlyphId = GlyphId::NOTDEF;

#[cfg(test)]
pub(crate) mod test_font;
