//! Error types reported by font parsing and glyph loading.

use core::fmt;
use std::io;

pub use read_fonts::ReadError;
pub use skrifa::outline::DrawError;

/// Errors that may occur when loading fonts or resolving glyphs.
///
/// Lookup misses are never reported through this type: a character without
/// a mapping yields [`GLYPH_MISSING`](crate::GLYPH_MISSING) and a glyph
/// without data resolves to a [`GlyphType::NONE`](crate::GlyphType::NONE)
/// glyph. A fallback assignment that would create a cycle is silently
/// cleared rather than surfaced here.
#[derive(Debug)]
pub enum Error {
    /// The byte stream does not match any registered container signature.
    UnrecognizedFormat,
    /// The container matched a known signature but failed to parse.
    Parse(ReadError),
    /// The container parsed but none of its fonts could be bound.
    NoFonts,
    /// A file backed construction failed to read its source.
    Io(io::Error),
    /// Error occurred while decoding a glyph outline.
    Draw(DrawError),
}

impl From<ReadError> for Error {
    fn from(value: ReadError) -> Self {
        Self::Parse(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<DrawError> for Error {
    fn from(value: DrawError) -> Self {
        Self::Draw(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnrecognizedFormat => {
                write!(f, "Byte stream does not match any known font container")
            }
            Self::Parse(e) => write!(f, "{e}"),
            Self::NoFonts => write!(f, "Container holds no usable fonts"),
            Self::Io(e) => write!(f, "{e}"),
            Self::Draw(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnrecognizedFormat | Self::NoFonts => None,
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Draw(e) => Some(e),
        }
    }
}
