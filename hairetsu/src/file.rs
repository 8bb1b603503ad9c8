//! Font container loading.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use read_fonts::FileRef;

use crate::font::Font;
use crate::{engine, Error};

/// A loaded font container: a standalone font or a collection.
///
/// The container owns its bytes; [`Font`]s handed out by [`font`](Self::font)
/// share them. All fonts in the container are bound eagerly; corrupt
/// collection entries are skipped, so a successfully constructed file
/// holds only valid fonts and at least one of them.
#[derive(Clone)]
pub struct FontFile {
    inner: Arc<FileInner>,
}

struct FileInner {
    name: String,
    type_name: &'static str,
    fonts: Vec<Font>,
}

impl FontFile {
    /// Parses a font container from a byte vector.
    pub fn from_memory(data: Vec<u8>) -> Result<Self, Error> {
        Self::from_memory_with_name(data, String::new())
    }

    /// Parses a font container from a byte vector, attaching a display
    /// name (usually the originating path) for diagnostics.
    pub fn from_memory_with_name(data: Vec<u8>, name: String) -> Result<Self, Error> {
        let type_name = engine::detect(&data).ok_or(Error::UnrecognizedFormat)?;
        let count = match FileRef::new(&data)? {
            FileRef::Font(_) => 1,
            FileRef::Collection(collection) => collection.len(),
        };
        let data = Arc::new(data);
        let mut fonts = Vec::with_capacity(count as usize);
        for index in 0..count {
            match Font::new(data.clone(), index) {
                Ok(font) => fonts.push(font),
                // A standalone font that fails to bind surfaces the parse
                // error; a corrupt collection entry is skipped.
                Err(err) if count == 1 => return Err(err),
                Err(err) => {
                    log::warn!("skipping font {index} in {name:?}: {err}");
                }
            }
        }
        if fonts.is_empty() {
            return Err(Error::NoFonts);
        }
        log::debug!(
            "loaded {type_name} container {name:?} with {} font(s)",
            fonts.len()
        );
        Ok(Self {
            inner: Arc::new(FileInner {
                name,
                type_name,
                fonts,
            }),
        })
    }

    /// Reads and parses a font container from a file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_memory_with_name(data, path.display().to_string())
    }

    /// Human readable container type, e.g. "TrueType" or
    /// "TrueType Collection".
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    /// Display name attached at load time; empty for anonymous memory.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of fonts in the container. At least 1.
    pub fn font_count(&self) -> u32 {
        self.inner.fonts.len() as u32
    }

    /// Returns font `index`, or `None` when out of range.
    pub fn font(&self, index: u32) -> Option<Font> {
        self.inner.fonts.get(index as usize).cloned()
    }

    /// All fonts in the container, in declaration order.
    pub fn fonts(&self) -> &[Font] {
        &self.inner.fonts
    }
}

impl fmt::Debug for FontFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FontFile")
            .field("name", &self.inner.name)
            .field("type_name", &self.inner.type_name)
            .field("font_count", &self.inner.fonts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_font;

    #[test]
    fn parses_a_truetype_font() {
        let file = FontFile::from_memory(test_font::simple()).unwrap();
        assert_eq!(file.type_name(), "TrueType");
        assert_eq!(file.name(), "");
        assert_eq!(file.font_count(), 1);
        assert!(file.font(0).is_some());
        assert!(file.font(1).is_none());
    }

    #[test]
    fn rejects_unknown_containers() {
        let err = FontFile::from_memory(b"definitely not a font".to_vec());
        assert!(matches!(err, Err(Error::UnrecognizedFormat)));
        let err = FontFile::from_memory(Vec::new());
        assert!(matches!(err, Err(Error::UnrecognizedFormat)));
    }

    #[test]
    fn parses_a_collection() {
        let data = test_font::collection(&[test_font::simple(), test_font::secondary()]);
        let file = FontFile::from_memory(data).unwrap();
        assert_eq!(file.type_name(), "TrueType Collection");
        assert_eq!(file.font_count(), 2);
        assert_eq!(file.font(0).unwrap().glyph_count(), 2);
        assert_eq!(file.font(1).unwrap().glyph_count(), 3);
    }

    #[test]
    fn skips_corrupt_collection_entries() {
        let mut data = test_font::collection(&[test_font::simple(), test_font::secondary()]);
        // Wreck the second entry's table directory; the first survives.
        let second = u32::from_be_bytes(data[16..20].try_into().unwrap()) as usize;
        data[second..second + 4].copy_from_slice(&[0xFF; 4]);
        let file = FontFile::from_memory(data).unwrap();
        assert_eq!(file.font_count(), 1);
        assert_eq!(file.font(0).unwrap().glyph_count(), 2);
    }

    #[test]
    fn name_is_attached() {
        let file =
            FontFile::from_memory_with_name(test_font::simple(), "fixture.ttf".into()).unwrap();
        assert_eq!(file.name(), "fixture.ttf");
    }

    #[test]
    fn parsing_is_deterministic() {
        let a = FontFile::from_memory(test_font::simple()).unwrap();
        let b = FontFile::from_memory(test_font::simple()).unwrap();
        assert_eq!(a.font_count(), b.font_count());
        let (fa, fb) = (a.font(0).unwrap(), b.font(0).unwrap());
        assert_eq!(fa.name(), fb.name());
        assert_eq!(fa.glyph_count(), fb.glyph_count());
        assert_eq!(fa.metrics(), fb.metrics());
    }
}
