//! Font collections: lightweight indexing of many fonts without keeping
//! them parsed.
//!
//! A [`Collection`] groups [`Family`] entries, each an ordered list of
//! [`FaceInfo`] descriptors. Descriptors carry the metadata needed for
//! selection (names, representation kinds, character coverage) and can be
//! realized back into a full [`Font`] on demand. System enumeration is
//! delegated to a [`FontDiscovery`] implementation supplied by the host.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use read_fonts::collections::IntSet;
use read_fonts::types::Tag;
use skrifa::MetadataProvider;

use crate::font::Font;
use crate::glyph::GlyphType;
use crate::{Error, FontFile};

/// Provides the platform's font inventory.
///
/// Enumeration of system fonts is host specific; implement this trait to
/// connect a platform backend (fontconfig, DirectWrite, Core Text or a
/// plain directory scan) to [`Collection::from_system`].
pub trait FontDiscovery {
    /// Enumerates the families currently installed on the system.
    fn families(&self) -> Result<Vec<Family>, Error>;
}

static SYSTEM: RwLock<Option<Collection>> = RwLock::new(None);

/// Where a face descriptor's bytes live.
#[derive(Clone, Debug)]
enum FaceSource {
    File { path: PathBuf, index: u32 },
    Memory { data: Arc<Vec<u8>>, index: u32 },
}

/// A descriptor for a single face, detached from its parsed tables.
///
/// Descriptors are intentionally small: the font data is re-read and
/// re-parsed by [`realize`](Self::realize), and character coverage is
/// computed lazily on first query.
pub struct FaceInfo {
    source: FaceSource,
    name: String,
    family: String,
    subfamily: String,
    sample_text: Option<String>,
    kinds: GlyphType,
    variable: bool,
    coverage: RwLock<Option<IntSet<u32>>>,
}

impl FaceInfo {
    fn from_font(font: &Font, source: FaceSource) -> Self {
        let variable = font
            .raw()
            .ok()
            .map(|raw| raw.table_data(Tag::new(b"fvar")).is_some())
            .unwrap_or(false);
        let sample_text = font.raw().ok().and_then(|raw| {
            raw.localized_strings(skrifa::string::StringId::SAMPLE_TEXT)
                .english_or_first()
                .map(|s| s.to_string())
        });
        Self {
            source,
            name: font.name().to_string(),
            family: font.family().to_string(),
            subfamily: font.subfamily().to_string(),
            sample_text,
            kinds: font.glyph_types(),
            variable,
            coverage: RwLock::new(None),
        }
    }

    /// Builds descriptors for every font in the container at `path`.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Vec<Self>, Error> {
        let path = path.into();
        let file = FontFile::from_file(&path)?;
        Ok(file
            .fonts()
            .iter()
            .enumerate()
            .map(|(index, font)| {
                Self::from_font(
                    font,
                    FaceSource::File {
                        path: path.clone(),
                        index: index as u32,
                    },
                )
            })
            .collect())
    }

    /// Builds descriptors for every font in the in-memory container.
    pub fn from_memory(data: Vec<u8>) -> Result<Vec<Self>, Error> {
        let file = FontFile::from_memory(data.clone())?;
        let data = Arc::new(data);
        Ok(file
            .fonts()
            .iter()
            .enumerate()
            .map(|(index, font)| {
                Self::from_font(
                    font,
                    FaceSource::Memory {
                        data: data.clone(),
                        index: index as u32,
                    },
                )
            })
            .collect())
    }

    /// Full name of the face.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Family name of the face.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Subfamily (style) name of the face.
    pub fn subfamily(&self) -> &str {
        &self.subfamily
    }

    /// Designer supplied sample text, when the font carries one.
    pub fn sample_text(&self) -> Option<&str> {
        self.sample_text.as_deref()
    }

    /// The glyph representations the face carries.
    pub fn glyph_types(&self) -> GlyphType {
        self.kinds
    }

    /// True when the face has variation axes.
    pub fn is_variable(&self) -> bool {
        self.variable
    }

    /// True when [`realize`](Self::realize) can be expected to succeed.
    ///
    /// Memory backed faces are always realizable; file backed faces stop
    /// being realizable when the file disappears.
    pub fn is_realizable(&self) -> bool {
        match &self.source {
            FaceSource::File { path, .. } => path.is_file(),
            FaceSource::Memory { .. } => true,
        }
    }

    /// True when the face maps `codepoint` to a real glyph.
    ///
    /// The coverage set is computed from the character map on first use
    /// and cached on the descriptor.
    pub fn has_character(&self, codepoint: char) -> bool {
        let codepoint = codepoint as u32;
        if let Some(coverage) = self.coverage.read().as_ref() {
            return coverage.contains(codepoint);
        }
        let mut slot = self.coverage.write();
        let coverage = slot.get_or_insert_with(|| self.compute_coverage());
        coverage.contains(codepoint)
    }

    fn compute_coverage(&self) -> IntSet<u32> {
        let mut set = IntSet::empty();
        match self.realize() {
            Ok(font) => {
                if let Ok(raw) = font.raw() {
                    set.extend(raw.charmap().mappings().map(|(codepoint, _)| codepoint));
                }
            }
            Err(e) => {
                log::warn!("failed to compute coverage for {:?}: {e}", self.name);
            }
        }
        set
    }

    /// Parses the backing data and returns the described font.
    ///
    /// Each call re-reads and re-parses the source; realized fonts are
    /// not cached on the descriptor.
    pub fn realize(&self) -> Result<Font, Error> {
        let file = match &self.source {
            FaceSource::File { path, .. } => FontFile::from_file(path)?,
            FaceSource::Memory { data, .. } => FontFile::from_memory_with_name(
                data.as_ref().clone(),
                self.name.clone(),
            )?,
        };
        let index = match &self.source {
            FaceSource::File { index, .. } | FaceSource::Memory { index, .. } => *index,
        };
        file.font(index)
            .ok_or(Error::Parse(read_fonts::ReadError::OutOfBounds))
    }
}

impl Clone for FaceInfo {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            name: self.name.clone(),
            family: self.family.clone(),
            subfamily: self.subfamily.clone(),
            sample_text: self.sample_text.clone(),
            kinds: self.kinds,
            variable: self.variable,
            coverage: RwLock::new(self.coverage.read().clone()),
        }
    }
}

impl fmt::Debug for FaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FaceInfo")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("subfamily", &self.subfamily)
            .field("kinds", &self.kinds)
            .field("variable", &self.variable)
            .finish()
    }
}

/// An ordered group of faces sharing a family name.
#[derive(Clone, Debug, Default)]
pub struct Family {
    name: String,
    faces: Vec<FaceInfo>,
}

impl Family {
    /// Creates an empty family.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }

    /// The family name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a face descriptor, keeping insertion order.
    pub fn add_face(&mut self, face: FaceInfo) {
        self.faces.push(face);
    }

    /// The face descriptors in insertion order.
    pub fn faces(&self) -> &[FaceInfo] {
        &self.faces
    }

    /// True when any face in the family maps `codepoint`.
    pub fn has_character(&self, codepoint: char) -> bool {
        self.faces.iter().any(|face| face.has_character(codepoint))
    }

    /// The first face (in insertion order, not best match) mapping
    /// `codepoint`.
    pub fn first_with(&self, codepoint: char) -> Option<&FaceInfo> {
        self.faces.iter().find(|face| face.has_character(codepoint))
    }
}

/// An ordered set of families.
#[derive(Clone, Debug, Default)]
pub struct Collection {
    families: Vec<Family>,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection of system families.
    ///
    /// The first call enumerates through `discovery` and caches the
    /// result process-wide; later calls return the cached snapshot unless
    /// `update` forces re-enumeration.
    pub fn from_system(discovery: &dyn FontDiscovery, update: bool) -> Result<Self, Error> {
        if !update {
            if let Some(cached) = SYSTEM.read().as_ref() {
                return Ok(cached.clone());
            }
        }
        let collection = Self {
            families: discovery.families()?,
        };
        log::debug!(
            "enumerated {} system font families",
            collection.families.len()
        );
        *SYSTEM.write() = Some(collection.clone());
        Ok(collection)
    }

    /// Appends a family, keeping insertion order.
    pub fn add_family(&mut self, family: Family) {
        self.families.push(family);
    }

    /// The families in insertion order.
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Finds a family by exact name.
    pub fn find_family(&self, name: &str) -> Option<&Family> {
        self.families.iter().find(|family| family.name == name)
    }

    /// The first face across all families (in insertion order) mapping
    /// `codepoint`.
    pub fn first_with(&self, codepoint: char) -> Option<&FaceInfo> {
        self.families
            .iter()
            .find_map(|family| family.first_with(codepoint))
    }
}
