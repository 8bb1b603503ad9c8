//! In-memory font fixtures for unit tests.

use kurbo::{BezPath, Shape};
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::glyf::{GlyfLocaBuilder, SimpleGlyph};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::types::{FWord, GlyphId, NameId, Tag, UfWord};
use write_fonts::FontBuilder;

use crate::FontFile;

pub const UPEM: u16 = 1000;
pub const ASCENDER: i16 = 800;
pub const DESCENDER: i16 = -200;
pub const ADVANCE: u16 = 600;

fn box_path(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((x0, y0));
    path.line_to((x1, y0));
    path.line_to((x1, y1));
    path.line_to((x0, y1));
    path.close_path();
    path
}

/// Compiles a minimal TrueType font: one empty glyph at id 0 followed by
/// the given glyphs, each optionally mapped from a character.
fn compile(family: &str, subfamily: &str, glyphs: &[(Option<char>, BezPath)]) -> Vec<u8> {
    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut mappings = Vec::new();
    let mut h_metrics = Vec::new();
    for (index, (mapped, path)) in glyphs.iter().enumerate() {
        let glyph = SimpleGlyph::from_bezpath(path).unwrap();
        glyf_builder.add_glyph(&glyph).unwrap();
        if let Some(ch) = mapped {
            mappings.push((*ch, GlyphId::new(index as u32)));
        }
        let side_bearing = if path.elements().is_empty() {
            0
        } else {
            path.bounding_box().x0 as i16
        };
        h_metrics.push(LongMetric {
            advance: ADVANCE,
            side_bearing,
        });
    }
    let (glyf, loca, loca_format) = glyf_builder.build();

    let mut name = Name::default();
    let full = format!("{family} {subfamily}");
    for (id, value) in [(1u16, family), (2, subfamily), (4, &full)] {
        name.name_record.push(NameRecord::new(
            3,
            1,
            0x409,
            NameId::new(id),
            value.to_string().into(),
        ));
    }

    let mut builder = FontBuilder::new();
    builder
        .add_table(&Head {
            units_per_em: UPEM,
            lowest_rec_ppem: 8,
            index_to_loc_format: loca_format as i16,
            ..Default::default()
        })
        .unwrap()
        .add_table(&Maxp {
            num_glyphs: glyphs.len() as u16,
            ..Default::default()
        })
        .unwrap()
        .add_table(&Hhea {
            ascender: FWord::new(ASCENDER),
            descender: FWord::new(DESCENDER),
            line_gap: FWord::new(0),
            advance_width_max: UfWord::new(ADVANCE),
            min_left_side_bearing: FWord::new(0),
            min_right_side_bearing: FWord::new(0),
            x_max_extent: FWord::new(700),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: glyphs.len() as u16,
        })
        .unwrap()
        .add_table(&Hmtx {
            h_metrics,
            left_side_bearings: Vec::new(),
        })
        .unwrap()
        .add_table(&Cmap::from_mappings(mappings).unwrap())
        .unwrap()
        .add_table(&name)
        .unwrap()
        .add_table(&glyf)
        .unwrap()
        .add_table(&loca)
        .unwrap();
    builder.build()
}

/// A font mapping only 'A' (glyph 1, a 400x700 box).
pub fn simple() -> Vec<u8> {
    compile(
        "Container Test",
        "Regular",
        &[
            (None, BezPath::new()),
            (Some('A'), box_path(100.0, 0.0, 500.0, 700.0)),
        ],
    )
}

/// A font mapping only 'B', at glyph id 2 so the id is out of range for
/// the font built by [`simple`].
pub fn secondary() -> Vec<u8> {
    compile(
        "Container Fallback",
        "Regular",
        &[
            (None, BezPath::new()),
            (None, BezPath::new()),
            (Some('B'), box_path(50.0, 0.0, 550.0, 600.0)),
        ],
    )
}

/// [`simple`] with `document` attached to glyph 1 through an SVG table.
pub fn with_svg(document: &[u8]) -> Vec<u8> {
    let base = simple();
    // Header, then a one-record document list covering glyph 1. Record
    // offsets are relative to the start of the list.
    let mut svg = Vec::new();
    svg.extend_from_slice(&0u16.to_be_bytes()); // version
    svg.extend_from_slice(&10u32.to_be_bytes()); // document list offset
    svg.extend_from_slice(&0u32.to_be_bytes()); // reserved
    svg.extend_from_slice(&1u16.to_be_bytes()); // one record
    svg.extend_from_slice(&1u16.to_be_bytes()); // start glyph
    svg.extend_from_slice(&1u16.to_be_bytes()); // end glyph
    svg.extend_from_slice(&14u32.to_be_bytes()); // document offset
    svg.extend_from_slice(&(document.len() as u32).to_be_bytes());
    svg.extend_from_slice(document);

    let font = read_fonts::FontRef::new(&base).unwrap();
    let mut builder = FontBuilder::new();
    builder.add_raw(Tag::new(b"SVG "), svg);
    builder.copy_missing_tables(font);
    builder.build()
}

/// Wraps standalone fonts into a TrueType Collection.
///
/// Each font's table record offsets are rewritten to be absolute within
/// the collection, as the format requires.
pub fn collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"ttcf");
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes());
    data.extend_from_slice(&(fonts.len() as u32).to_be_bytes());
    let mut offset = (12 + 4 * fonts.len()) as u32;
    let mut bodies = Vec::new();
    for font in fonts {
        data.extend_from_slice(&offset.to_be_bytes());
        let mut body = font.clone();
        let num_tables = u16::from_be_bytes([body[4], body[5]]) as usize;
        for record in 0..num_tables {
            let at = 12 + record * 16 + 8;
            let relative = u32::from_be_bytes(body[at..at + 4].try_into().unwrap());
            body[at..at + 4].copy_from_slice(&(relative + offset).to_be_bytes());
        }
        offset += body.len() as u32;
        bodies.push(body);
    }
    for body in bodies {
        data.extend_from_slice(&body);
    }
    data
}

pub fn simple_file() -> FontFile {
    FontFile::from_memory(simple()).unwrap()
}

pub fn secondary_file() -> FontFile {
    FontFile::from_memory(secondary()).unwrap()
}
