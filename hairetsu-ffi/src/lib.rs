//! C ABI bindings for [`hairetsu`].
//!
//! Every object handed across the boundary is an opaque, reference
//! counted handle. Handles are created with a count of one and shared
//! with [`ha_retain`]; [`ha_release`] drops a reference and destroys the
//! object when the count reaches zero. All functions accept null handles
//! and answer with a null pointer or zeroed value.
//!
//! Rasterized coverage buffers are the one exception to handle
//! ownership: they are transferred to the caller outright and returned
//! with [`ha_raster_free`].

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use hairetsu::{
    Coverage, Face, Font, FontFile, FontMetrics, Glyph, GlyphId, GlyphMetrics, GlyphType,
};

/// Common prefix of every shared allocation.
///
/// `destroy` knows the concrete payload type, so release works through
/// any handle uniformly.
#[repr(C)]
struct Header {
    count: AtomicUsize,
    destroy: unsafe fn(*mut Header),
}

#[repr(C)]
pub struct Shared<T> {
    header: Header,
    value: T,
}

fn alloc<T>(value: T) -> *mut Shared<T> {
    Box::into_raw(Box::new(Shared {
        header: Header {
            count: AtomicUsize::new(1),
            destroy: destroy::<T>,
        },
        value,
    }))
}

unsafe fn destroy<T>(header: *mut Header) {
    drop(Box::from_raw(header as *mut Shared<T>));
}

unsafe fn payload<'a, T>(obj: *mut Shared<T>) -> Option<&'a T> {
    obj.as_ref().map(|shared| &shared.value)
}

fn c_string(value: &str) -> CString {
    CString::new(value).unwrap_or_default()
}

pub struct FilePayload {
    file: FontFile,
    type_name: CString,
    name: CString,
}

pub struct FontPayload {
    font: Font,
    name: CString,
    family: CString,
    subfamily: CString,
    type_name: CString,
}

pub struct FacePayload {
    face: Face,
    /// Unretained pointer mirroring the face's fallback assignment, so
    /// that `ha_face_get_fallback` can hand back the caller's own
    /// pointer. The association is non-owning; the engine's weak
    /// reference is checked before the pointer is ever returned.
    fallback: AtomicPtr<Shared<FacePayload>>,
}

pub struct GlyphPayload {
    glyph: Glyph,
}

pub type FileHandle = Shared<FilePayload>;
pub type FontHandle = Shared<FontPayload>;
pub type FaceHandle = Shared<FacePayload>;
pub type GlyphHandle = Shared<GlyphPayload>;

fn new_font_handle(font: Font) -> *mut FontHandle {
    let type_name = c_string(kinds_label(font.glyph_types()));
    let name = c_string(font.name());
    let family = c_string(font.family());
    let subfamily = c_string(font.subfamily());
    alloc(FontPayload {
        font,
        name,
        family,
        subfamily,
        type_name,
    })
}

fn kinds_label(kinds: GlyphType) -> &'static str {
    if kinds.contains(GlyphType::TTF) {
        "TrueType"
    } else if kinds.contains(GlyphType::CFF) {
        "CFF"
    } else if kinds.contains(GlyphType::CFF2) {
        "CFF2"
    } else if kinds.intersects(GlyphType::BITMAP) {
        "Bitmap"
    } else if kinds.contains(GlyphType::SVG) {
        "SVG"
    } else {
        "None"
    }
}

//
// Engine state
//

#[no_mangle]
pub extern "C" fn ha_get_initialized() -> bool {
    hairetsu::is_initialized()
}

#[no_mangle]
pub extern "C" fn ha_try_initialize() -> bool {
    hairetsu::try_initialize()
}

#[no_mangle]
pub extern "C" fn ha_try_shutdown() -> bool {
    hairetsu::try_shutdown()
}

//
// Memory management
//

/// Adds a reference to any handle. Null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn ha_retain(obj: *mut c_void) {
    if let Some(header) = (obj as *mut Header).as_ref() {
        header.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drops a reference, destroying the object on the last release.
///
/// Returns the handle while references remain, null once destroyed (or
/// when passed null).
#[no_mangle]
pub unsafe extern "C" fn ha_release(obj: *mut c_void) -> *mut c_void {
    let header = obj as *mut Header;
    let Some(shared) = header.as_ref() else {
        return ptr::null_mut();
    };
    if shared.count.fetch_sub(1, Ordering::AcqRel) == 1 {
        (shared.destroy)(header);
        return ptr::null_mut();
    }
    obj
}

//
// Font files
//

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_from_memory(data: *const u8, length: u32) -> *mut FileHandle {
    ha_fontfile_from_memory_with_name(data, length, ptr::null())
}

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_from_memory_with_name(
    data: *const u8,
    length: u32,
    name: *const c_char,
) -> *mut FileHandle {
    if data.is_null() {
        return ptr::null_mut();
    }
    let bytes = std::slice::from_raw_parts(data, length as usize).to_vec();
    let name = if name.is_null() {
        String::new()
    } else {
        CStr::from_ptr(name).to_string_lossy().into_owned()
    };
    match FontFile::from_memory_with_name(bytes, name) {
        Ok(file) => new_file_handle(file),
        Err(e) => {
            log::error!("failed to load font from memory: {e}");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_from_file(path: *const c_char) -> *mut FileHandle {
    if path.is_null() {
        return ptr::null_mut();
    }
    let path = CStr::from_ptr(path).to_string_lossy().into_owned();
    match FontFile::from_file(&path) {
        Ok(file) => new_file_handle(file),
        Err(e) => {
            log::error!("failed to load font from {path:?}: {e}");
            ptr::null_mut()
        }
    }
}

fn new_file_handle(file: FontFile) -> *mut FileHandle {
    let type_name = c_string(file.type_name());
    let name = c_string(file.name());
    alloc(FilePayload {
        file,
        type_name,
        name,
    })
}

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_get_type(obj: *mut FileHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.type_name.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_get_name(obj: *mut FileHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.name.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_get_font_count(obj: *mut FileHandle) -> u32 {
    payload(obj).map_or(0, |p| p.file.font_count())
}

/// Returns a new reference to font `index`, or null when out of range.
#[no_mangle]
pub unsafe extern "C" fn ha_fontfile_get_font(obj: *mut FileHandle, index: u32) -> *mut FontHandle {
    payload(obj)
        .and_then(|p| p.file.font(index))
        .map_or(ptr::null_mut(), new_font_handle)
}

//
// Fonts
//

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_name(obj: *mut FontHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.name.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_family(obj: *mut FontHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.family.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_subfamily(obj: *mut FontHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.subfamily.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_type(obj: *mut FontHandle) -> *const c_char {
    payload(obj).map_or(ptr::null(), |p| p.type_name.as_ptr())
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_glyph_count(obj: *mut FontHandle) -> u32 {
    payload(obj).map_or(0, |p| u32::from(p.font.glyph_count()))
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_upem(obj: *mut FontHandle) -> u32 {
    payload(obj).map_or(0, |p| u32::from(p.font.upem()))
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_lowest_ppem(obj: *mut FontHandle) -> u32 {
    payload(obj).map_or(0, |p| u32::from(p.font.lowest_ppem()))
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_get_global_metrics(obj: *mut FontHandle) -> FontMetrics {
    payload(obj).map_or_else(FontMetrics::default, |p| p.font.metrics())
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_glyph_metrics_for(
    obj: *mut FontHandle,
    glyph_id: u32,
) -> GlyphMetrics {
    payload(obj).map_or_else(GlyphMetrics::default, |p| {
        p.font.glyph_metrics(GlyphId::new(glyph_id))
    })
}

#[no_mangle]
pub unsafe extern "C" fn ha_font_find_glyph(obj: *mut FontHandle, codepoint: u32) -> u32 {
    payload(obj).map_or(0, |p| p.font.find_glyph_raw(codepoint).to_u32())
}

/// Creates a new face viewing this font, with one reference.
#[no_mangle]
pub unsafe extern "C" fn ha_font_create_face(obj: *mut FontHandle) -> *mut FaceHandle {
    payload(obj).map_or(ptr::null_mut(), |p| {
        alloc(FacePayload {
            face: p.font.create_face(),
            fallback: AtomicPtr::new(ptr::null_mut()),
        })
    })
}

//
// Faces
//

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_upem(obj: *mut FaceHandle) -> u32 {
    payload(obj).map_or(0, |p| u32::from(p.face.upem()))
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_scale(obj: *mut FaceHandle) -> f32 {
    payload(obj).map_or(0.0, |p| p.face.scale())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_ppem(obj: *mut FaceHandle) -> f32 {
    payload(obj).map_or(0.0, |p| p.face.ppem())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_glyph_count(obj: *mut FaceHandle) -> u32 {
    payload(obj).map_or(0, |p| u32::from(p.face.glyph_count()))
}

/// Returns the current fallback handle without adding a reference, or
/// null once the fallback has been released.
#[no_mangle]
pub unsafe extern "C" fn ha_face_get_fallback(obj: *mut FaceHandle) -> *mut FaceHandle {
    let Some(p) = payload(obj) else {
        return ptr::null_mut();
    };
    // The fallback is non-owning: the handle dies when the caller drops
    // its last reference, and the engine's weak reference dies with it.
    // Never return the stored pointer without that liveness check.
    if p.face.fallback().is_none() {
        p.fallback.store(ptr::null_mut(), Ordering::Release);
        return ptr::null_mut();
    }
    p.fallback.load(Ordering::Acquire)
}

/// Assigns the fallback face without retaining it; pass null to clear.
///
/// The association is non-owning: releasing the fallback's last
/// reference destroys it and detaches it from this face. An assignment
/// that would create a cycle is rejected and clears the fallback
/// instead.
#[no_mangle]
pub unsafe extern "C" fn ha_face_set_fallback(obj: *mut FaceHandle, fallback: *mut FaceHandle) {
    let Some(p) = payload(obj) else {
        return;
    };
    p.face.set_fallback(payload(fallback).map(|f| &f.face));
    // The engine rejects cyclic assignments; only mirror what it kept.
    let accepted = if !fallback.is_null() && p.face.fallback().is_some() {
        fallback
    } else {
        ptr::null_mut()
    };
    p.fallback.store(accepted, Ordering::Release);
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_hinting(obj: *mut FaceHandle) -> bool {
    payload(obj).is_some_and(|p| p.face.hinting())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_set_hinting(obj: *mut FaceHandle, value: bool) {
    if let Some(p) = payload(obj) {
        p.face.set_hinting(value);
    }
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_dpi(obj: *mut FaceHandle) -> f32 {
    payload(obj).map_or(0.0, |p| p.face.dpi())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_set_dpi(obj: *mut FaceHandle, value: f32) {
    if let Some(p) = payload(obj) {
        p.face.set_dpi(value);
    }
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_pt(obj: *mut FaceHandle) -> f32 {
    payload(obj).map_or(0.0, |p| p.face.pt())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_set_pt(obj: *mut FaceHandle, value: f32) {
    if let Some(p) = payload(obj) {
        p.face.set_pt(value);
    }
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_px(obj: *mut FaceHandle) -> f32 {
    payload(obj).map_or(0.0, |p| p.face.px())
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_set_px(obj: *mut FaceHandle, value: f32) {
    if let Some(p) = payload(obj) {
        p.face.set_px(value);
    }
}

#[no_mangle]
pub unsafe extern "C" fn ha_face_get_global_metrics(obj: *mut FaceHandle) -> FontMetrics {
    payload(obj).map_or_else(FontMetrics::default, |p| p.face.metrics())
}

/// Resolves a glyph; `accept` is an OR of `HA_GLYPH_TYPE_*` flags.
///
/// Always returns a glyph handle (with one reference); unresolvable
/// requests yield a glyph with no data. Null faces return null.
#[no_mangle]
pub unsafe extern "C" fn ha_face_get_glyph(
    obj: *mut FaceHandle,
    glyph_id: u32,
    accept: u32,
) -> *mut GlyphHandle {
    payload(obj).map_or(ptr::null_mut(), |p| {
        let mask = GlyphType::from_bits_truncate(accept);
        alloc(GlyphPayload {
            glyph: p.face.glyph(GlyphId::new(glyph_id), mask),
        })
    })
}

//
// Glyphs
//

/// Releases a glyph handle; equivalent to [`ha_release`].
#[no_mangle]
pub unsafe extern "C" fn ha_glyph_free(obj: *mut GlyphHandle) {
    ha_release(obj as *mut c_void);
}

#[no_mangle]
pub unsafe extern "C" fn ha_glyph_get_metrics(obj: *mut GlyphHandle) -> GlyphMetrics {
    payload(obj).map_or_else(GlyphMetrics::default, |p| p.glyph.metrics())
}

#[no_mangle]
pub unsafe extern "C" fn ha_glyph_get_type(obj: *mut GlyphHandle) -> u32 {
    payload(obj).map_or(0, |p| p.glyph.glyph_type().bits())
}

#[no_mangle]
pub unsafe extern "C" fn ha_glyph_get_id(obj: *mut GlyphHandle) -> u32 {
    payload(obj).map_or(0, |p| p.glyph.id().to_u32())
}

#[no_mangle]
pub unsafe extern "C" fn ha_glyph_get_has_data(obj: *mut GlyphHandle) -> bool {
    payload(obj).is_some_and(|p| p.glyph.has_data())
}

/// Returns a borrowed pointer to the glyph's SVG document bytes.
///
/// The pointer stays valid as long as the glyph handle is alive. Null
/// (with `*length == 0`) when the glyph has no SVG representation.
#[no_mangle]
pub unsafe extern "C" fn ha_glyph_get_svg(
    obj: *mut GlyphHandle,
    length: *mut u32,
) -> *const c_char {
    if let Some(out) = length.as_mut() {
        *out = 0;
    }
    let Some(data) = payload(obj).and_then(|p| p.glyph.svg_data()) else {
        return ptr::null();
    };
    if let Some(out) = length.as_mut() {
        *out = data.len() as u32;
    }
    data.as_ptr() as *const c_char
}

unsafe fn write_coverage(
    coverage: Coverage,
    data: *mut *mut u8,
    length: *mut u32,
    width: *mut u32,
    height: *mut u32,
) {
    if let Some(out) = width.as_mut() {
        *out = coverage.width;
    }
    if let Some(out) = height.as_mut() {
        *out = coverage.height;
    }
    let buffer = coverage.data.into_boxed_slice();
    if let Some(out) = length.as_mut() {
        *out = buffer.len() as u32;
    }
    if let Some(out) = data.as_mut() {
        *out = if buffer.is_empty() {
            ptr::null_mut()
        } else {
            Box::into_raw(buffer) as *mut u8
        };
    }
}

/// Rasterizes the glyph to an anti-aliased coverage buffer.
///
/// Ownership of `*data` transfers to the caller; free it with
/// [`ha_raster_free`]. Glyphs with nothing to render produce a null
/// buffer with zero dimensions.
#[no_mangle]
pub unsafe extern "C" fn ha_glyph_rasterize(
    obj: *mut GlyphHandle,
    data: *mut *mut u8,
    length: *mut u32,
    width: *mut u32,
    height: *mut u32,
) {
    let coverage = payload(obj).map_or_else(Coverage::default, |p| p.glyph.rasterize());
    write_coverage(coverage, data, length, width, height);
}

/// Rasterizes the glyph to a binary (0 or 255) coverage buffer. See
/// [`ha_glyph_rasterize`] for ownership.
#[no_mangle]
pub unsafe extern "C" fn ha_glyph_rasterize_aliased(
    obj: *mut GlyphHandle,
    data: *mut *mut u8,
    length: *mut u32,
    width: *mut u32,
    height: *mut u32,
) {
    let coverage = payload(obj).map_or_else(Coverage::default, |p| p.glyph.rasterize_aliased());
    write_coverage(coverage, data, length, width, height);
}

/// Frees a coverage buffer returned by the rasterize functions.
#[no_mangle]
pub unsafe extern "C" fn ha_raster_free(data: *mut u8, length: u32) {
    if data.is_null() || length == 0 {
        return;
    }
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
        data,
        length as usize,
    )));
}
