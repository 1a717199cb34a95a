//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Buffers returned by `asnl_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `asnl_free_buffer` / `asnl_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `asnl_last_error`.
//!
//! ## Thread safety
//! - Each call builds its own registry and render state; `asnl_last_error`
//!   uses a thread-local, so concurrent calls from different threads are safe.
//!
//! ## Usage from C
//! ```c
//! AsnlRequest req = { "avery5160", "{\"codePrefix\":\"BOX\"}", NULL, 0, 2 };
//! uint8_t *pdf; uint32_t len;
//! if (asnl_generate_pdf(&req, &pdf, &len) != 0) puts(asnl_last_error());
//! asnl_free_buffer(pdf, len);
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::error::{LabelError, Result};
use crate::layout_config::DocumentLayout;
use crate::options::RenderOptions;
use crate::pipeline::{compute_layout, generate_pdf, render_layout_pdf, resolve_total};
use crate::sheet::SheetRegistry;

/// Format used when the request leaves `format` null.
const DEFAULT_FORMAT: &str = "averyL4731";

const ERR_NULL: c_int = 1;
const ERR_INPUT: c_int = 2;
const ERR_RENDER: c_int = 3;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg.replace('\0', " ")).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

// ---------------------------------------------------------------------------
// C-compatible request
// ---------------------------------------------------------------------------

/// A label-sheet render request.
///
/// Null pointers and zero counts fall back to defaults:
/// - `format`       → `"averyL4731"`
/// - `options_json` → default options
/// - `formats_json` → built-in formats only
/// - `labels`       → `pages` × slots per page
/// - `pages`        → 1
#[repr(C)]
pub struct AsnlRequest {
    /// Null-terminated sheet format key.
    pub format: *const c_char,
    /// Null-terminated JSON render options (camelCase keys, all optional).
    pub options_json: *const c_char,
    /// Null-terminated JSON object of extra sheet formats.
    pub formats_json: *const c_char,
    /// Absolute slot count including skipped slots; `0` to use `pages`.
    pub labels: u32,
    /// Whole pages to fill when `labels` is `0`.
    pub pages: u32,
}

struct Job {
    registry: SheetRegistry,
    format: String,
    options: RenderOptions,
    total: usize,
}

/// # Safety
/// Every non-null pointer must point to a valid null-terminated string.
unsafe fn optional_str<'a>(p: *const c_char, field: &'static str) -> Result<Option<&'a str>> {
    if p.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(p)
        .to_str()
        .map(Some)
        .map_err(|e| LabelError::invalid_option(field, format!("not valid UTF-8: {e}")))
}

/// Convert an `AsnlRequest` (FFI) into a validated job (Rust).
///
/// # Safety
/// See [`optional_str`].
unsafe fn job_from_c(req: &AsnlRequest) -> Result<Job> {
    let mut registry = SheetRegistry::builtin();
    if let Some(json) = optional_str(req.formats_json, "formats_json")? {
        registry.extend_from_json(json)?;
    }

    let format = optional_str(req.format, "format")?
        .unwrap_or(DEFAULT_FORMAT)
        .to_string();
    let options = match optional_str(req.options_json, "options_json")? {
        Some(json) => RenderOptions::from_json(json)?,
        None => RenderOptions::default(),
    };

    let layout = registry.get(&format)?;
    let labels = (req.labels > 0).then_some(req.labels as usize);
    let pages = if req.pages == 0 { 1 } else { req.pages as usize };
    let total = resolve_total(layout, labels, pages)?;

    Ok(Job {
        registry,
        format,
        options,
        total,
    })
}

unsafe fn write_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) -> c_int {
    let Ok(len) = u32::try_from(bytes.len()) else {
        set_last_error("Output larger than 4 GiB");
        return ERR_RENDER;
    };
    let raw = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
    *out_buf = raw;
    *out_len = len;
    0
}

unsafe fn write_string(s: String, out: *mut *mut c_char) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(e) => {
            set_last_error(&format!("Output contains a NUL byte: {e}"));
            ERR_RENDER
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Render a label document to PDF.
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `asnl_last_error`.
///
/// # Safety
/// - `req` must point to a valid `AsnlRequest` whose string fields are null
///   or null-terminated UTF-8.
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `asnl_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn asnl_generate_pdf(
    req: *const AsnlRequest,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    clear_last_error();
    if req.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let job = match job_from_c(&*req) {
        Ok(job) => job,
        Err(e) => {
            set_last_error(&e.to_string());
            return ERR_INPUT;
        }
    };

    match generate_pdf(&job.registry, &job.format, &job.options, job.total) {
        Ok((pdf_bytes, _summary)) => write_buffer(pdf_bytes, out_buf, out_len),
        Err(e) => {
            set_last_error(&e.to_string());
            ERR_RENDER
        }
    }
}

/// Compute the layout snapshot (JSON) without producing a PDF.
///
/// # Safety
/// Same as `asnl_generate_pdf`. `*out_json` must be freed with
/// `asnl_free_string`.
#[no_mangle]
pub unsafe extern "C" fn asnl_compute_layout(
    req: *const AsnlRequest,
    out_json: *mut *mut c_char,
) -> c_int {
    clear_last_error();
    if req.is_null() || out_json.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let job = match job_from_c(&*req) {
        Ok(job) => job,
        Err(e) => {
            set_last_error(&e.to_string());
            return ERR_INPUT;
        }
    };

    match compute_layout(&job.registry, &job.format, &job.options, job.total) {
        Ok((document, _summary)) => write_string(document.to_json(), out_json),
        Err(e) => {
            set_last_error(&e.to_string());
            ERR_RENDER
        }
    }
}

/// Render a layout snapshot JSON (as produced by `asnl_compute_layout`) to
/// PDF.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers; free the result with
///   `asnl_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn asnl_render_from_layout(
    json_ptr: *const u8,
    json_len: u32,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    clear_last_error();
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    let json_bytes = slice::from_raw_parts(json_ptr, json_len as usize);
    let json = match std::str::from_utf8(json_bytes) {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8: {e}"));
            return ERR_INPUT;
        }
    };
    let document = match DocumentLayout::from_json(json) {
        Ok(d) => d,
        Err(e) => {
            set_last_error(&e.to_string());
            return ERR_INPUT;
        }
    };

    match render_layout_pdf(&document) {
        Ok(bytes) => write_buffer(bytes, out_buf, out_len),
        Err(e) => {
            set_last_error(&e.to_string());
            ERR_RENDER
        }
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `asnl_generate_pdf`.
///
/// # Safety
/// `buf` must have been returned by a previous `asnl_generate_pdf` (or similar)
/// call, and `len` must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn asnl_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by `asnl_compute_layout`.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn asnl_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `asnl_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if the last call succeeded.
#[no_mangle]
pub extern "C" fn asnl_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn asnl_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: &CStr, options: Option<&CStr>, labels: u32) -> AsnlRequest {
        AsnlRequest {
            format: format.as_ptr(),
            options_json: options.map_or(ptr::null(), CStr::as_ptr),
            formats_json: ptr::null(),
            labels,
            pages: 0,
        }
    }

    #[test]
    fn ffi_generate_pdf() {
        let req = request(c"avery5160", None, 10);
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe { asnl_generate_pdf(&req, &mut out_buf, &mut out_len) };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out_buf.is_null());
        assert!(out_len > 100);

        // Verify PDF header
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");

        // Free
        unsafe { asnl_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_compute_layout() {
        let req = request(c"avery5160", Some(c"{\"codePrefix\":\"BOX\",\"counterDigits\":2}"), 3);
        let mut json_ptr: *mut c_char = ptr::null_mut();

        let rc = unsafe { asnl_compute_layout(&req, &mut json_ptr) };

        assert_eq!(rc, 0);
        assert!(!json_ptr.is_null());

        let json = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        assert!(json.contains("pages"));
        assert!(json.contains("BOX03"));

        unsafe { asnl_free_string(json_ptr) };
    }

    #[test]
    fn ffi_layout_round_trips_to_pdf() {
        let req = request(c"avery5167", None, 0);
        let mut json_ptr: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { asnl_compute_layout(&req, &mut json_ptr) }, 0);
        let json = unsafe { CStr::from_ptr(json_ptr) }.to_bytes().to_vec();
        unsafe { asnl_free_string(json_ptr) };

        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe {
            asnl_render_from_layout(json.as_ptr(), json.len() as u32, &mut out_buf, &mut out_len)
        };
        assert_eq!(rc, 0);
        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");
        unsafe { asnl_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe { asnl_generate_pdf(ptr::null(), &mut out_buf, &mut out_len) };

        assert_eq!(rc, ERR_NULL, "Should fail on null input");
        assert!(!asnl_last_error().is_null());
    }

    #[test]
    fn ffi_unknown_format_sets_error() {
        let req = request(c"nope", None, 1);
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe { asnl_generate_pdf(&req, &mut out_buf, &mut out_len) };

        assert_eq!(rc, ERR_INPUT);
        let msg = unsafe { CStr::from_ptr(asnl_last_error()) }.to_str().unwrap();
        assert!(msg.contains("Unknown label format: nope"), "{msg}");
    }

    #[test]
    fn ffi_custom_formats() {
        let formats = c"{\"mini\": {\"grid\": {\"columns\": 2, \"rows\": 1}, \"cellSize\": {\"width\": 60, \"height\": 20}, \"pageSize\": \"A5\"}}";
        let req = AsnlRequest {
            format: c"mini".as_ptr(),
            options_json: ptr::null(),
            formats_json: formats.as_ptr(),
            labels: 0,
            pages: 2,
        };
        let mut json_ptr: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { asnl_compute_layout(&req, &mut json_ptr) }, 0);
        let document =
            DocumentLayout::from_json(unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap())
                .unwrap();
        unsafe { asnl_free_string(json_ptr) };
        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.texts().count(), 4);
    }

    #[test]
    fn ffi_invalid_utf8_is_an_input_error() {
        let format = c"avery\xff";
        let req = request(format, None, 1);
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe { asnl_generate_pdf(&req, &mut out_buf, &mut out_len) };

        assert_eq!(rc, ERR_INPUT);
        let msg = unsafe { CStr::from_ptr(asnl_last_error()) }.to_str().unwrap();
        assert!(msg.starts_with("Invalid option `format`"), "{msg}");
    }

    #[test]
    fn ffi_version() {
        let v = asnl_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
