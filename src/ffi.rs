//! FFI interface for C/C++ hosts
//!
//! Exposes extraction and batch preview over saved filter-page HTML.
//! All structured data crosses the boundary as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::batch::{BatchInserter, BatchOutcome, BatchRequest};
use crate::config::HelperConfig;
use crate::extract::{export_filename, extract, to_tsv, ExtractedRule};
use crate::location::is_filters_page;
use crate::page::FilterPage;
use crate::timing::{ManualClock, ManualScheduler};
use crate::values::{normalize_for_header, parse_values};

/// Result struct returned to the caller
/// Both pointers are owned by Rust and must be freed via free_helper_result
#[repr(C)]
pub struct HelperResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Serialize)]
struct ExportFFI {
    filename: String,
    content: String,
}

#[derive(Serialize)]
struct PreviewFFI {
    outcome: BatchOutcome,
    rules: Vec<ExtractedRule>,
}

/// Extract all rules from filter-page HTML as a JSON array of
/// `{header, operator, value}`.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `config_json` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_helper_result`
#[no_mangle]
pub unsafe extern "C" fn extract_rules_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    config_json: *const c_char,
) -> HelperResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(e) => return make_error_result(e),
    };
    let config = match read_config(config_json) {
        Ok(c) => c,
        Err(e) => return make_error_result(&e),
    };

    match FilterPage::parse(&html, &config) {
        Ok(page) => make_json_result(&extract(&page)),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Build the tab-separated export for filter-page HTML as
/// `{filename, content}`.
///
/// # Safety
/// Same as extract_rules_from_html
#[no_mangle]
pub unsafe extern "C" fn export_rules_tsv(
    html_ptr: *const c_char,
    html_len: usize,
    config_json: *const c_char,
) -> HelperResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(e) => return make_error_result(e),
    };
    let config = match read_config(config_json) {
        Ok(c) => c,
        Err(e) => return make_error_result(&e),
    };

    let page = match FilterPage::parse(&html, &config) {
        Ok(p) => p,
        Err(e) => return make_error_result(&e.to_string()),
    };
    let rules = extract(&page);
    if rules.is_empty() {
        return make_error_result("No rules detected on this page");
    }
    make_json_result(&ExportFFI {
        filename: export_filename(&config.export_prefix, Utc::now()),
        content: to_tsv(&rules),
    })
}

/// Split raw user input into values, applying address cleanup for the
/// given header. Returns a JSON array of strings.
///
/// # Safety
/// - `raw` must be a valid null-terminated C string
/// - `header` must be null or a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn parse_values_ffi(
    raw: *const c_char,
    header: *const c_char,
) -> HelperResultFFI {
    let raw = match read_c_str(raw) {
        Some(s) => s,
        None => return make_error_result("Values are null or not UTF-8"),
    };
    let header = read_c_str(header).unwrap_or("");
    make_json_result(&parse_values(&normalize_for_header(raw, header)))
}

/// Run a batch against filter-page HTML and return the outcome together
/// with the rules the page would then contain.
///
/// The simulated page adds rows immediately, so nothing waits on a timer.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_helper_result`
#[no_mangle]
pub unsafe extern "C" fn preview_batch_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> HelperResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(e) => return make_error_result(e),
    };
    let request_str = match read_c_str(request_json) {
        Some(s) => s,
        None => return make_error_result("Request JSON is null or not UTF-8"),
    };
    let request: BatchRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => {
            return make_error_result(&format!("Failed to parse request JSON: {}", e));
        }
    };

    let config = HelperConfig::default();
    let mut page = match FilterPage::parse(&html, &config) {
        Ok(p) => p,
        Err(e) => return make_error_result(&e.to_string()),
    };
    let clock = ManualClock::new();
    let scheduler = ManualScheduler {
        clock: clock.clone(),
        step: Duration::from_millis(config.poll_interval_ms),
    };
    let inserter = BatchInserter::new(clock, scheduler, config.poll_timeout());

    match futures::executor::block_on(inserter.insert_batch(&mut page, &request)) {
        Ok(outcome) => make_json_result(&PreviewFFI {
            outcome,
            rules: extract(&page),
        }),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// True (1) if `url` is an email-filter page, else 0.
///
/// # Safety
/// `url` must be null or a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn is_filters_page_ffi(url: *const c_char) -> i32 {
    read_c_str(url).map_or(0, |u| is_filters_page(u) as i32)
}

/// Free a HelperResultFFI returned by any function in this module
///
/// # Safety
/// - `result` must have been returned by this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_helper_result(result: HelperResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

// Null config means defaults
unsafe fn read_config(config_json: *const c_char) -> Result<HelperConfig, String> {
    if config_json.is_null() {
        return Ok(HelperConfig::default());
    }
    let json = read_c_str(config_json).ok_or("Invalid UTF-8 in config JSON")?;
    HelperConfig::from_json(json).map_err(|e| e.to_string())
}

fn make_json_result<T: Serialize>(value: &T) -> HelperResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => HelperResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> HelperResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    HelperResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
