//! C interface for dynamic loading
//!
//! Functions returning `*mut c_char` hand ownership to the caller, who must
//! release the string with [`autosplitter_free_string`]. Those that report
//! errors return null on success.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::config::AutosplitterConfig;
use crate::core::{Autosplitter, AutosplitterState};
use crate::Result;

static AUTOSPLITTER: Lazy<Mutex<Option<Autosplitter>>> = Lazy::new(|| Mutex::new(None));

fn into_c_string(text: impl Into<String>) -> *mut c_char {
    let text: String = text.into().replace('\0', "");
    CString::new(text).map_or(std::ptr::null_mut(), CString::into_raw)
}

/// Borrow a caller string, `None` for null
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<std::borrow::Cow<'a, str>> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy())
    }
}

fn with_autosplitter(f: impl FnOnce(&Autosplitter) -> Result<()>) -> *mut c_char {
    let guard = AUTOSPLITTER.lock();
    match guard.as_ref() {
        Some(autosplitter) => match f(autosplitter) {
            Ok(()) => std::ptr::null_mut(),
            Err(e) => into_c_string(e.to_string()),
        },
        None => into_c_string("Autosplitter not initialized"),
    }
}

/// Initialize the autosplitter with the default configuration (call once at startup)
#[no_mangle]
pub extern "C" fn autosplitter_init() -> bool {
    let mut guard = AUTOSPLITTER.lock();
    if guard.is_none() {
        *guard = Some(Autosplitter::default());
        true
    } else {
        false
    }
}

/// Check if autosplitter is initialized
#[no_mangle]
pub extern "C" fn autosplitter_is_initialized() -> bool {
    AUTOSPLITTER.lock().is_some()
}

/// Load a TOML configuration file
/// Returns error message or null on success (caller must free error string)
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn autosplitter_load_config(path: *const c_char) -> *mut c_char {
    let Some(path) = borrow_str(path) else {
        return into_c_string("Null pointer passed");
    };
    with_autosplitter(|a| a.set_config(AutosplitterConfig::load(&*path)?))
}

/// Load a configuration from TOML text
/// Returns error message or null on success (caller must free error string)
///
/// # Safety
/// `toml` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn autosplitter_load_config_toml(toml: *const c_char) -> *mut c_char {
    let Some(toml) = borrow_str(toml) else {
        return into_c_string("Null pointer passed");
    };
    with_autosplitter(|a| a.set_config(AutosplitterConfig::from_toml_str(&toml)?))
}

/// Replace the split list
/// splits_json: JSON array of `{"category": ..., "identifier": ...}` objects
/// Returns error message or null on success (caller must free error string)
///
/// # Safety
/// `splits_json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn autosplitter_set_splits(splits_json: *const c_char) -> *mut c_char {
    let Some(json) = borrow_str(splits_json) else {
        return into_c_string("Null pointer passed");
    };
    with_autosplitter(|a| a.set_splits_json(&json))
}

/// Start watching for the game
/// Returns error message or null on success (caller must free error string)
#[no_mangle]
pub extern "C" fn autosplitter_start() -> *mut c_char {
    with_autosplitter(Autosplitter::start)
}

/// Stop the autosplitter
#[no_mangle]
pub extern "C" fn autosplitter_stop() {
    if let Some(autosplitter) = AUTOSPLITTER.lock().as_ref() {
        autosplitter.stop();
    }
}

/// End the current session
#[no_mangle]
pub extern "C" fn autosplitter_reset() {
    if let Some(autosplitter) = AUTOSPLITTER.lock().as_ref() {
        autosplitter.reset();
    }
}

/// Check if autosplitter is running
#[no_mangle]
pub extern "C" fn autosplitter_is_running() -> bool {
    AUTOSPLITTER
        .lock()
        .as_ref()
        .map(Autosplitter::is_running)
        .unwrap_or(false)
}

/// Get autosplitter state as JSON string
/// Caller must free the returned string with autosplitter_free_string
#[no_mangle]
pub extern "C" fn autosplitter_get_state_json() -> *mut c_char {
    let state = AUTOSPLITTER
        .lock()
        .as_ref()
        .map(Autosplitter::state)
        .unwrap_or_else(AutosplitterState::default);

    let json = serde_json::to_string(&state).unwrap_or_else(|_| "{}".to_string());
    into_c_string(json)
}

/// Free a string returned by the autosplitter
///
/// # Safety
/// `s` must be null or a string previously returned by this library.
#[no_mangle]
pub unsafe extern "C" fn autosplitter_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn autosplitter_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
