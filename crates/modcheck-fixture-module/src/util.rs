//! Shared helpers for the extern "C" exports.

use std::ffi::{CStr, CString, c_char, c_int};

use modcheck_core::ResponseCode;

use crate::store::StoreResult;

/// Borrow a caller string as UTF-8. `None` for null or non-UTF-8 input.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Hand `text` to the caller as a heap buffer owned by this module.
///
/// The caller releases it with `FreeMemory`. Text with an interior NUL
/// cannot be represented and is returned as an empty buffer.
pub fn into_buffer(text: String) -> *mut c_char {
    CString::new(text).unwrap_or_default().into_raw()
}

/// The "not found" answer of every getter: an empty, freeable buffer.
pub fn empty_buffer() -> *mut c_char {
    CString::default().into_raw()
}

/// Take back a buffer produced by [`into_buffer`] or [`empty_buffer`].
///
/// # Safety
///
/// `ptr` must be null or a pointer this module returned and that has not
/// been released yet.
pub unsafe fn release_buffer(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

/// Serialize `value`, or fall back to an empty buffer.
pub fn json_buffer<T: serde::Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(text) => into_buffer(text),
        Err(_) => empty_buffer(),
    }
}

/// Map a store outcome to the export's return code. `None` means the
/// instance was not found.
pub fn status<T>(outcome: Option<StoreResult<T>>) -> c_int {
    match outcome {
        Some(Ok(_)) => ResponseCode::Success.as_raw(),
        Some(Err(err)) => ResponseCode::from(err).as_raw(),
        None => ResponseCode::ServerInstanceNotFound.as_raw(),
    }
}
