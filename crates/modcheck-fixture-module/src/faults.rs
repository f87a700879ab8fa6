//! Deliberately non-conforming exports.
//!
//! None of these are `no_mangle`; they are bound in-process through
//! `StaticExports` to drive a harness down its failure paths. Buffers they
//! return are `CString`s and must be released with
//! [`FreeMemory`](crate::server_abi::FreeMemory) or [`counting_free`].

use std::ffi::{CString, c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use modcheck_core::ResponseCode;

use crate::store::DataStore;
use crate::util::{into_buffer, release_buffer};

static NULL_BUFFER_CALLS: AtomicUsize = AtomicUsize::new(0);
static NULL_BUFFER2_CALLS: AtomicUsize = AtomicUsize::new(0);
static COUNTED_FREES: AtomicUsize = AtomicUsize::new(0);

/// `int f(char*)` that always succeeds.
pub unsafe extern "C" fn succeed(_: *mut c_char) -> c_int {
    ResponseCode::Success.as_raw()
}

/// `int f(char*, char*)` that always succeeds.
pub unsafe extern "C" fn succeed2(_: *mut c_char, _: *mut c_char) -> c_int {
    ResponseCode::Success.as_raw()
}

/// `int f(char*, char*)` that always reports a conflict (201).
pub unsafe extern "C" fn conflict2(_: *mut c_char, _: *mut c_char) -> c_int {
    ResponseCode::DataStoreConflict.as_raw()
}

/// `int f(char*)` that always reports an unknown instance (105).
pub unsafe extern "C" fn instance_not_found(_: *mut c_char) -> c_int {
    ResponseCode::ServerInstanceNotFound.as_raw()
}

/// `int f(char*, char*)` that always reports malformed state (102).
pub unsafe extern "C" fn state_load_failed2(_: *mut c_char, _: *mut c_char) -> c_int {
    ResponseCode::FailedToLoadState.as_raw()
}

/// `char* f(char*)` returning null.
pub unsafe extern "C" fn null_buffer(_: *mut c_char) -> *mut c_char {
    ptr::null_mut()
}

/// `char* f(char*)` returning null; counted by [`counted_null_buffer_calls`].
pub unsafe extern "C" fn counted_null_buffer(_: *mut c_char) -> *mut c_char {
    NULL_BUFFER_CALLS.fetch_add(1, Ordering::SeqCst);
    ptr::null_mut()
}

pub fn counted_null_buffer_calls() -> usize {
    NULL_BUFFER_CALLS.load(Ordering::SeqCst)
}

/// `char* f(char*, char*)` returning null; counted by
/// [`counted_null_buffer2_calls`].
pub unsafe extern "C" fn counted_null_buffer2(_: *mut c_char, _: *mut c_char) -> *mut c_char {
    NULL_BUFFER2_CALLS.fetch_add(1, Ordering::SeqCst);
    ptr::null_mut()
}

pub fn counted_null_buffer2_calls() -> usize {
    NULL_BUFFER2_CALLS.load(Ordering::SeqCst)
}

/// `char* f(char*, char*)` returning an empty string.
pub unsafe extern "C" fn empty_buffer2(_: *mut c_char, _: *mut c_char) -> *mut c_char {
    CString::default().into_raw()
}

/// An instance-state dump from before triggers, sprocs and udfs existed.
pub unsafe extern "C" fn stale_state(_: *mut c_char) -> *mut c_char {
    into_buffer(
        concat!(
            r#"{"databases": {"test-db": {"id": "test-db", "_ts": 0, "_rid": "", "_etag": "", "_self": ""}}, "#,
            r#""collections": {"test-db": {}}, "documents": {"test-db": {}}}"#,
        )
        .to_owned(),
    )
}

/// A dump that turns into invalid UTF-8 after `{"databases":`.
pub unsafe extern "C" fn invalid_utf8_state(_: *mut c_char) -> *mut c_char {
    CString::new(b"{\"databases\":\xff}".to_vec())
        .map_or_else(|_| ptr::null_mut(), CString::into_raw)
}

/// The conforming dump for `{"databases":{"test-db":{"id":"test-db"}}}`,
/// pretty-printed.
pub unsafe extern "C" fn pretty_state(_: *mut c_char) -> *mut c_char {
    let mut store = DataStore::new();
    let pretty = store
        .load_state(r#"{"databases":{"test-db":{"id":"test-db"}}}"#)
        .and_then(|()| serde_json::to_string_pretty(store.state()));
    match pretty {
        Ok(text) => into_buffer(text),
        Err(_) => ptr::null_mut(),
    }
}

/// A deallocator that counts releases; see [`counted_frees`].
pub unsafe extern "C" fn counting_free(buffer: *mut c_char) {
    COUNTED_FREES.fetch_add(1, Ordering::SeqCst);
    // SAFETY: forwarded caller contract.
    unsafe { release_buffer(buffer) }
}

pub fn counted_frees() -> usize {
    COUNTED_FREES.load(Ordering::SeqCst)
}
