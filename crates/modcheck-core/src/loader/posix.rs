//! `dlopen` backend.

use std::ffi::{CStr, CString, c_void};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

use super::{Loader, RawHandle};
use crate::error::LoadError;

/// Backend over `<dlfcn.h>`.
#[derive(Debug, Clone, Copy)]
pub struct PosixLoader;

impl Loader for PosixLoader {
    const NAME: &'static str = "posix";

    unsafe fn open(path: &Path) -> Result<RawHandle, LoadError> {
        let c_path =
            CString::new(path.as_os_str().as_bytes()).map_err(|_| LoadError::InvalidPath {
                path: path.to_path_buf(),
            })?;
        clear_error();
        // SAFETY: `c_path` is NUL-terminated and outlives the call.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY | libc::RTLD_LOCAL) };
        NonNull::new(handle).ok_or_else(|| LoadError::Open {
            path: path.to_path_buf(),
            message: last_error(),
        })
    }

    unsafe fn symbol(handle: RawHandle, name: &CStr) -> Result<NonNull<c_void>, String> {
        clear_error();
        // SAFETY: caller guarantees `handle` is open; `name` is NUL-terminated.
        let sym = unsafe { libc::dlsym(handle.as_ptr(), name.as_ptr()) };
        NonNull::new(sym).ok_or_else(last_error)
    }

    unsafe fn close(handle: RawHandle) -> Result<(), String> {
        clear_error();
        // SAFETY: caller guarantees `handle` is open and unused afterwards.
        let rc = unsafe { libc::dlclose(handle.as_ptr()) };
        if rc == 0 { Ok(()) } else { Err(last_error()) }
    }
}

fn clear_error() {
    // SAFETY: dlerror has no preconditions; the result is discarded.
    unsafe {
        libc::dlerror();
    }
}

fn last_error() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated string that stays
    // valid until the next dl* call on this thread; it is copied out here.
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return String::from("unknown dynamic loader error");
    }
    // SAFETY: non-null result of dlerror, see above.
    unsafe { CStr::from_ptr(msg) }
        .to_string_lossy()
        .into_owned()
}
