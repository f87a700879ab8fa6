//! `LoadLibraryW` backend.

use std::ffi::{CStr, c_char, c_void};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr::{self, NonNull};

use super::{Loader, RawHandle};
use crate::error::LoadError;

const FORMAT_MESSAGE_IGNORE_INSERTS: u32 = 0x0000_0200;
const FORMAT_MESSAGE_FROM_SYSTEM: u32 = 0x0000_1000;

#[link(name = "kernel32")]
unsafe extern "system" {
    fn LoadLibraryW(file_name: *const u16) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, proc_name: *const c_char) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> i32;
    fn GetLastError() -> u32;
    fn FormatMessageW(
        flags: u32,
        source: *const c_void,
        message_id: u32,
        language_id: u32,
        buffer: *mut u16,
        size: u32,
        arguments: *const c_void,
    ) -> u32;
}

/// Backend over the Win32 library loader.
#[derive(Debug, Clone, Copy)]
pub struct WindowsLoader;

impl Loader for WindowsLoader {
    const NAME: &'static str = "windows";

    unsafe fn open(path: &Path) -> Result<RawHandle, LoadError> {
        let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
        if wide.contains(&0) {
            return Err(LoadError::InvalidPath {
                path: path.to_path_buf(),
            });
        }
        wide.push(0);
        // SAFETY: `wide` is NUL-terminated UTF-16 and outlives the call.
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        NonNull::new(handle).ok_or_else(|| LoadError::Open {
            path: path.to_path_buf(),
            message: last_error(),
        })
    }

    unsafe fn symbol(handle: RawHandle, name: &CStr) -> Result<NonNull<c_void>, String> {
        // SAFETY: caller guarantees `handle` is open; `name` is NUL-terminated.
        let sym = unsafe { GetProcAddress(handle.as_ptr(), name.as_ptr()) };
        NonNull::new(sym).ok_or_else(last_error)
    }

    unsafe fn close(handle: RawHandle) -> Result<(), String> {
        // SAFETY: caller guarantees `handle` is open and unused afterwards.
        let ok = unsafe { FreeLibrary(handle.as_ptr()) };
        if ok != 0 { Ok(()) } else { Err(last_error()) }
    }
}

fn last_error() -> String {
    // SAFETY: no preconditions.
    let code = unsafe { GetLastError() };
    let mut buf = [0u16; 512];
    // SAFETY: `buf` is writable for `buf.len()` UTF-16 units; no inserts.
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            ptr::null(),
            code,
            0,
            buf.as_mut_ptr(),
            buf.len() as u32,
            ptr::null(),
        )
    };
    if len == 0 {
        return format!("error code {code}");
    }
    let text = String::from_utf16_lossy(&buf[..len as usize]);
    format!("{} (error code {code})", text.trim_end())
}
