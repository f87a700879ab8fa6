//! Buffers owned across the module boundary.
//!
//! A string returned by a module export was allocated by the module, which may
//! use a different heap than this process. It is read in place and handed
//! back to the module's own deallocator exactly once, when the
//! [`ModuleBuffer`] is dropped. It is never passed to the host allocator.

use std::borrow::Cow;
use std::ffi::{CStr, c_char};
use std::fmt;
use std::ptr::NonNull;

use crate::symbol::{FreeFn, Symbol};

/// A module-allocated, NUL-terminated string on loan to the harness.
pub struct ModuleBuffer<'m> {
    ptr: NonNull<c_char>,
    producer: &'static str,
    free: Symbol<'m, FreeFn>,
}

impl<'m> ModuleBuffer<'m> {
    /// Take ownership of `ptr`, or return `None` when it is null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a NUL-terminated string allocated by the
    /// module `free` belongs to, not yet released, and not shared.
    pub(crate) unsafe fn from_raw(
        ptr: *mut c_char,
        producer: &'static str,
        free: Symbol<'m, FreeFn>,
    ) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            producer,
            free,
        })
    }

    /// Export that produced this buffer.
    #[must_use]
    pub fn producer(&self) -> &'static str {
        self.producer
    }

    /// Export that will release this buffer.
    #[must_use]
    pub fn deallocator(&self) -> &'static str {
        self.free.name()
    }

    #[must_use]
    pub fn as_cstr(&self) -> &CStr {
        // SAFETY: `from_raw` contract; the buffer is live until `drop`.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Contents as text, replacing invalid UTF-8.
    #[must_use]
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        self.as_cstr().to_string_lossy()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_cstr().is_empty()
    }
}

impl Drop for ModuleBuffer<'_> {
    fn drop(&mut self) {
        // SAFETY: the pointer came from the module `free` belongs to and
        // `ModuleBuffer` is neither `Clone` nor `Copy`, so this runs once.
        unsafe { self.free.release(self.ptr) }
    }
}

impl fmt::Debug for ModuleBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBuffer")
            .field("producer", &self.producer)
            .field("deallocator", &self.free.name())
            .field("contents", &self.to_str_lossy())
            .finish()
    }
}
