//! Native dynamic-loading backends.
//!
//! Two incompatible platform APIs sit behind [`Loader`]: `dlopen`/`dlsym`
//! on unix ([`PosixLoader`]) and `LoadLibraryW`/`GetProcAddress` on windows
//! ([`WindowsLoader`]). [`PlatformLoader`] names the one compiled for the
//! current target. Both report failures with the platform's own message.

use std::ffi::{CStr, c_void};
use std::path::Path;
use std::ptr::NonNull;

use crate::error::LoadError;

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use posix::PosixLoader;
#[cfg(windows)]
pub use windows::WindowsLoader;

/// Loader selected for the build target.
#[cfg(unix)]
pub type PlatformLoader = PosixLoader;
/// Loader selected for the build target.
#[cfg(windows)]
pub type PlatformLoader = WindowsLoader;

/// Raw handle returned by a successful [`Loader::open`].
pub type RawHandle = NonNull<c_void>;

/// Open/resolve/close over one native dynamic-loading API.
pub trait Loader {
    /// Short backend name used in diagnostics.
    const NAME: &'static str;

    /// Map the file at `path` into the process.
    ///
    /// # Safety
    ///
    /// Loading runs the module's initialization code, which may do anything.
    unsafe fn open(path: &Path) -> Result<RawHandle, LoadError>;

    /// Look up an exported symbol. The error carries the platform diagnostic.
    ///
    /// # Safety
    ///
    /// `handle` must come from [`Loader::open`] of the same backend and must
    /// not have been closed.
    unsafe fn symbol(handle: RawHandle, name: &CStr) -> Result<NonNull<c_void>, String>;

    /// Unmap the module. May run the module's teardown code.
    ///
    /// # Safety
    ///
    /// `handle` must be open, and nothing resolved from it may be used
    /// afterwards.
    unsafe fn close(handle: RawHandle) -> Result<(), String>;
}
