//! Open module handle.

use std::ffi::{CString, c_void};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use crate::error::{CloseError, LoadError, ResolutionError};
use crate::loader::{Loader, PlatformLoader, RawHandle};
use crate::symbol::{CallShape, SymbolSource};

/// A dynamically loaded module.
///
/// Symbols resolved from a `Module` borrow it, so none can be called after
/// the module is closed or dropped. Dropping an open module unloads it.
pub struct Module<L: Loader = PlatformLoader> {
    handle: Option<RawHandle>,
    path: PathBuf,
    _loader: PhantomData<L>,
}

impl Module<PlatformLoader> {
    /// Load the module at `path` with the loader of the build target.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::open_with(path)
    }
}

impl<L: Loader> Module<L> {
    /// Load the module at `path` with loader `L`.
    pub fn open_with(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: running the module's initializers is the point of loading it.
        let handle = unsafe { L::open(path)? };
        Ok(Self {
            handle: Some(handle),
            path: path.to_path_buf(),
            _loader: PhantomData,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the backend that loaded this module.
    #[must_use]
    pub fn loader_name(&self) -> &'static str {
        L::NAME
    }

    /// Unload the module. Its teardown code may run here.
    pub fn close(mut self) -> Result<(), CloseError> {
        match self.handle.take() {
            // SAFETY: `self` is consumed, so no symbol borrowing it survives.
            Some(handle) => unsafe { L::close(handle) }.map_err(|message| CloseError {
                path: self.path.clone(),
                message,
            }),
            None => Ok(()),
        }
    }

    /// Give up the handle without unloading, leaving the module mapped until
    /// the process exits.
    pub fn leak(mut self) {
        self.handle = None;
    }
}

// SAFETY: exports come straight from the platform loader for the open handle;
// their signatures are fixed by the `Export` descriptors used to resolve them.
unsafe impl<L: Loader> SymbolSource for Module<L> {
    fn lookup(&self, name: &str, _shape: CallShape) -> Result<NonNull<c_void>, ResolutionError> {
        let c_name = CString::new(name).map_err(|_| ResolutionError::InvalidName {
            symbol: name.to_owned(),
        })?;
        let handle = self.handle.ok_or_else(|| ResolutionError::Missing {
            symbol: name.to_owned(),
            message: String::from("module is closed"),
        })?;
        // SAFETY: `handle` is open for as long as `self` is.
        unsafe { L::symbol(handle, &c_name) }.map_err(|message| ResolutionError::Missing {
            symbol: name.to_owned(),
            message,
        })
    }
}

impl<L: Loader> Drop for Module<L> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: the module is going away with every borrow of it.
            let _ = unsafe { L::close(handle) };
        }
    }
}

impl<L: Loader> fmt::Debug for Module<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("path", &self.path)
            .field("loader", &L::NAME)
            .field("open", &self.handle.is_some())
            .finish()
    }
}
