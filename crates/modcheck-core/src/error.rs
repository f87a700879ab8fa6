//! Error types for module loading, symbol resolution and compaction.

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;

use crate::symbol::CallShape;

/// The module file could not be mapped into the process.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load module {}: {message}", path.display())]
    Open { path: PathBuf, message: String },
    #[error("module path {} contains an interior NUL byte", path.display())]
    InvalidPath { path: PathBuf },
}

/// A named export could not be bound to a callable.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to resolve `{symbol}`: {message}")]
    Missing { symbol: String, message: String },
    #[error("symbol name `{symbol}` contains an interior NUL byte")]
    InvalidName { symbol: String },
    #[error("`{symbol}` is registered as {registered}, requested as {requested}")]
    ShapeMismatch {
        symbol: String,
        registered: CallShape,
        requested: CallShape,
    },
}

impl ResolutionError {
    /// Name of the export that failed to resolve.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Missing { symbol, .. }
            | Self::InvalidName { symbol }
            | Self::ShapeMismatch { symbol, .. } => symbol,
        }
    }
}

/// Unloading the module reported a platform failure.
#[derive(Debug, Error)]
#[error("failed to unload module {}: {message}", path.display())]
pub struct CloseError {
    pub path: PathBuf,
    pub message: String,
}

/// Memory for the compacted copy could not be obtained.
#[derive(Debug, Error)]
#[error("failed to allocate {requested} bytes for compacted JSON: {source}")]
pub struct CompactError {
    pub requested: usize,
    #[source]
    pub source: TryReserveError,
}
