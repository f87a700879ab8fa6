//! Error types for scenario execution and the harness run.

use std::io;
use std::path::PathBuf;

use modcheck_core::{CompactError, LoadError, ResolutionError, ResponseCode};
use thiserror::Error;

/// Why a scenario failed. Caught at the scenario boundary and turned into a
/// failed result; never aborts the run.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("{symbol}: {detail}")]
    CallFailure { symbol: &'static str, detail: String },

    #[error("{symbol}: output mismatch\n  expected: {expected}\n  actual:   {actual}")]
    ValidationMismatch {
        symbol: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{symbol}: returned invalid UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 {
        symbol: &'static str,
        valid_up_to: usize,
    },

    #[error("{symbol}: {source}")]
    Compaction {
        symbol: &'static str,
        #[source]
        source: CompactError,
    },
}

impl ScenarioError {
    /// A status export returned something other than success.
    #[must_use]
    pub fn status(symbol: &'static str, raw: i32) -> Self {
        Self::CallFailure {
            symbol,
            detail: format!("result = {}", ResponseCode::describe(raw)),
        }
    }

    /// A buffer export returned null.
    #[must_use]
    pub fn null_buffer(symbol: &'static str) -> Self {
        Self::CallFailure {
            symbol,
            detail: "returned a null buffer".to_owned(),
        }
    }

    /// The export the failure is attributed to.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Resolution(err) => err.symbol(),
            Self::CallFailure { symbol, .. }
            | Self::ValidationMismatch { symbol, .. }
            | Self::InvalidUtf8 { symbol, .. }
            | Self::Compaction { symbol, .. } => symbol,
        }
    }

    /// Short machine-readable kind, used in structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::CallFailure { .. } => "call_failure",
            Self::ValidationMismatch { .. } => "validation_mismatch",
            Self::InvalidUtf8 { .. } => "invalid_utf8",
            Self::Compaction { .. } => "compaction",
        }
    }
}

/// Errors that end the whole run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
