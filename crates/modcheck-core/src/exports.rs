//! In-process export tables.
//!
//! [`StaticExports`] is a [`SymbolSource`] built from typed Rust function
//! pointers instead of a loaded file. Each entry remembers the shape it was
//! registered with, and resolving it as any other shape fails with
//! [`ResolutionError::ShapeMismatch`].

use std::collections::BTreeMap;
use std::ffi::c_void;
use std::ptr::NonNull;

use crate::error::ResolutionError;
use crate::symbol::{CallShape, Export, Signature, SymbolSource};

#[derive(Debug, Clone, Default)]
pub struct StaticExports {
    entries: BTreeMap<&'static str, (CallShape, NonNull<c_void>)>,
}

impl StaticExports {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under the name of `export`.
    #[must_use]
    pub fn with<S: Signature>(mut self, export: Export<S>, func: S) -> Self {
        self.insert(export.name(), func);
        self
    }

    /// Register `func` under an arbitrary name.
    #[must_use]
    pub fn with_named<S: Signature>(mut self, name: &'static str, func: S) -> Self {
        self.insert(name, func);
        self
    }

    /// Register `func`, returning the shape previously registered under
    /// `name`, if any.
    pub fn insert<S: Signature>(&mut self, name: &'static str, func: S) -> Option<CallShape> {
        self.entries
            .insert(name, (S::SHAPE, func.to_raw()))
            .map(|(shape, _)| shape)
    }

    /// Drop the entry for `name`. Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

// SAFETY: every address was produced by `Signature::to_raw` of a live function
// pointer and is only handed out for the shape it was registered with.
unsafe impl SymbolSource for StaticExports {
    fn lookup(&self, name: &str, shape: CallShape) -> Result<NonNull<c_void>, ResolutionError> {
        let (registered, ptr) =
            self.entries
                .get(name)
                .copied()
                .ok_or_else(|| ResolutionError::Missing {
                    symbol: name.to_owned(),
                    message: String::from("not present in the static export table"),
                })?;
        if registered != shape {
            return Err(ResolutionError::ShapeMismatch {
                symbol: name.to_owned(),
                registered,
                requested: shape,
            });
        }
        Ok(ptr)
    }
}
