//! Typed export signatures.
//!
//! A module export is an untyped address. Instead of casting it at the call
//! site, every supported calling shape is a function-pointer type that
//! implements the sealed [`Signature`] trait, and an [`Export`] descriptor
//! pairs a symbol name with exactly one of them. A resolved [`Symbol`] only
//! offers the `call` method of its own shape, so invoking an export with the
//! wrong argument list does not compile.
//!
//! Every argument of every shape is a NUL-terminated `char*`; returns are
//! `int`, a module-owned `char*`, or nothing (the deallocator).
//!
//! A symbol keeps a reference to the source it was resolved from. Buffer
//! shapes look up `FreeMemory` in that same source before calling, so a
//! buffer can only ever be released by the module that allocated it.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::abi;
use crate::buffer::ModuleBuffer;
use crate::error::ResolutionError;

/// Calling shapes the harness knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallShape {
    StrToInt,
    StrStrToInt,
    Str3ToInt,
    Str4ToInt,
    Str5ToInt,
    StrToStr,
    StrStrToStr,
    Str3ToStr,
    Str4ToStr,
    Free,
}

impl CallShape {
    /// Number of `char*` parameters.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::StrToInt | Self::StrToStr | Self::Free => 1,
            Self::StrStrToInt | Self::StrStrToStr => 2,
            Self::Str3ToInt | Self::Str3ToStr => 3,
            Self::Str4ToInt | Self::Str4ToStr => 4,
            Self::Str5ToInt => 5,
        }
    }

    /// Whether the export hands back a buffer the caller must release.
    #[must_use]
    pub const fn returns_buffer(self) -> bool {
        matches!(
            self,
            Self::StrToStr | Self::StrStrToStr | Self::Str3ToStr | Self::Str4ToStr
        )
    }

    /// C-like rendering, e.g. `int(char*, char*)`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrToInt => "int(char*)",
            Self::StrStrToInt => "int(char*, char*)",
            Self::Str3ToInt => "int(char*, char*, char*)",
            Self::Str4ToInt => "int(char*, char*, char*, char*)",
            Self::Str5ToInt => "int(char*, char*, char*, char*, char*)",
            Self::StrToStr => "char*(char*)",
            Self::StrStrToStr => "char*(char*, char*)",
            Self::Str3ToStr => "char*(char*, char*, char*)",
            Self::Str4ToStr => "char*(char*, char*, char*, char*)",
            Self::Free => "void(char*)",
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A function-pointer type the harness can bind an export to.
///
/// Sealed: the implementors are exactly the aliases in this module.
pub trait Signature: sealed::Sealed + Copy + fmt::Debug {
    const SHAPE: CallShape;

    /// Reinterpret an export address as this function type.
    ///
    /// # Safety
    ///
    /// `ptr` must be the address of a function with exactly this signature.
    unsafe fn from_raw(ptr: NonNull<c_void>) -> Self;

    /// Address of the function.
    fn to_raw(self) -> NonNull<c_void>;
}

macro_rules! c_str_param {
    ($_name:ident) => {
        *mut c_char
    };
}

macro_rules! signature_impl {
    ($alias:ident, $shape:ident) => {
        impl sealed::Sealed for $alias {}

        impl Signature for $alias {
            const SHAPE: CallShape = CallShape::$shape;

            unsafe fn from_raw(ptr: NonNull<c_void>) -> Self {
                // SAFETY: function pointers and data pointers have the same
                // size on every supported target; the caller vouches for
                // the signature.
                unsafe { std::mem::transmute::<*mut c_void, Self>(ptr.as_ptr()) }
            }

            fn to_raw(self) -> NonNull<c_void> {
                // SAFETY: function pointers are never null.
                unsafe { NonNull::new_unchecked(self as *mut c_void) }
            }
        }
    };
}

macro_rules! int_shape {
    ($(#[$meta:meta])* $alias:ident ($($arg:ident),+)) => {
        $(#[$meta])*
        pub type $alias = unsafe extern "C" fn($(c_str_param!($arg)),+) -> c_int;

        signature_impl!($alias, $alias);

        impl Symbol<'_, $alias> {
            /// Invoke the export and return its status code.
            pub fn call(&self, $($arg: &CStr),+) -> c_int {
                // SAFETY: the signature was fixed when the `Export` was
                // declared; every argument is NUL-terminated, outlives the
                // call, and is only read by the module.
                unsafe { (self.func)($($arg.as_ptr().cast_mut()),+) }
            }
        }
    };
}

macro_rules! buffer_shape {
    ($(#[$meta:meta])* $alias:ident ($($arg:ident),+)) => {
        $(#[$meta])*
        pub type $alias = unsafe extern "C" fn($(c_str_param!($arg)),+) -> *mut c_char;

        signature_impl!($alias, $alias);

        impl<'m> Symbol<'m, $alias> {
            /// Invoke the export. A null return yields `None`; anything else
            /// is owned by the returned [`ModuleBuffer`], which releases it
            /// through the `FreeMemory` of the source this symbol came from.
            ///
            /// Fails without calling the export when that source has no
            /// deallocator.
            pub fn call(&self, $($arg: &CStr),+) -> Result<Option<ModuleBuffer<'m>>, ResolutionError> {
                let free = self.deallocator()?;
                // SAFETY: as for the int shapes.
                let raw = unsafe { (self.func)($($arg.as_ptr().cast_mut()),+) };
                // SAFETY: a non-null return is a NUL-terminated string that the
                // module hands over until it is passed back to `free`, which
                // was resolved from the same module.
                Ok(unsafe { ModuleBuffer::from_raw(raw, self.name, free) })
            }
        }
    };
}

int_shape!(
    /// `int f(char*)`
    StrToInt(first)
);
int_shape!(
    /// `int f(char*, char*)`
    StrStrToInt(first, second)
);
int_shape!(
    /// `int f(char*, char*, char*)`
    Str3ToInt(first, second, third)
);
int_shape!(
    /// `int f(char*, char*, char*, char*)`
    Str4ToInt(first, second, third, fourth)
);
int_shape!(
    /// `int f(char*, char*, char*, char*, char*)`
    Str5ToInt(first, second, third, fourth, fifth)
);
buffer_shape!(
    /// `char* f(char*)`
    StrToStr(first)
);
buffer_shape!(
    /// `char* f(char*, char*)`
    StrStrToStr(first, second)
);
buffer_shape!(
    /// `char* f(char*, char*, char*)`
    Str3ToStr(first, second, third)
);
buffer_shape!(
    /// `char* f(char*, char*, char*, char*)`
    Str4ToStr(first, second, third, fourth)
);

/// `void f(char*)`: the module's own deallocator.
pub type FreeFn = unsafe extern "C" fn(*mut c_char);

signature_impl!(FreeFn, Free);

impl Symbol<'_, FreeFn> {
    /// Hand a module-allocated buffer back to the module.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by an export of the same module and must
    /// not be used or released again.
    pub(crate) unsafe fn release(&self, ptr: NonNull<c_char>) {
        // SAFETY: forwarded from the caller.
        unsafe { (self.func)(ptr.as_ptr()) }
    }
}

/// A symbol name bound to the signature the module contract gives it.
#[derive(Debug, Clone, Copy)]
pub struct Export<S: Signature> {
    name: &'static str,
    _signature: PhantomData<S>,
}

impl<S: Signature> Export<S> {
    /// Declare an export.
    ///
    /// # Safety
    ///
    /// Every module this descriptor is resolved against must export `name`
    /// as a C function with signature `S`. Nothing checks this at runtime.
    #[must_use]
    pub const unsafe fn new(name: &'static str) -> Self {
        Self {
            name,
            _signature: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn shape(self) -> CallShape {
        S::SHAPE
    }
}

/// A resolved export, valid while the source it came from is borrowed.
#[derive(Clone, Copy)]
pub struct Symbol<'m, S: Signature> {
    name: &'static str,
    func: S,
    source: &'m (dyn SymbolSource + 'm),
}

impl<'m, S: Signature> Symbol<'m, S> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn shape(&self) -> CallShape {
        S::SHAPE
    }

    /// Whether `self` and `other` were resolved from the same source.
    #[must_use]
    pub fn same_source<T: Signature>(&self, other: &Symbol<'_, T>) -> bool {
        std::ptr::addr_eq(self.source, other.source)
    }

    /// The deallocator of this symbol's own source.
    fn deallocator(&self) -> Result<Symbol<'m, FreeFn>, ResolutionError> {
        let name = abi::FREE_MEMORY.name();
        let raw = self.source.lookup(name, CallShape::Free)?;
        // SAFETY: `abi::FREE_MEMORY` fixes the signature of this name and the
        // `SymbolSource` contract guarantees `raw` is that export.
        let func = unsafe { <FreeFn as Signature>::from_raw(raw) };
        Ok(Symbol {
            name,
            func,
            source: self.source,
        })
    }
}

impl<S: Signature> fmt::Debug for Symbol<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("name", &self.name)
            .field("shape", &S::SHAPE)
            .field("func", &self.func)
            .finish()
    }
}

/// Something exports can be resolved from.
///
/// # Safety
///
/// A successful [`lookup`](SymbolSource::lookup) must return an address that
/// stays callable for as long as `self` is borrowed and that has the
/// signature the export contract declares for `name`.
pub unsafe trait SymbolSource {
    /// Find the raw address of `name`. `shape` is what the caller intends to
    /// bind it as; sources that know the real shape reject a mismatch.
    fn lookup(&self, name: &str, shape: CallShape) -> Result<NonNull<c_void>, ResolutionError>;

    /// Resolve `export` into a typed, callable symbol.
    fn resolve<S: Signature>(&self, export: Export<S>) -> Result<Symbol<'_, S>, ResolutionError>
    where
        Self: Sized,
    {
        let raw = self.lookup(export.name(), S::SHAPE)?;
        // SAFETY: `Export::new` fixed the signature of this name and the
        // trait contract guarantees `raw` is that export.
        let func = unsafe { S::from_raw(raw) };
        Ok(Symbol {
            name: export.name(),
            func,
            source: self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matches_rendering() {
        let shapes = [
            CallShape::StrToInt,
            CallShape::StrStrToInt,
            CallShape::Str3ToInt,
            CallShape::Str4ToInt,
            CallShape::Str5ToInt,
            CallShape::StrToStr,
            CallShape::StrStrToStr,
            CallShape::Str3ToStr,
            CallShape::Str4ToStr,
            CallShape::Free,
        ];
        for shape in shapes {
            assert_eq!(shape.as_str().matches("char*").count() - usize::from(shape.returns_buffer()), shape.arity(), "{shape}");
        }
    }

    #[test]
    fn only_string_returning_shapes_hand_out_buffers() {
        assert!(CallShape::StrToStr.returns_buffer());
        assert!(CallShape::Str4ToStr.returns_buffer());
        assert!(!CallShape::StrStrToInt.returns_buffer());
        assert!(!CallShape::Free.returns_buffer());
    }

    #[test]
    fn signature_constants_name_their_shape() {
        assert_eq!(<StrStrToInt as Signature>::SHAPE, CallShape::StrStrToInt);
        assert_eq!(<StrToStr as Signature>::SHAPE, CallShape::StrToStr);
        assert_eq!(<FreeFn as Signature>::SHAPE, CallShape::Free);
    }

    #[test]
    fn raw_round_trip_preserves_address() {
        extern "C" fn probe(_: *mut c_char) -> c_int {
            7
        }
        let typed: StrToInt = probe;
        let raw = typed.to_raw();
        // SAFETY: `raw` came from a `StrToInt`.
        let back = unsafe { <StrToInt as Signature>::from_raw(raw) };
        assert_eq!(back.to_raw(), raw);
    }
}
