//! # modcheck-core
//!
//! Loading a server module and talking to it across its C ABI.
//!
//! - [`loader`]: the native dynamic-loading backends behind one trait.
//! - [`Module`]: an open module handle; closes on drop.
//! - [`symbol`]: typed call shapes and resolution through [`SymbolSource`].
//! - [`abi`]: the exports the module contract defines.
//! - [`ModuleBuffer`]: strings owned by the module, released through its own
//!   deallocator.
//! - [`compact`]: whitespace removal for literal JSON comparison.
//!
//! All of the workspace's `unsafe` FFI lives in this crate.

pub mod abi;
pub mod buffer;
pub mod compact;
pub mod error;
pub mod exports;
pub mod loader;
pub mod module;
pub mod response;
pub mod symbol;

pub use buffer::ModuleBuffer;
pub use compact::compact_json;
pub use error::{CloseError, CompactError, LoadError, ResolutionError};
pub use exports::StaticExports;
pub use loader::{Loader, PlatformLoader};
pub use module::Module;
pub use response::ResponseCode;
pub use symbol::{CallShape, Export, Signature, Symbol, SymbolSource};
