// The exports take raw pointers from C callers and validate them on entry.
#![allow(clippy::missing_safety_doc)]
//! # modcheck-fixture-module
//!
//! A conforming server module with an in-memory data store. Built as a
//! `cdylib` it is the module the harness end-to-end tests load; as an
//! `rlib` its exports can be bound in-process through [`static_exports`].
//!
//! ```text
//! C caller -> export (string decoding) -> registry (instance by name) -> store
//! ```
//!
//! Every `char*` an export returns is a `CString` and goes back through
//! `FreeMemory`. Resource getters answer "not found" with an empty buffer;
//! `GetServerInstanceState` answers an unknown instance with null.

mod macros;
mod util;

pub mod faults;
pub mod registry;
pub mod store;

pub mod collection_abi;
pub mod database_abi;
pub mod document_abi;
pub mod server_abi;

use modcheck_core::StaticExports;
use modcheck_core::abi;

/// Every export of this module, registered under its contract name.
#[must_use]
pub fn static_exports() -> StaticExports {
    StaticExports::new()
        .with(abi::CREATE_SERVER_INSTANCE, server_abi::CreateServerInstance)
        .with(abi::STOP_SERVER_INSTANCE, server_abi::StopServerInstance)
        .with(abi::LOAD_SERVER_INSTANCE_STATE, server_abi::LoadServerInstanceState)
        .with(abi::GET_SERVER_INSTANCE_STATE, server_abi::GetServerInstanceState)
        .with(abi::FREE_MEMORY, server_abi::FreeMemory)
        .with(abi::CREATE_DATABASE, database_abi::CreateDatabase)
        .with(abi::GET_DATABASE, database_abi::GetDatabase)
        .with(abi::GET_ALL_DATABASES, database_abi::GetAllDatabases)
        .with(abi::DELETE_DATABASE, database_abi::DeleteDatabase)
        .with(abi::CREATE_COLLECTION, collection_abi::CreateCollection)
        .with(abi::GET_COLLECTION, collection_abi::GetCollection)
        .with(abi::GET_ALL_COLLECTIONS, collection_abi::GetAllCollections)
        .with(abi::DELETE_COLLECTION, collection_abi::DeleteCollection)
        .with(abi::CREATE_DOCUMENT, document_abi::CreateDocument)
        .with(abi::GET_DOCUMENT, document_abi::GetDocument)
        .with(abi::GET_ALL_DOCUMENTS, document_abi::GetAllDocuments)
        .with(abi::UPDATE_DOCUMENT, document_abi::UpdateDocument)
        .with(abi::DELETE_DOCUMENT, document_abi::DeleteDocument)
}
