//! The module ABI contract: every export the harness binds, with the
//! signature the module documents for it.
//!
//! All strings are NUL-terminated UTF-8. Every `char*` an export returns must
//! go back through [`FREE_MEMORY`].

use crate::symbol::{
    Export, FreeFn, Str3ToInt, Str3ToStr, Str4ToInt, Str4ToStr, Str5ToInt, StrStrToInt,
    StrStrToStr, StrToInt, StrToStr,
};

// SAFETY (for every declaration below): the signature is the one the module
// contract documents for the name.

/// `int CreateServerInstance(char* name, char* configJson)`
pub const CREATE_SERVER_INSTANCE: Export<StrStrToInt> =
    unsafe { Export::new("CreateServerInstance") };
/// `int StopServerInstance(char* name)`
pub const STOP_SERVER_INSTANCE: Export<StrToInt> = unsafe { Export::new("StopServerInstance") };
/// `int LoadServerInstanceState(char* server, char* stateJson)`
pub const LOAD_SERVER_INSTANCE_STATE: Export<StrStrToInt> =
    unsafe { Export::new("LoadServerInstanceState") };
/// `char* GetServerInstanceState(char* server)`
pub const GET_SERVER_INSTANCE_STATE: Export<StrToStr> =
    unsafe { Export::new("GetServerInstanceState") };
/// `void FreeMemory(char* buffer)`
pub const FREE_MEMORY: Export<FreeFn> = unsafe { Export::new("FreeMemory") };

/// `int CreateDatabase(char* server, char* databaseJson)`
pub const CREATE_DATABASE: Export<StrStrToInt> = unsafe { Export::new("CreateDatabase") };
/// `char* GetDatabase(char* server, char* id)`
pub const GET_DATABASE: Export<StrStrToStr> = unsafe { Export::new("GetDatabase") };
/// `char* GetAllDatabases(char* server)`
pub const GET_ALL_DATABASES: Export<StrToStr> = unsafe { Export::new("GetAllDatabases") };
/// `int DeleteDatabase(char* server, char* id)`
pub const DELETE_DATABASE: Export<StrStrToInt> = unsafe { Export::new("DeleteDatabase") };

/// `int CreateCollection(char* server, char* db, char* collectionJson)`
pub const CREATE_COLLECTION: Export<Str3ToInt> = unsafe { Export::new("CreateCollection") };
/// `char* GetCollection(char* server, char* db, char* id)`
pub const GET_COLLECTION: Export<Str3ToStr> = unsafe { Export::new("GetCollection") };
/// `char* GetAllCollections(char* server, char* db)`
pub const GET_ALL_COLLECTIONS: Export<StrStrToStr> = unsafe { Export::new("GetAllCollections") };
/// `int DeleteCollection(char* server, char* db, char* id)`
pub const DELETE_COLLECTION: Export<Str3ToInt> = unsafe { Export::new("DeleteCollection") };

/// `int CreateDocument(char* server, char* db, char* coll, char* documentJson)`
pub const CREATE_DOCUMENT: Export<Str4ToInt> = unsafe { Export::new("CreateDocument") };
/// `char* GetDocument(char* server, char* db, char* coll, char* id)`
pub const GET_DOCUMENT: Export<Str4ToStr> = unsafe { Export::new("GetDocument") };
/// `char* GetAllDocuments(char* server, char* db, char* coll)`
pub const GET_ALL_DOCUMENTS: Export<Str3ToStr> = unsafe { Export::new("GetAllDocuments") };
/// `int UpdateDocument(char* server, char* db, char* coll, char* id, char* documentJson)`
pub const UPDATE_DOCUMENT: Export<Str5ToInt> = unsafe { Export::new("UpdateDocument") };
/// `int DeleteDocument(char* server, char* db, char* coll, char* id)`
pub const DELETE_DOCUMENT: Export<Str4ToInt> = unsafe { Export::new("DeleteDocument") };

/// Names of every export in the contract, in declaration order.
pub const ALL_EXPORTS: [&str; 18] = [
    CREATE_SERVER_INSTANCE.name(),
    STOP_SERVER_INSTANCE.name(),
    LOAD_SERVER_INSTANCE_STATE.name(),
    GET_SERVER_INSTANCE_STATE.name(),
    FREE_MEMORY.name(),
    CREATE_DATABASE.name(),
    GET_DATABASE.name(),
    GET_ALL_DATABASES.name(),
    DELETE_DATABASE.name(),
    CREATE_COLLECTION.name(),
    GET_COLLECTION.name(),
    GET_ALL_COLLECTIONS.name(),
    DELETE_COLLECTION.name(),
    CREATE_DOCUMENT.name(),
    GET_DOCUMENT.name(),
    GET_ALL_DOCUMENTS.name(),
    UPDATE_DOCUMENT.name(),
    DELETE_DOCUMENT.name(),
];
