//! Database exports.
#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};

use modcheck_core::ResponseCode;

use crate::macros::module_fn;
use crate::registry;
use crate::store::Database;
use crate::util::{empty_buffer, json_buffer, status};

module_fn! {
    fn CreateDatabase(server_name, database_json) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        let Ok(database) = serde_json::from_str::<Database>(database_json) else {
            return ResponseCode::FailedToParseRequest.as_raw();
        };
        status(registry::with_store(server_name, |store| store.create_database(database)))
    }
}

module_fn! {
    /// The database as JSON, or an empty buffer when the instance or the
    /// database does not exist.
    fn GetDatabase(server_name, database_id) -> *mut c_char, or empty_buffer();
    {
        registry::with_store(server_name, |store| {
            store.database(database_id).map(json_buffer).unwrap_or_else(|_| empty_buffer())
        })
        .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    fn GetAllDatabases(server_name) -> *mut c_char, or empty_buffer();
    {
        registry::with_store(server_name, |store| json_buffer(&store.databases()))
            .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    fn DeleteDatabase(server_name, database_id) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        status(registry::with_store(server_name, |store| store.delete_database(database_id)))
    }
}
