//! Collection exports.
#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};

use modcheck_core::ResponseCode;

use crate::macros::module_fn;
use crate::registry;
use crate::store::Collection;
use crate::util::{empty_buffer, json_buffer, status};

module_fn! {
    fn CreateCollection(server_name, database_id, collection_json) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        let Ok(collection) = serde_json::from_str::<Collection>(collection_json) else {
            return ResponseCode::FailedToParseRequest.as_raw();
        };
        let created = registry::with_store(server_name, |store| {
            store.create_collection(database_id, collection)
        });
        status(created)
    }
}

module_fn! {
    fn GetCollection(server_name, database_id, collection_id) -> *mut c_char, or empty_buffer();
    {
        registry::with_store(server_name, |store| {
            store
                .collection(database_id, collection_id)
                .map(json_buffer)
                .unwrap_or_else(|_| empty_buffer())
        })
        .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    fn GetAllCollections(server_name, database_id) -> *mut c_char, or empty_buffer();
    {
        registry::with_store(server_name, |store| {
            store
                .collections(database_id)
                .map(|collections| json_buffer(&collections))
                .unwrap_or_else(|_| empty_buffer())
        })
        .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    fn DeleteCollection(server_name, database_id, collection_id) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        let deleted = registry::with_store(server_name, |store| {
            store.delete_collection(database_id, collection_id)
        });
        status(deleted)
    }
}
