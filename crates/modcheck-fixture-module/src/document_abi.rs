//! Document exports.
#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};

use modcheck_core::ResponseCode;

use crate::macros::module_fn;
use crate::registry;
use crate::store::Document;
use crate::util::{empty_buffer, json_buffer, status};

module_fn! {
    fn CreateDocument(server_name, database_id, collection_id, document_json) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        let Ok(document) = serde_json::from_str::<Document>(document_json) else {
            return ResponseCode::FailedToParseRequest.as_raw();
        };
        status(registry::with_store(server_name, |store| {
            store.create_document(database_id, collection_id, document)
        }))
    }
}

module_fn! {
    fn GetDocument(server_name, database_id, collection_id, document_id) -> *mut c_char,
        or empty_buffer();
    {
        registry::with_store(server_name, |store| {
            store
                .document(database_id, collection_id, document_id)
                .map(json_buffer)
                .unwrap_or_else(|_| empty_buffer())
        })
        .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    fn GetAllDocuments(server_name, database_id, collection_id) -> *mut c_char, or empty_buffer();
    {
        registry::with_store(server_name, |store| {
            store
                .documents(database_id, collection_id)
                .map(|documents| json_buffer(&documents))
                .unwrap_or_else(|_| empty_buffer())
        })
        .unwrap_or_else(empty_buffer)
    }
}

module_fn! {
    /// Replace the stored document; its `id` stays `document_id`.
    fn UpdateDocument(server_name, database_id, collection_id, document_id, document_json) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        let Ok(document) = serde_json::from_str::<Document>(document_json) else {
            return ResponseCode::FailedToParseRequest.as_raw();
        };
        status(registry::with_store(server_name, |store| {
            store.replace_document(database_id, collection_id, document_id, document)
        }))
    }
}

module_fn! {
    fn DeleteDocument(server_name, database_id, collection_id, document_id) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        status(registry::with_store(server_name, |store| {
            store.delete_document(database_id, collection_id, document_id)
        }))
    }
}
