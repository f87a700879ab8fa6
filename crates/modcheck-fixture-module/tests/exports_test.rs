//! Integration test: the fixture exports bound through typed symbols.
//!
//! Drives every export the way a loader-backed harness would, but resolves
//! them in-process from `static_exports()`.
//!
//! Run: cargo test -p modcheck-fixture-module --test exports_test

use modcheck_core::abi;
use modcheck_core::compact::compact_json;
use modcheck_core::{ResponseCode, SymbolSource};
use modcheck_fixture_module::static_exports;

const OK: i32 = ResponseCode::Success.as_raw();

#[test]
fn every_contract_export_is_registered() {
    let exports = static_exports();
    for name in abi::ALL_EXPORTS {
        assert!(exports.contains(name), "missing {name}");
    }
    assert_eq!(exports.len(), abi::ALL_EXPORTS.len());
}

#[test]
fn server_and_database_round_trip() {
    let exports = static_exports();
    let create = exports.resolve(abi::CREATE_SERVER_INSTANCE).unwrap();
    let stop = exports.resolve(abi::STOP_SERVER_INSTANCE).unwrap();
    let create_db = exports.resolve(abi::CREATE_DATABASE).unwrap();
    let get_db = exports.resolve(abi::GET_DATABASE).unwrap();
    let all_dbs = exports.resolve(abi::GET_ALL_DATABASES).unwrap();
    let delete_db = exports.resolve(abi::DELETE_DATABASE).unwrap();

    let server = c"exports-db-server";
    assert_eq!(create.call(server, c"{\"host\":\"localhost\",\"port\":8080}"), OK);
    assert_eq!(
        create.call(server, c"{}"),
        ResponseCode::ServerInstanceAlreadyExists.as_raw()
    );

    assert_eq!(create_db.call(server, c"{\"id\":\"test-db\"}"), OK);
    assert_eq!(
        create_db.call(server, c"{\"id\":\"test-db\"}"),
        ResponseCode::DataStoreConflict.as_raw()
    );
    assert_eq!(
        create_db.call(server, c"{not json"),
        ResponseCode::FailedToParseRequest.as_raw()
    );

    let db = get_db.call(server, c"test-db").unwrap().unwrap();
    let text = db.to_str_lossy();
    assert!(text.starts_with("{\"id\":\"test-db\",\"_ts\":"), "{text}");
    drop(db);

    let missing = get_db.call(server, c"nope").unwrap().unwrap();
    assert!(missing.is_empty());

    let listing = all_dbs.call(server).unwrap().unwrap();
    assert!(listing.to_str_lossy().starts_with("[{\"id\":\"test-db\""));

    assert_eq!(delete_db.call(server, c"test-db"), OK);
    assert_eq!(
        delete_db.call(server, c"test-db"),
        ResponseCode::DataStoreNotFound.as_raw()
    );

    assert_eq!(stop.call(server), OK);
    assert_eq!(stop.call(server), ResponseCode::ServerInstanceNotFound.as_raw());
    assert_eq!(
        create_db.call(server, c"{\"id\":\"x\"}"),
        ResponseCode::ServerInstanceNotFound.as_raw()
    );
    assert!(get_db.call(server, c"x").unwrap().unwrap().is_empty());
}

#[test]
fn loaded_state_dumps_in_canonical_form() {
    let exports = static_exports();
    let create = exports.resolve(abi::CREATE_SERVER_INSTANCE).unwrap();
    let stop = exports.resolve(abi::STOP_SERVER_INSTANCE).unwrap();
    let load = exports.resolve(abi::LOAD_SERVER_INSTANCE_STATE).unwrap();
    let dump = exports.resolve(abi::GET_SERVER_INSTANCE_STATE).unwrap();

    let server = c"exports-state-server";
    assert_eq!(create.call(server, c"{}"), OK);
    assert_eq!(
        load.call(server, c"{\"databases\":{\"test-db\":{\"id\":\"test-db\"}}}"),
        OK
    );
    assert_eq!(
        load.call(server, c"{\"databases\":"),
        ResponseCode::FailedToLoadState.as_raw()
    );

    let state = dump.call(server).unwrap().unwrap();
    let compacted = compact_json(&state.to_str_lossy()).unwrap();
    assert_eq!(
        compacted,
        "{\"databases\":{\"test-db\":{\"id\":\"test-db\",\"_ts\":0,\"_rid\":\"\",\"_etag\":\"\",\"_self\":\"\"}},\"collections\":{\"test-db\":{}},\"documents\":{\"test-db\":{}},\"triggers\":{\"test-db\":{}},\"sprocs\":{\"test-db\":{}},\"udfs\":{\"test-db\":{}}}"
    );
    drop(state);

    assert!(dump.call(c"exports-unknown").unwrap().is_none());
    assert_eq!(stop.call(server), OK);
}

#[test]
fn collection_and_document_lifecycle() {
    let exports = static_exports();
    let create = exports.resolve(abi::CREATE_SERVER_INSTANCE).unwrap();
    let stop = exports.resolve(abi::STOP_SERVER_INSTANCE).unwrap();
    let create_db = exports.resolve(abi::CREATE_DATABASE).unwrap();
    let create_coll = exports.resolve(abi::CREATE_COLLECTION).unwrap();
    let get_coll = exports.resolve(abi::GET_COLLECTION).unwrap();
    let all_colls = exports.resolve(abi::GET_ALL_COLLECTIONS).unwrap();
    let delete_coll = exports.resolve(abi::DELETE_COLLECTION).unwrap();
    let create_doc = exports.resolve(abi::CREATE_DOCUMENT).unwrap();
    let get_doc = exports.resolve(abi::GET_DOCUMENT).unwrap();
    let all_docs = exports.resolve(abi::GET_ALL_DOCUMENTS).unwrap();
    let update_doc = exports.resolve(abi::UPDATE_DOCUMENT).unwrap();
    let delete_doc = exports.resolve(abi::DELETE_DOCUMENT).unwrap();

    let server = c"exports-doc-server";
    assert_eq!(create.call(server, c"{}"), OK);
    assert_eq!(
        create_coll.call(server, c"db", c"{\"id\":\"coll\"}"),
        ResponseCode::DataStoreNotFound.as_raw()
    );
    assert_eq!(create_db.call(server, c"{\"id\":\"db\"}"), OK);
    assert_eq!(create_coll.call(server, c"db", c"{\"id\":\"coll\"}"), OK);

    let coll = get_coll.call(server, c"db", c"coll").unwrap().unwrap();
    assert!(coll.to_str_lossy().contains("\"id\":\"coll\""));
    drop(coll);
    let colls = all_colls.call(server, c"db").unwrap().unwrap();
    assert!(colls.to_str_lossy().starts_with('['));
    drop(colls);

    assert_eq!(
        create_doc.call(server, c"db", c"coll", c"{\"id\":\"d\",\"value\":42}"),
        OK
    );
    assert_eq!(
        update_doc.call(server, c"db", c"coll", c"d", c"{\"value\":43}"),
        OK
    );
    let doc = get_doc.call(server, c"db", c"coll", c"d").unwrap().unwrap();
    let text = doc.to_str_lossy();
    assert!(text.contains("\"value\":43"), "{text}");
    assert!(text.contains("\"id\":\"d\""), "{text}");
    drop(doc);

    let docs = all_docs.call(server, c"db", c"coll").unwrap().unwrap();
    assert!(docs.to_str_lossy().contains("\"value\":43"));
    drop(docs);

    assert_eq!(delete_doc.call(server, c"db", c"coll", c"d"), OK);
    assert!(get_doc.call(server, c"db", c"coll", c"d").unwrap().unwrap().is_empty());
    assert_eq!(delete_coll.call(server, c"db", c"coll"), OK);
    assert!(get_coll.call(server, c"db", c"coll").unwrap().unwrap().is_empty());
    assert_eq!(stop.call(server), OK);
}
