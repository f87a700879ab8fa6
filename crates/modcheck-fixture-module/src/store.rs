//! In-memory data store behind one server instance.
//!
//! The serialized layout is the module's state-dump contract: top-level maps
//! in the order `databases, collections, documents, triggers, sprocs, udfs`,
//! every per-database map keyed by every database id, and resource metadata
//! in the order `id, _ts, _rid, _etag, _self`.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use modcheck_core::ResponseCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a data-store operation that did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    Conflict,
    BadRequest,
}

impl From<StoreError> for ResponseCode {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::DataStoreNotFound,
            StoreError::Conflict => Self::DataStoreConflict,
            StoreError::BadRequest => Self::DataStoreBadRequest,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "_ts", default)]
    pub ts: i64,
    #[serde(rename = "_rid", default)]
    pub rid: String,
    #[serde(rename = "_etag", default)]
    pub etag: String,
    #[serde(rename = "_self", default)]
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "partitionKey", default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<Value>,
    #[serde(rename = "_ts", default)]
    pub ts: i64,
    #[serde(rename = "_rid", default)]
    pub rid: String,
    #[serde(rename = "_etag", default)]
    pub etag: String,
    #[serde(rename = "_self", default)]
    pub self_link: String,
}

/// Documents are free-form objects with a string `id`.
pub type Document = Map<String, Value>;

type PerCollection<T> = BTreeMap<String, BTreeMap<String, BTreeMap<String, T>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub databases: BTreeMap<String, Database>,
    #[serde(default)]
    pub collections: BTreeMap<String, BTreeMap<String, Collection>>,
    #[serde(default)]
    pub documents: PerCollection<Document>,
    #[serde(default)]
    pub triggers: PerCollection<Value>,
    #[serde(default)]
    pub sprocs: PerCollection<Value>,
    #[serde(default)]
    pub udfs: PerCollection<Value>,
}

impl State {
    /// Make sure every database and collection has its (possibly empty)
    /// entry in every dependent map.
    fn fill_dependents(&mut self) {
        for db_id in self.databases.keys() {
            let collections = self.collections.entry(db_id.clone()).or_default();
            let documents = self.documents.entry(db_id.clone()).or_default();
            let triggers = self.triggers.entry(db_id.clone()).or_default();
            let sprocs = self.sprocs.entry(db_id.clone()).or_default();
            let udfs = self.udfs.entry(db_id.clone()).or_default();
            for coll_id in collections.keys() {
                documents.entry(coll_id.clone()).or_default();
                triggers.entry(coll_id.clone()).or_default();
                sprocs.entry(coll_id.clone()).or_default();
                udfs.entry(coll_id.clone()).or_default();
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DataStore {
    state: State,
    next_rid: u64,
}

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole state with the one encoded in `json`.
    pub fn load_state(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let mut state: State = serde_json::from_str(json)?;
        state.fill_dependents();
        self.state = state;
        Ok(())
    }

    pub fn dump_state(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.state)
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn create_database(&mut self, mut database: Database) -> StoreResult<Database> {
        if database.id.is_empty() {
            return Err(StoreError::BadRequest);
        }
        if self.state.databases.contains_key(&database.id) {
            return Err(StoreError::Conflict);
        }
        let meta = self.generate_metadata("", "dbs");
        database.ts = meta.ts;
        database.rid = meta.rid;
        database.etag = meta.etag;
        database.self_link = meta.self_link;
        self.state
            .databases
            .insert(database.id.clone(), database.clone());
        self.state.fill_dependents();
        Ok(database)
    }

    pub fn database(&self, id: &str) -> StoreResult<&Database> {
        self.state.databases.get(id).ok_or(StoreError::NotFound)
    }

    #[must_use]
    pub fn databases(&self) -> Vec<&Database> {
        self.state.databases.values().collect()
    }

    pub fn delete_database(&mut self, id: &str) -> StoreResult<()> {
        self.state
            .databases
            .remove(id)
            .ok_or(StoreError::NotFound)?;
        self.state.collections.remove(id);
        self.state.documents.remove(id);
        self.state.triggers.remove(id);
        self.state.sprocs.remove(id);
        self.state.udfs.remove(id);
        Ok(())
    }

    pub fn create_collection(
        &mut self,
        db_id: &str,
        mut collection: Collection,
    ) -> StoreResult<Collection> {
        let parent = self.database(db_id)?.self_link.clone();
        if collection.id.is_empty() {
            return Err(StoreError::BadRequest);
        }
        let exists = self
            .state
            .collections
            .get(db_id)
            .is_some_and(|colls| colls.contains_key(&collection.id));
        if exists {
            return Err(StoreError::Conflict);
        }
        let meta = self.generate_metadata(&parent, "colls");
        collection.ts = meta.ts;
        collection.rid = meta.rid;
        collection.etag = meta.etag;
        collection.self_link = meta.self_link;
        self.state
            .collections
            .entry(db_id.to_owned())
            .or_default()
            .insert(collection.id.clone(), collection.clone());
        self.state.fill_dependents();
        Ok(collection)
    }

    pub fn collection(&self, db_id: &str, coll_id: &str) -> StoreResult<&Collection> {
        self.database(db_id)?;
        self.state
            .collections
            .get(db_id)
            .and_then(|colls| colls.get(coll_id))
            .ok_or(StoreError::NotFound)
    }

    pub fn collections(&self, db_id: &str) -> StoreResult<Vec<&Collection>> {
        self.database(db_id)?;
        Ok(self
            .state
            .collections
            .get(db_id)
            .map(|colls| colls.values().collect())
            .unwrap_or_default())
    }

    pub fn delete_collection(&mut self, db_id: &str, coll_id: &str) -> StoreResult<()> {
        self.collection(db_id, coll_id)?;
        if let Some(colls) = self.state.collections.get_mut(db_id) {
            colls.remove(coll_id);
        }
        for dependents in [
            &mut self.state.triggers,
            &mut self.state.sprocs,
            &mut self.state.udfs,
        ] {
            if let Some(per_db) = dependents.get_mut(db_id) {
                per_db.remove(coll_id);
            }
        }
        if let Some(per_db) = self.state.documents.get_mut(db_id) {
            per_db.remove(coll_id);
        }
        Ok(())
    }

    pub fn create_document(
        &mut self,
        db_id: &str,
        coll_id: &str,
        mut document: Document,
    ) -> StoreResult<Document> {
        let parent = self.collection(db_id, coll_id)?.self_link.clone();
        let id = match document.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => return Err(StoreError::BadRequest),
        };
        let exists = self
            .documents_in(db_id, coll_id)
            .is_some_and(|docs| docs.contains_key(&id));
        if exists {
            return Err(StoreError::Conflict);
        }
        let meta = self.generate_metadata(&parent, "docs");
        document.insert("_ts".into(), Value::from(meta.ts));
        document.insert("_rid".into(), Value::from(meta.rid));
        document.insert("_etag".into(), Value::from(meta.etag));
        document.insert("_self".into(), Value::from(meta.self_link));
        self.state
            .documents
            .entry(db_id.to_owned())
            .or_default()
            .entry(coll_id.to_owned())
            .or_default()
            .insert(id, document.clone());
        Ok(document)
    }

    pub fn document(&self, db_id: &str, coll_id: &str, doc_id: &str) -> StoreResult<&Document> {
        self.collection(db_id, coll_id)?;
        self.documents_in(db_id, coll_id)
            .and_then(|docs| docs.get(doc_id))
            .ok_or(StoreError::NotFound)
    }

    pub fn documents(&self, db_id: &str, coll_id: &str) -> StoreResult<Vec<&Document>> {
        self.collection(db_id, coll_id)?;
        Ok(self
            .documents_in(db_id, coll_id)
            .map(|docs| docs.values().collect())
            .unwrap_or_default())
    }

    /// Replace the document stored under `doc_id`. The stored `id` always
    /// follows `doc_id`, whatever the replacement body says.
    pub fn replace_document(
        &mut self,
        db_id: &str,
        coll_id: &str,
        doc_id: &str,
        mut document: Document,
    ) -> StoreResult<Document> {
        let parent = self.collection(db_id, coll_id)?.self_link.clone();
        self.document(db_id, coll_id, doc_id)?;
        let meta = self.generate_metadata(&parent, "docs");
        document.insert("id".into(), Value::from(doc_id));
        document.insert("_ts".into(), Value::from(meta.ts));
        document.insert("_rid".into(), Value::from(meta.rid));
        document.insert("_etag".into(), Value::from(meta.etag));
        document.insert("_self".into(), Value::from(meta.self_link));
        if let Some(docs) = self
            .state
            .documents
            .get_mut(db_id)
            .and_then(|per_db| per_db.get_mut(coll_id))
        {
            docs.insert(doc_id.to_owned(), document.clone());
        }
        Ok(document)
    }

    pub fn delete_document(&mut self, db_id: &str, coll_id: &str, doc_id: &str) -> StoreResult<()> {
        self.collection(db_id, coll_id)?;
        self.state
            .documents
            .get_mut(db_id)
            .and_then(|per_db| per_db.get_mut(coll_id))
            .and_then(|docs| docs.remove(doc_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn documents_in(&self, db_id: &str, coll_id: &str) -> Option<&BTreeMap<String, Document>> {
        self.state
            .documents
            .get(db_id)
            .and_then(|per_db| per_db.get(coll_id))
    }

    fn generate_metadata(&mut self, parent: &str, kind: &str) -> Metadata {
        self.next_rid += 1;
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        let rid = format!("{:08X}", self.next_rid);
        Metadata {
            ts,
            etag: format!("\"{:08x}-0000-0000-0000-{:012x}\"", self.next_rid, ts),
            self_link: format!("{parent}{kind}/{rid}/"),
            rid,
        }
    }
}

struct Metadata {
    ts: i64,
    rid: String,
    etag: String,
    self_link: String,
}
