//! Process-wide registry of named server instances.
//!
//! Every export resolves its server by name here. The registry lock is held
//! for the whole operation, so calls from several threads serialize.

use std::collections::BTreeMap;

use modcheck_core::ResponseCode;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::store::DataStore;

/// Instance configuration as passed to `CreateServerInstance`.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub account_key: Option<String>,
    /// `"memory"` (default) or `"persistent"`; a persistent store refuses
    /// state loading.
    #[serde(default)]
    pub data_store: Option<String>,
}

fn default_host() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    8081
}

impl ServerConfig {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn supports_state_loading(&self) -> bool {
        self.data_store
            .as_deref()
            .is_none_or(|kind| kind.eq_ignore_ascii_case("memory"))
    }
}

#[derive(Debug)]
pub struct ServerInstance {
    pub config: ServerConfig,
    pub store: DataStore,
}

static INSTANCES: Mutex<BTreeMap<String, ServerInstance>> =
    parking_lot::const_mutex(BTreeMap::new());

pub fn create_instance(name: &str, config_json: &str) -> ResponseCode {
    let Ok(config) = ServerConfig::parse(config_json) else {
        return ResponseCode::FailedToParseConfiguration;
    };
    let mut instances = INSTANCES.lock();
    if instances.contains_key(name) {
        return ResponseCode::ServerInstanceAlreadyExists;
    }
    instances.insert(
        name.to_owned(),
        ServerInstance {
            config,
            store: DataStore::new(),
        },
    );
    ResponseCode::Success
}

pub fn stop_instance(name: &str) -> ResponseCode {
    match INSTANCES.lock().remove(name) {
        Some(_) => ResponseCode::Success,
        None => ResponseCode::ServerInstanceNotFound,
    }
}

pub fn load_instance_state(name: &str, state_json: &str) -> ResponseCode {
    let mut instances = INSTANCES.lock();
    let Some(instance) = instances.get_mut(name) else {
        return ResponseCode::ServerInstanceNotFound;
    };
    if !instance.config.supports_state_loading() {
        return ResponseCode::CurrentDataStoreDoesNotSupportStateLoading;
    }
    match instance.store.load_state(state_json) {
        Ok(()) => ResponseCode::Success,
        Err(_) => ResponseCode::FailedToLoadState,
    }
}

/// Run `f` against the named instance's store, or `None` when no such
/// instance exists.
pub fn with_store<R>(name: &str, f: impl FnOnce(&mut DataStore) -> R) -> Option<R> {
    INSTANCES
        .lock()
        .get_mut(name)
        .map(|instance| f(&mut instance.store))
}
