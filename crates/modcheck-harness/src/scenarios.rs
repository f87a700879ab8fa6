//! Acceptance scenarios over the module ABI.
//!
//! Each scenario resolves the exports it needs from scratch, calls them with
//! fixed literal inputs and checks the result. Scenarios share one server
//! instance, [`SERVER_NAME`], and depend on the side effects of the ones
//! before them, so suites always run in declaration order.
//!
//! Buffers returned by the module are [`ModuleBuffer`]s: they go back through
//! the module's own `FreeMemory` when dropped, which includes every early `?`
//! return below. A module without `FreeMemory` fails every buffer call before
//! the export runs.

use std::ffi::CStr;
use std::fmt;

use modcheck_core::compact::compact_json;
use modcheck_core::{ModuleBuffer, SymbolSource, abi};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScenarioError;

pub const SERVER_NAME: &CStr = c"TestServer";
pub const SERVER_CONFIG: &CStr = c"{\"host\":\"localhost\",\"port\":8080}";

pub const DATABASE_ID: &CStr = c"test-db";
pub const DATABASE_JSON: &CStr = c"{\"id\":\"test-db\"}";

pub const INSTANCE_STATE: &CStr = c"{\"databases\":{\"test-db\":{\"id\":\"test-db\"}}}";

/// Compacted dump expected from `GetServerInstanceState` after
/// [`INSTANCE_STATE`] has been loaded.
pub const EXPECTED_INSTANCE_STATE: &str = concat!(
    r#"{"databases":{"test-db":{"id":"test-db","_ts":0,"_rid":"","_etag":"","_self":""}},"#,
    r#""collections":{"test-db":{}},"documents":{"test-db":{}},"#,
    r#""triggers":{"test-db":{}},"sprocs":{"test-db":{}},"udfs":{"test-db":{}}}"#,
);

pub const COLLECTION_ID: &CStr = c"test-coll";
pub const COLLECTION_JSON: &CStr = c"{\"id\":\"test-coll\"}";

pub const DOCUMENT_ID: &CStr = c"doc-1";
pub const DOCUMENT_JSON: &CStr = c"{\"id\":\"doc-1\",\"value\":42}";
pub const DOCUMENT_UPDATE_JSON: &CStr = c"{\"id\":\"doc-1\",\"value\":43}";

/// One acceptance scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    CreateServer,
    Database,
    InstanceState,
    Collection,
    Document,
    StopServer,
}

impl Scenario {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateServer => "Create-Server",
            Self::Database => "Database lifecycle",
            Self::InstanceState => "Instance-State lifecycle",
            Self::Collection => "Collection lifecycle",
            Self::Document => "Document lifecycle",
            Self::StopServer => "Stop-Server",
        }
    }

    /// Run the scenario against `module`, recording progress in `trace`.
    pub fn run<M: SymbolSource>(self, module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
        match self {
            Self::CreateServer => create_server(module, trace),
            Self::Database => database(module, trace),
            Self::InstanceState => instance_state(module, trace),
            Self::Collection => collection(module, trace),
            Self::Document => document(module, trace),
            Self::StopServer => stop_server(module, trace),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which scenarios to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Create-Server, Database, Instance-State, Stop-Server.
    #[default]
    Canonical,
    /// The canonical suite plus collection and document lifecycles.
    Extended,
}

impl Suite {
    #[must_use]
    pub const fn scenarios(self) -> &'static [Scenario] {
        match self {
            Self::Canonical => &[
                Scenario::CreateServer,
                Scenario::Database,
                Scenario::InstanceState,
                Scenario::StopServer,
            ],
            Self::Extended => &[
                Scenario::CreateServer,
                Scenario::Database,
                Scenario::InstanceState,
                Scenario::Collection,
                Scenario::Document,
                Scenario::StopServer,
            ],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Extended => "extended",
        }
    }
}

/// A successful call, printed as `<symbol>: SUCCESS` with an optional
/// parenthesized detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub symbol: &'static str,
    pub detail: Option<String>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: SUCCESS", self.symbol)?;
        match &self.detail {
            Some(detail) => write!(f, " ({detail})"),
            None => Ok(()),
        }
    }
}

/// Progress recorded while a scenario runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    /// Calls that succeeded, in call order.
    pub steps: Vec<Step>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
}

impl Trace {
    /// Symbols of the recorded steps.
    #[must_use]
    pub fn symbols(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.symbol).collect()
    }

    fn step(&mut self, symbol: &'static str) {
        self.steps.push(Step {
            symbol,
            detail: None,
        });
    }

    fn step_with(&mut self, symbol: &'static str, detail: String) {
        self.steps.push(Step {
            symbol,
            detail: Some(detail),
        });
    }
}

fn expect_success(symbol: &'static str, raw: i32) -> Result<(), ScenarioError> {
    if raw == 0 {
        Ok(())
    } else {
        Err(ScenarioError::status(symbol, raw))
    }
}

fn expect_buffer<'m>(
    symbol: &'static str,
    buffer: Option<ModuleBuffer<'m>>,
) -> Result<ModuleBuffer<'m>, ScenarioError> {
    buffer.ok_or_else(|| ScenarioError::null_buffer(symbol))
}

/// The buffer's bytes as text. Invalid UTF-8 is a failure, never replaced.
fn text<'b>(symbol: &'static str, buffer: &'b ModuleBuffer<'_>) -> Result<&'b str, ScenarioError> {
    buffer
        .as_cstr()
        .to_str()
        .map_err(|err| ScenarioError::InvalidUtf8 {
            symbol,
            valid_up_to: err.valid_up_to(),
        })
}

fn compact(symbol: &'static str, buffer: &ModuleBuffer<'_>) -> Result<String, ScenarioError> {
    compact_json(text(symbol, buffer)?)
        .map_err(|source| ScenarioError::Compaction { symbol, source })
}

/// Compare the compacted buffer with `expected` byte for byte.
fn expect_literal(
    symbol: &'static str,
    expected: &str,
    buffer: &ModuleBuffer<'_>,
) -> Result<(), ScenarioError> {
    let actual = compact(symbol, buffer)?;
    if actual == expected {
        Ok(())
    } else {
        Err(ScenarioError::ValidationMismatch {
            symbol,
            expected: expected.to_owned(),
            actual,
        })
    }
}

fn parse_json(symbol: &'static str, buffer: &ModuleBuffer<'_>) -> Result<Value, ScenarioError> {
    let text = text(symbol, buffer)?;
    serde_json::from_str(text).map_err(|_| ScenarioError::ValidationMismatch {
        symbol,
        expected: "a JSON document".to_owned(),
        actual: text.to_owned(),
    })
}

fn expect_field(
    symbol: &'static str,
    object: &Value,
    field: &str,
    expected: &Value,
) -> Result<(), ScenarioError> {
    let actual = object.get(field).unwrap_or(&Value::Null);
    if actual == expected {
        Ok(())
    } else {
        Err(ScenarioError::ValidationMismatch {
            symbol,
            expected: format!("\"{field}\":{expected}"),
            actual: format!("\"{field}\":{actual}"),
        })
    }
}

fn id_of(id: &CStr) -> Value {
    Value::from(id.to_string_lossy().into_owned())
}

fn create_server<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let create = module.resolve(abi::CREATE_SERVER_INSTANCE)?;
    expect_success(create.name(), create.call(SERVER_NAME, SERVER_CONFIG))?;
    trace.step(create.name());
    Ok(())
}

fn database<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let create = module.resolve(abi::CREATE_DATABASE)?;
    expect_success(create.name(), create.call(SERVER_NAME, DATABASE_JSON))?;
    trace.step(create.name());

    let get = module.resolve(abi::GET_DATABASE)?;
    let buffer = expect_buffer(get.name(), get.call(SERVER_NAME, DATABASE_ID)?)?;
    if buffer.is_empty() {
        trace
            .warnings
            .push(format!("{} returned an empty buffer", get.name()));
    }
    trace.step_with(get.name(), format!("database = {}", buffer.to_str_lossy()));
    Ok(())
}

fn instance_state<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let load = module.resolve(abi::LOAD_SERVER_INSTANCE_STATE)?;
    expect_success(load.name(), load.call(SERVER_NAME, INSTANCE_STATE))?;
    trace.step(load.name());

    let get = module.resolve(abi::GET_SERVER_INSTANCE_STATE)?;
    let buffer = expect_buffer(get.name(), get.call(SERVER_NAME)?)?;
    expect_literal(get.name(), EXPECTED_INSTANCE_STATE, &buffer)?;
    trace.step_with(get.name(), format!("state = {}", text(get.name(), &buffer)?));
    Ok(())
}

fn collection<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let create = module.resolve(abi::CREATE_COLLECTION)?;
    expect_success(
        create.name(),
        create.call(SERVER_NAME, DATABASE_ID, COLLECTION_JSON),
    )?;
    trace.step(create.name());

    let expected_id = id_of(COLLECTION_ID);

    let get = module.resolve(abi::GET_COLLECTION)?;
    let buffer = expect_buffer(
        get.name(),
        get.call(SERVER_NAME, DATABASE_ID, COLLECTION_ID)?,
    )?;
    let value = parse_json(get.name(), &buffer)?;
    expect_field(get.name(), &value, "id", &expected_id)?;
    trace.step(get.name());

    let list = module.resolve(abi::GET_ALL_COLLECTIONS)?;
    let buffer = expect_buffer(list.name(), list.call(SERVER_NAME, DATABASE_ID)?)?;
    let listed = parse_json(list.name(), &buffer)?;
    let found = listed
        .as_array()
        .is_some_and(|items| items.iter().any(|item| item.get("id") == Some(&expected_id)));
    if !found {
        return Err(ScenarioError::ValidationMismatch {
            symbol: list.name(),
            expected: format!("an array containing {{\"id\":{expected_id}}}"),
            actual: compact(list.name(), &buffer)?,
        });
    }
    trace.step(list.name());
    Ok(())
}

fn document<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let expected_id = id_of(DOCUMENT_ID);

    let create = module.resolve(abi::CREATE_DOCUMENT)?;
    expect_success(
        create.name(),
        create.call(SERVER_NAME, DATABASE_ID, COLLECTION_ID, DOCUMENT_JSON),
    )?;
    trace.step(create.name());

    let get = module.resolve(abi::GET_DOCUMENT)?;
    let buffer = expect_buffer(
        get.name(),
        get.call(SERVER_NAME, DATABASE_ID, COLLECTION_ID, DOCUMENT_ID)?,
    )?;
    let value = parse_json(get.name(), &buffer)?;
    expect_field(get.name(), &value, "id", &expected_id)?;
    expect_field(get.name(), &value, "value", &Value::from(42))?;
    drop(buffer);
    trace.step(get.name());

    let update = module.resolve(abi::UPDATE_DOCUMENT)?;
    expect_success(
        update.name(),
        update.call(
            SERVER_NAME,
            DATABASE_ID,
            COLLECTION_ID,
            DOCUMENT_ID,
            DOCUMENT_UPDATE_JSON,
        ),
    )?;
    trace.step(update.name());

    let buffer = expect_buffer(
        get.name(),
        get.call(SERVER_NAME, DATABASE_ID, COLLECTION_ID, DOCUMENT_ID)?,
    )?;
    let value = parse_json(get.name(), &buffer)?;
    expect_field(get.name(), &value, "value", &Value::from(43))?;
    drop(buffer);
    trace.step(get.name());

    let delete = module.resolve(abi::DELETE_DOCUMENT)?;
    expect_success(
        delete.name(),
        delete.call(SERVER_NAME, DATABASE_ID, COLLECTION_ID, DOCUMENT_ID),
    )?;
    trace.step(delete.name());
    Ok(())
}

fn stop_server<M: SymbolSource>(module: &M, trace: &mut Trace) -> Result<(), ScenarioError> {
    let stop = module.resolve(abi::STOP_SERVER_INSTANCE)?;
    expect_success(stop.name(), stop.call(SERVER_NAME))?;
    trace.step(stop.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use modcheck_core::symbol::StrToInt;
    use modcheck_core::{ResolutionError, StaticExports};
    use modcheck_fixture_module::faults;
    use modcheck_fixture_module::server_abi::FreeMemory;

    use super::*;

    #[test]
    fn canonical_suite_order_is_fixed() {
        assert_eq!(
            Suite::Canonical.scenarios(),
            &[
                Scenario::CreateServer,
                Scenario::Database,
                Scenario::InstanceState,
                Scenario::StopServer
            ]
        );
        assert_eq!(Suite::Extended.scenarios().len(), 6);
        assert_eq!(
            Suite::Extended.scenarios().last(),
            Some(&Scenario::StopServer)
        );
    }

    #[test]
    fn expected_state_has_no_whitespace() {
        assert_eq!(
            compact_json(EXPECTED_INSTANCE_STATE).unwrap(),
            EXPECTED_INSTANCE_STATE
        );
    }

    #[test]
    fn create_server_passes_on_zero() {
        let exports = StaticExports::new().with(abi::CREATE_SERVER_INSTANCE, faults::succeed2);
        let mut trace = Trace::default();
        Scenario::CreateServer.run(&exports, &mut trace).unwrap();
        assert_eq!(trace.symbols(), vec!["CreateServerInstance"]);
    }

    #[test]
    fn failed_create_database_skips_get_database() {
        let exports = StaticExports::new()
            .with(abi::CREATE_DATABASE, faults::conflict2)
            .with(abi::GET_DATABASE, faults::counted_null_buffer2)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        let err = Scenario::Database.run(&exports, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::CallFailure {
                symbol: "CreateDatabase",
                ..
            }
        ));
        assert!(err.to_string().contains("201 (DataStoreConflict)"));
        assert_eq!(faults::counted_null_buffer2_calls(), 0);
        assert!(trace.steps.is_empty());
    }

    #[test]
    fn missing_deallocator_fails_before_get_database_runs() {
        let exports = StaticExports::new()
            .with(abi::CREATE_DATABASE, faults::succeed2)
            .with(abi::GET_DATABASE, faults::counted_null_buffer2);
        let mut trace = Trace::default();
        let err = Scenario::Database.run(&exports, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Resolution(ResolutionError::Missing { .. })
        ));
        assert_eq!(err.symbol(), "FreeMemory");
        assert_eq!(faults::counted_null_buffer2_calls(), 0);
        assert_eq!(trace.symbols(), vec!["CreateDatabase"]);
    }

    #[test]
    fn empty_database_buffer_passes_with_warning() {
        let exports = StaticExports::new()
            .with(abi::CREATE_DATABASE, faults::succeed2)
            .with(abi::GET_DATABASE, faults::empty_buffer2)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        Scenario::Database.run(&exports, &mut trace).unwrap();
        assert_eq!(trace.symbols(), vec!["CreateDatabase", "GetDatabase"]);
        assert_eq!(trace.steps[1].to_string(), "GetDatabase: SUCCESS (database = )");
        assert_eq!(trace.warnings.len(), 1);
    }

    #[test]
    fn null_state_buffer_is_a_call_failure() {
        let exports = StaticExports::new()
            .with(abi::LOAD_SERVER_INSTANCE_STATE, faults::succeed2)
            .with(abi::GET_SERVER_INSTANCE_STATE, faults::null_buffer)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        let err = Scenario::InstanceState.run(&exports, &mut trace).unwrap_err();
        assert_eq!(err.symbol(), "GetServerInstanceState");
        assert!(err.to_string().contains("null buffer"));
        assert_eq!(trace.symbols(), vec!["LoadServerInstanceState"]);
    }

    #[test]
    fn failed_state_load_skips_state_dump() {
        let exports = StaticExports::new()
            .with(abi::LOAD_SERVER_INSTANCE_STATE, faults::state_load_failed2)
            .with(abi::GET_SERVER_INSTANCE_STATE, faults::counted_null_buffer)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        let err = Scenario::InstanceState.run(&exports, &mut trace).unwrap_err();
        assert_eq!(err.symbol(), "LoadServerInstanceState");
        assert!(err.to_string().contains("102 (FailedToLoadState)"));
        assert_eq!(faults::counted_null_buffer_calls(), 0);
        assert!(trace.steps.is_empty());
    }

    #[test]
    fn invalid_utf8_state_is_not_replaced() {
        let exports = StaticExports::new()
            .with(abi::LOAD_SERVER_INSTANCE_STATE, faults::succeed2)
            .with(abi::GET_SERVER_INSTANCE_STATE, faults::invalid_utf8_state)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        let err = Scenario::InstanceState.run(&exports, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::InvalidUtf8 {
                symbol: "GetServerInstanceState",
                valid_up_to: 13,
            }
        ));
        assert_eq!(trace.symbols(), vec!["LoadServerInstanceState"]);
    }

    #[test]
    fn stale_state_is_a_mismatch_and_is_freed() {
        let exports = StaticExports::new()
            .with(abi::LOAD_SERVER_INSTANCE_STATE, faults::succeed2)
            .with(abi::GET_SERVER_INSTANCE_STATE, faults::stale_state)
            .with(abi::FREE_MEMORY, faults::counting_free);
        let mut trace = Trace::default();
        let err = Scenario::InstanceState.run(&exports, &mut trace).unwrap_err();
        match err {
            ScenarioError::ValidationMismatch {
                symbol,
                expected,
                actual,
            } => {
                assert_eq!(symbol, "GetServerInstanceState");
                assert_eq!(expected, EXPECTED_INSTANCE_STATE);
                assert!(actual.ends_with("\"documents\":{\"test-db\":{}}}"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(faults::counted_frees(), 1);
    }

    #[test]
    fn whitespace_in_state_dump_is_ignored() {
        let exports = StaticExports::new()
            .with(abi::LOAD_SERVER_INSTANCE_STATE, faults::succeed2)
            .with(abi::GET_SERVER_INSTANCE_STATE, faults::pretty_state)
            .with(abi::FREE_MEMORY, FreeMemory);
        let mut trace = Trace::default();
        Scenario::InstanceState.run(&exports, &mut trace).unwrap();
        assert_eq!(
            trace.symbols(),
            vec!["LoadServerInstanceState", "GetServerInstanceState"]
        );
        let shown = trace.steps[1].to_string();
        assert!(shown.starts_with("GetServerInstanceState: SUCCESS (state = {\n"), "{shown}");
    }

    #[test]
    fn missing_export_is_a_resolution_error() {
        let exports = StaticExports::new();
        let mut trace = Trace::default();
        let err = Scenario::StopServer.run(&exports, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Resolution(ResolutionError::Missing { .. })
        ));
        assert_eq!(err.symbol(), "StopServerInstance");
    }

    #[test]
    fn wrongly_shaped_export_is_a_resolution_error() {
        // `int f(char*)` registered where the contract says `int f(char*, char*)`.
        let exports = StaticExports::new()
            .with_named("CreateServerInstance", faults::succeed as StrToInt);
        let mut trace = Trace::default();
        let err = Scenario::CreateServer.run(&exports, &mut trace).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Resolution(ResolutionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn stop_server_reports_unknown_instance() {
        let exports =
            StaticExports::new().with(abi::STOP_SERVER_INSTANCE, faults::instance_not_found);
        let mut trace = Trace::default();
        let err = Scenario::StopServer.run(&exports, &mut trace).unwrap_err();
        assert!(err.to_string().contains("105 (ServerInstanceNotFound)"));

        let exports = StaticExports::new().with(abi::STOP_SERVER_INSTANCE, faults::succeed);
        Scenario::StopServer.run(&exports, &mut trace).unwrap();
        assert_eq!(trace.symbols(), vec!["StopServerInstance"]);
    }
}
