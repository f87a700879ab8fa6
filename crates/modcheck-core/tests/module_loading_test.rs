//! Integration test: loading modules and resolving exports through the
//! platform loader.
//!
//! Run: cargo test -p modcheck-core --test module_loading_test

use std::path::Path;

use modcheck_core::{LoadError, Module, ResolutionError, SymbolSource, abi};

#[test]
fn missing_file_reports_platform_message() {
    let path = std::env::temp_dir().join("modcheck_no_such_module.so");
    let err = Module::open(&path).unwrap_err();
    match err {
        LoadError::Open { path: reported, message } => {
            assert_eq!(reported, path);
            assert!(!message.is_empty(), "loader should explain the failure");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_module_file_is_rejected() {
    let dir = std::env::temp_dir().join("modcheck_loading_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("not_a_module.so");
    std::fs::write(&path, b"this is not a shared object").unwrap();

    let err = Module::open(&path).unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }), "got {err}");
    assert!(err.to_string().contains("not_a_module.so"));
}

#[test]
fn interior_nul_in_path_is_rejected_before_loading() {
    let err = Module::open(Path::new("bad\0module.so")).unwrap_err();
    assert!(matches!(err, LoadError::InvalidPath { .. }), "got {err}");
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod host_libc {
    use modcheck_core::Export;
    use modcheck_core::symbol::StrToInt;

    use super::*;

    // SAFETY: `int atoi(const char*)`.
    const ATOI: Export<StrToInt> = unsafe { Export::new("atoi") };
    // SAFETY: never called; only resolution is exercised.
    const DOES_NOT_EXIST: Export<StrToInt> = unsafe { Export::new("DoesNotExist") };

    fn open_libc() -> Module {
        Module::open("libc.so.6").expect("glibc hosts can load libc.so.6")
    }

    #[test]
    fn resolves_and_calls_an_int_export() {
        let module = open_libc();
        let atoi = module.resolve(ATOI).unwrap();
        assert_eq!(atoi.name(), "atoi");
        assert_eq!(atoi.call(c"4711"), 4711);
        module.close().unwrap();
    }

    #[test]
    fn nonexistent_export_is_a_resolution_error() {
        let module = open_libc();
        let err = module.resolve(DOES_NOT_EXIST).unwrap_err();
        match &err {
            ResolutionError::Missing { symbol, message } => {
                assert_eq!(symbol, "DoesNotExist");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(module.resolve(abi::CREATE_SERVER_INSTANCE).is_err());
    }

    #[test]
    fn leaked_module_is_not_unloaded() {
        let module = open_libc();
        assert_eq!(module.loader_name(), "posix");
        module.leak();
        let again = open_libc();
        assert!(again.resolve(ATOI).is_ok());
    }
}
