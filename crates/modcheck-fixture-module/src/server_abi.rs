//! Server-instance lifecycle exports and the shared deallocator.
#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};
use std::ptr;

use modcheck_core::ResponseCode;

use crate::macros::module_fn;
use crate::registry;
use crate::util::{into_buffer, release_buffer};

module_fn! {
    /// `0` on success, `104` if the name is taken, `101` for bad configuration.
    fn CreateServerInstance(server_name, configuration_json) -> c_int,
        or ResponseCode::FailedToParseConfiguration.as_raw();
    {
        registry::create_instance(server_name, configuration_json).as_raw()
    }
}

module_fn! {
    fn StopServerInstance(server_name) -> c_int, or ResponseCode::FailedToParseRequest.as_raw();
    {
        registry::stop_instance(server_name).as_raw()
    }
}

module_fn! {
    /// Replace the instance's whole data store with `state_json`.
    fn LoadServerInstanceState(server_name, state_json) -> c_int,
        or ResponseCode::FailedToParseRequest.as_raw();
    {
        registry::load_instance_state(server_name, state_json).as_raw()
    }
}

module_fn! {
    /// The data store dump, or null for an unknown instance or a store that
    /// cannot be serialized.
    fn GetServerInstanceState(server_name) -> *mut c_char, or ptr::null_mut();
    {
        registry::with_store(server_name, |store| store.dump_state())
            .and_then(Result::ok)
            .map_or_else(ptr::null_mut, into_buffer)
    }
}

/// Release a buffer returned by any export of this module. Null is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn FreeMemory(buffer: *mut c_char) {
    // SAFETY: the caller hands back a pointer this module produced.
    unsafe { release_buffer(buffer) }
}
