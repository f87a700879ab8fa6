//! Helper macro for the string-argument exports.

/// Generate a `#[unsafe(no_mangle)] pub unsafe extern "C" fn` whose
/// parameters are all `char*`.
///
/// Each argument is rebound as `&str` before `$body` runs. A null or
/// non-UTF-8 argument returns `$fallback` without entering the body.
///
/// ```ignore
/// module_fn! {
///     fn StopServerInstance(server_name) -> c_int, or ResponseCode::FailedToParseRequest.as_raw();
///     { registry::stop_instance(server_name).as_raw() }
/// }
/// ```
macro_rules! module_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident),+ $(,)? ) -> $ret:ty, or $fallback:expr;
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg: *mut ::std::ffi::c_char),+ ) -> $ret {
            $(
                // SAFETY: callers pass NUL-terminated strings (or null) that
                // stay valid for the duration of the call.
                let Some($arg) = (unsafe { $crate::util::read_str($arg) }) else {
                    return $fallback;
                };
            )+
            $body
        }
    };
}

pub(crate) use module_fn;
