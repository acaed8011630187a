//! Helper macros for ABI function generation.

/// Generate an exported `extern "C"` entry point.
///
/// ```ignore
/// abi_fn! {
///     /// Doc comment for the function.
///     fn stepctl_something(mem: *mut StepctlMem, value: c_int) -> c_int {
///         // body runs inside an `unsafe` block
///     }
/// }
/// ```
macro_rules! abi_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            unsafe { $body }
        }
    };

    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            unsafe { $body }
        }
    };
}

/// Generate a status-returning setter on a `StepctlMem` handle.
///
/// The handle is checked for null before the body runs. A plain `fn` body
/// yields a `StepResult<()>`; a `tolerant fn` body yields `()` and always
/// succeeds on a live handle.
///
/// ```ignore
/// handle_fn! {
///     fn stepctl_set_min_step(hmin: f64) => "set_min_step", |h| h.set_min_step(hmin)
/// }
/// ```
macro_rules! handle_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) => $op:literal, |$h:ident| $body:expr
    ) => {
        $crate::macros::abi_fn! {
            $(#[$meta])*
            fn $name(mem: *mut $crate::util::StepctlMem $(, $arg: $argty)*) -> ::std::ffi::c_int {
                $crate::util::with_handle($op, mem, |$h| $body)
            }
        }
    };

    (
        $(#[$meta:meta])*
        tolerant fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) => $op:literal, |$h:ident| $body:expr
    ) => {
        $crate::macros::abi_fn! {
            $(#[$meta])*
            fn $name(mem: *mut $crate::util::StepctlMem $(, $arg: $argty)*) -> ::std::ffi::c_int {
                $crate::util::with_handle($op, mem, |$h| {
                    $body;
                    Ok(())
                })
            }
        }
    };
}

pub(crate) use abi_fn;
pub(crate) use handle_fn;
