//! Return flag names for C callers.

use std::ffi::{CString, c_char, c_long};
use std::ptr;

use stepctl_core::return_flag_name;

use crate::macros::abi_fn;

abi_fn! {
    /// Heap-allocated name of `flag`; release it with `stepctl_free_name`.
    ///
    /// Unknown codes yield `"NONE"`.
    fn stepctl_get_return_flag_name(flag: c_long) -> *mut c_char {
        CString::new(return_flag_name(i64::from(flag))).map_or(ptr::null_mut(), CString::into_raw)
    }
}

abi_fn! {
    /// Release a name returned by `stepctl_get_return_flag_name`.
    fn stepctl_free_name(name: *mut c_char) {
        if !name.is_null() {
            drop(CString::from_raw(name));
        }
    }
}
