use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use thiserror::Error;

/// Opaque error type for C callers.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct diag_error_t;

/// Reasons a checked forward is refused before it reaches the callee.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForwardError {
    #[error("sub_name was null")]
    NullName,
    #[error("sub_name is {0} bytes, longer than the int length the callee accepts")]
    NameTooLong(usize),
    #[error("no {0} callee is bound")]
    Unbound(&'static str),
}

struct ErrorHandle {
    message: CString,
}

pub(crate) fn cstring_from_str_lossy(value: &str) -> CString {
    let bytes: Vec<u8> = value
        .bytes()
        .map(|b| if b == 0 { b' ' } else { b })
        .collect();
    // No interior NULs remain, so this cannot fail.
    CString::new(bytes).unwrap_or_default()
}

pub(crate) fn clear_error(out_error: *mut *mut diag_error_t) {
    // Safety: a non-null out_error points to writable memory.
    if let Some(slot) = (unsafe { out_error.as_mut() }) {
        *slot = ptr::null_mut();
    }
}

pub(crate) fn write_error(out_error: *mut *mut diag_error_t, message: impl Into<String>) {
    // Safety: a non-null out_error points to writable memory.
    let Some(slot) = (unsafe { out_error.as_mut() }) else {
        return;
    };
    let handle = ErrorHandle {
        message: cstring_from_str_lossy(&message.into()),
    };
    *slot = Box::into_raw(Box::new(handle)).cast::<diag_error_t>();
}

/// Turns a checked forward into the C `bool` + out-parameter convention.
///
/// `out_error` is cleared first and only set when `result` is an error.
pub(crate) fn report<T>(
    out_error: *mut *mut diag_error_t,
    result: Result<T, ForwardError>,
) -> bool {
    clear_error(out_error);
    match result {
        Ok(_) => true,
        Err(err) => {
            write_error(out_error, err.to_string());
            false
        }
    }
}

/// Returns the message for an error allocated by the diagnostics bindings.
///
/// The returned pointer is valid as long as the error handle is alive.
#[unsafe(no_mangle)]
pub extern "C" fn diag_error_message(error: *const diag_error_t) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    // Safety: error must be a live handle from `write_error`.
    let handle = unsafe { &*error.cast::<ErrorHandle>() };
    handle.message.as_ptr()
}

/// Frees an error returned by the diagnostics bindings.
#[unsafe(no_mangle)]
pub extern "C" fn diag_error_free(error: *mut diag_error_t) {
    if error.is_null() {
        return;
    }
    // Safety: error must be a live handle from `write_error`, freed once.
    drop(unsafe { Box::from_raw(error.cast::<ErrorHandle>()) });
}
