//! Shared utilities for reading identifiers handed over by C callers.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::error::ForwardError;

/// Borrows a caller's identifier without any checks.
///
/// # Safety
/// `value` must be non-null and point to a NUL-terminated string that stays
/// alive for `'a`.
pub(crate) unsafe fn borrow_name<'a>(value: *const c_char) -> &'a CStr {
    // Safety: upheld by the caller.
    unsafe { CStr::from_ptr(value) }
}

/// Borrows a caller's identifier, rejecting null.
///
/// A non-null `value` must still point to a NUL-terminated string that stays
/// alive for `'a`.
pub(crate) fn read_name<'a>(value: *const c_char) -> Result<&'a CStr, ForwardError> {
    if value.is_null() {
        return Err(ForwardError::NullName);
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    Ok(unsafe { CStr::from_ptr(value) })
}

/// Length of `name` in the callee's `int`, truncating like a C assignment from
/// `size_t`.
pub(crate) fn wrapping_len(name: &CStr) -> c_int {
    truncate_len(name.to_bytes().len())
}

/// Length of `name` in the callee's `int`, or an error when it does not fit.
pub(crate) fn checked_len(name: &CStr) -> Result<c_int, ForwardError> {
    fit_len(name.to_bytes().len())
}

fn truncate_len(len: usize) -> c_int {
    len as c_int
}

fn fit_len(len: usize) -> Result<c_int, ForwardError> {
    c_int::try_from(len).map_err(|_| ForwardError::NameTooLong(len))
}
