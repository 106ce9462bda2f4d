//! C entry points for diagnostics enter/exit notification and level control.
//!
//! Both operations re-pass their arguments by address to the bound callee.
//! The identifier's length is always recomputed from its terminator.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use log::{trace, warn};

use crate::LOG_TARGET;
use crate::callee::{EnterExitFn, SetLevelFn, enter_exit_callee, set_level_callee};
use crate::error::{ForwardError, diag_error_t, report};
use crate::ffi::{borrow_name, checked_len, read_name, wrapping_len};

fn forward_enter_exit(callee: EnterExitFn, name: &CStr, len: c_int, place: c_int) {
    let mut sub_name_len = len;
    let mut place = place;
    trace!(target: LOG_TARGET, "enter_exit {name:?} len={sub_name_len} place={place}");
    // Safety: both locals and `name` outlive the call.
    unsafe { callee(name.as_ptr(), &mut sub_name_len, &mut place) };
}

fn forward_set_level(callee: SetLevelFn, level: c_int) {
    let mut level = level;
    trace!(target: LOG_TARGET, "set_diagnostics_level level={level}");
    // Safety: the local outlives the call.
    unsafe { callee(&mut level) };
}

/// Forwards an enter/exit notification for `name`.
///
/// Fails when the length does not fit the callee's `int` or no routine is bound.
pub fn enter_exit_name(name: &CStr, place: c_int) -> Result<(), ForwardError> {
    let len = checked_len(name)?;
    let callee = enter_exit_callee().ok_or(ForwardError::Unbound("enter_exit"))?;
    forward_enter_exit(callee, name, len, place);
    Ok(())
}

/// Forwards a diagnostics level. Range checks belong to the callee.
pub fn set_level(level: c_int) -> Result<(), ForwardError> {
    let callee = set_level_callee().ok_or(ForwardError::Unbound("set_diagnostics_level"))?;
    forward_set_level(callee, level);
    Ok(())
}

/// Notifies the diagnostics routine that `sub_name` was entered or exited.
///
/// `place` is passed through untouched. Nothing is validated. With no
/// registered routine the call goes to `enter_exit_c`, or is dropped in a
/// build without `link-callee`.
///
/// # Safety
/// `sub_name` must be non-null and point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn enter_exit(sub_name: *const c_char, place: c_int) {
    // Safety: upheld by the caller.
    let name = unsafe { borrow_name(sub_name) };
    let len = wrapping_len(name);
    match enter_exit_callee() {
        Some(callee) => forward_enter_exit(callee, name, len, place),
        None => warn!(target: LOG_TARGET, "enter_exit {name:?} dropped: no callee bound"),
    }
}

/// Sets the process-wide diagnostics level. The value is not validated.
#[unsafe(no_mangle)]
pub extern "C" fn set_diagnostics_level(level: c_int) {
    match set_level_callee() {
        Some(callee) => forward_set_level(callee, level),
        None => warn!(target: LOG_TARGET, "set_diagnostics_level {level} dropped: no callee bound"),
    }
}

/// Checked form of `enter_exit`.
///
/// Returns false and sets `out_error` when `sub_name` is null, too long for an
/// `int`, or no routine is bound. A non-null `sub_name` must still be
/// NUL-terminated.
#[unsafe(no_mangle)]
pub extern "C" fn enter_exit_checked(
    sub_name: *const c_char,
    place: c_int,
    out_error: *mut *mut diag_error_t,
) -> bool {
    let result = read_name(sub_name).and_then(|name| enter_exit_name(name, place));
    report(out_error, result)
}

/// Checked form of `set_diagnostics_level`.
///
/// Returns false and sets `out_error` when no routine is bound.
#[unsafe(no_mangle)]
pub extern "C" fn set_diagnostics_level_checked(
    level: c_int,
    out_error: *mut *mut diag_error_t,
) -> bool {
    report(out_error, set_level(level))
}
