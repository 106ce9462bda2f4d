//! Resolution of the external routines the adapter forwards to.
//!
//! Runtime registrations win. Without one, the `link-callee` build (the
//! default) falls back to the `enter_exit_c` / `set_diagnostics_level_c`
//! symbols; otherwise the routine is unbound.

use std::mem;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use log::debug;

use crate::LOG_TARGET;

/// Entry/exit routine: identifier, its length and the place code, all by address.
pub type EnterExitFn =
    unsafe extern "C" fn(sub_name: *const c_char, sub_name_len: *mut c_int, place: *mut c_int);

/// Level routine: the level by address.
pub type SetLevelFn = unsafe extern "C" fn(level: *mut c_int);

/// Nullable entry/exit routine as seen from C.
#[allow(non_camel_case_types)]
pub type diag_enter_exit_fn = Option<EnterExitFn>;

/// Nullable level routine as seen from C.
#[allow(non_camel_case_types)]
pub type diag_set_level_fn = Option<SetLevelFn>;

#[cfg(feature = "link-callee")]
unsafe extern "C" {
    fn enter_exit_c(sub_name: *const c_char, sub_name_len: *mut c_int, place: *mut c_int);
    fn set_diagnostics_level_c(level: *mut c_int);
}

static ENTER_EXIT: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());
static SET_LEVEL: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Routines registered from Rust. `None` leaves a slot unregistered.
#[derive(Clone, Copy, Debug, Default)]
pub struct Callees {
    pub enter_exit: Option<EnterExitFn>,
    pub set_level: Option<SetLevelFn>,
}

/// Registers both routines, replacing earlier registrations.
///
/// The routines are called with pointers to live, initialized values and must
/// not retain them past the call.
pub fn bind(callees: Callees) {
    store_enter_exit(callees.enter_exit);
    store_set_level(callees.set_level);
}

/// Drops every runtime registration.
pub fn unbind() {
    bind(Callees::default());
}

/// True when both routines resolve, through registration or linking.
pub fn is_bound() -> bool {
    enter_exit_callee().is_some() && set_level_callee().is_some()
}

fn store_enter_exit(callee: Option<EnterExitFn>) {
    let raw = callee.map_or(ptr::null_mut(), |f| f as *mut ());
    ENTER_EXIT.store(raw, Ordering::Release);
    debug!(target: LOG_TARGET, "enter_exit callee {}", describe(raw));
}

fn store_set_level(callee: Option<SetLevelFn>) {
    let raw = callee.map_or(ptr::null_mut(), |f| f as *mut ());
    SET_LEVEL.store(raw, Ordering::Release);
    debug!(target: LOG_TARGET, "set_diagnostics_level callee {}", describe(raw));
}

fn describe(raw: *mut ()) -> &'static str {
    if raw.is_null() { "unregistered" } else { "registered" }
}

pub(crate) fn enter_exit_callee() -> Option<EnterExitFn> {
    let raw = ENTER_EXIT.load(Ordering::Acquire);
    if raw.is_null() {
        return linked_enter_exit();
    }
    // Safety: only `store_enter_exit` writes non-null values, and those came
    // from an `EnterExitFn`.
    Some(unsafe { mem::transmute::<*mut (), EnterExitFn>(raw) })
}

pub(crate) fn set_level_callee() -> Option<SetLevelFn> {
    let raw = SET_LEVEL.load(Ordering::Acquire);
    if raw.is_null() {
        return linked_set_level();
    }
    // Safety: only `store_set_level` writes non-null values, and those came
    // from a `SetLevelFn`.
    Some(unsafe { mem::transmute::<*mut (), SetLevelFn>(raw) })
}

#[cfg(feature = "link-callee")]
fn linked_enter_exit() -> Option<EnterExitFn> {
    Some(enter_exit_c)
}

#[cfg(not(feature = "link-callee"))]
fn linked_enter_exit() -> Option<EnterExitFn> {
    None
}

#[cfg(feature = "link-callee")]
fn linked_set_level() -> Option<SetLevelFn> {
    Some(set_diagnostics_level_c)
}

#[cfg(not(feature = "link-callee"))]
fn linked_set_level() -> Option<SetLevelFn> {
    None
}

/// Registers the entry/exit routine. Null unregisters it.
#[unsafe(no_mangle)]
pub extern "C" fn diag_bind_enter_exit(callee: diag_enter_exit_fn) {
    store_enter_exit(callee);
}

/// Registers the level routine. Null unregisters it.
#[unsafe(no_mangle)]
pub extern "C" fn diag_bind_set_level(callee: diag_set_level_fn) {
    store_set_level(callee);
}

/// Returns true when both routines resolve.
#[unsafe(no_mangle)]
pub extern "C" fn diag_is_bound() -> bool {
    is_bound()
}
