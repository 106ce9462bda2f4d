#![cfg(feature = "link-callee")]

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::Mutex;

use diagnostics::{
    diag_bind_enter_exit, diag_bind_set_level, diag_error_t, diag_is_bound, enter_exit,
    enter_exit_checked, set_diagnostics_level, set_diagnostics_level_checked,
};

static TEST_LOCK: Mutex<()> = Mutex::new(());

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Linked { name_ptr: usize, name: String, len: c_int, place: c_int },
    LinkedLevel(c_int),
    Registered { name: String, place: c_int },
    RegisteredLevel(c_int),
}

static CALLS: Mutex<Vec<Call>> = Mutex::new(Vec::new());

fn push(call: Call) {
    CALLS.lock().unwrap_or_else(|err| err.into_inner()).push(call);
}

fn take_calls() -> Vec<Call> {
    std::mem::take(&mut *CALLS.lock().unwrap_or_else(|err| err.into_inner()))
}

#[unsafe(no_mangle)]
unsafe extern "C" fn enter_exit_c(
    sub_name: *const c_char,
    sub_name_len: *mut c_int,
    place: *mut c_int,
) {
    // SAFETY: the adapter passes a live identifier and live int locals.
    let (name, len, place) = unsafe { (CStr::from_ptr(sub_name), *sub_name_len, *place) };
    push(Call::Linked {
        name_ptr: sub_name as usize,
        name: name.to_string_lossy().into_owned(),
        len,
        place,
    });
}

#[unsafe(no_mangle)]
unsafe extern "C" fn set_diagnostics_level_c(level: *mut c_int) {
    // SAFETY: the adapter passes a live int local.
    push(Call::LinkedLevel(unsafe { *level }));
}

unsafe extern "C" fn registered_enter_exit(
    sub_name: *const c_char,
    _sub_name_len: *mut c_int,
    place: *mut c_int,
) {
    // SAFETY: the adapter passes a live identifier and a live int local.
    let (name, place) = unsafe { (CStr::from_ptr(sub_name), *place) };
    push(Call::Registered {
        name: name.to_string_lossy().into_owned(),
        place,
    });
}

unsafe extern "C" fn registered_set_level(level: *mut c_int) {
    // SAFETY: the adapter passes a live int local.
    push(Call::RegisteredLevel(unsafe { *level }));
}

fn lock_unregistered() -> std::sync::MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    diag_bind_enter_exit(None);
    diag_bind_set_level(None);
    take_calls();
    guard
}

#[test]
fn linked_symbols_make_the_shim_bound() {
    let _guard = lock_unregistered();
    assert!(diag_is_bound());
}

#[test]
fn init_reaches_linked_enter_exit_by_address() {
    let _guard = lock_unregistered();

    let name = c"init";
    unsafe { enter_exit(name.as_ptr(), 1) };

    assert_eq!(
        take_calls(),
        vec![Call::Linked {
            name_ptr: name.as_ptr() as usize,
            name: "init".to_string(),
            len: 4,
            place: 1,
        }]
    );
}

#[test]
fn level_three_reaches_linked_set_level() {
    let _guard = lock_unregistered();

    set_diagnostics_level(3);

    assert_eq!(take_calls(), vec![Call::LinkedLevel(3)]);
}

#[test]
fn checked_variants_use_linked_symbols() {
    let _guard = lock_unregistered();

    let mut error: *mut diag_error_t = ptr::null_mut();
    assert!(enter_exit_checked(c"".as_ptr(), -4, &mut error));
    assert!(set_diagnostics_level_checked(c_int::MAX, &mut error));
    assert!(error.is_null());

    let calls = take_calls();
    assert!(matches!(calls[0], Call::Linked { len: 0, place: -4, .. }));
    assert_eq!(calls[1], Call::LinkedLevel(c_int::MAX));
}

#[test]
fn registration_takes_precedence_until_removed() {
    let _guard = lock_unregistered();

    diag_bind_enter_exit(Some(registered_enter_exit));
    diag_bind_set_level(Some(registered_set_level));
    unsafe { enter_exit(c"init".as_ptr(), 1) };
    set_diagnostics_level(3);
    assert_eq!(
        take_calls(),
        vec![
            Call::Registered { name: "init".to_string(), place: 1 },
            Call::RegisteredLevel(3),
        ]
    );

    diag_bind_enter_exit(None);
    unsafe { enter_exit(c"init".as_ptr(), 2) };
    set_diagnostics_level(4);
    let calls = take_calls();
    assert!(matches!(calls[0], Call::Linked { len: 4, place: 2, .. }));
    assert_eq!(calls[1], Call::RegisteredLevel(4));

    diag_bind_set_level(None);
    set_diagnostics_level(5);
    assert_eq!(take_calls(), vec![Call::LinkedLevel(5)]);
}
