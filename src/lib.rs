//! C FFI entry points for diagnostics call tracing and level control.

mod callee;
mod diagnostics;
mod error;
mod ffi;
mod logging;

pub use callee::{
    Callees, EnterExitFn, SetLevelFn, bind, diag_bind_enter_exit, diag_bind_set_level,
    diag_enter_exit_fn, diag_is_bound, diag_set_level_fn, is_bound, unbind,
};
pub use diagnostics::{
    enter_exit, enter_exit_checked, enter_exit_name, set_diagnostics_level,
    set_diagnostics_level_checked, set_level,
};
pub use error::{ForwardError, diag_error_free, diag_error_message, diag_error_t};
pub use logging::{
    diag_log_callback_t, diag_log_config_init, diag_log_config_t, diag_log_init,
    diag_log_level_t, diag_log_record_t,
};

/// Log target for every record emitted by the bindings.
pub const LOG_TARGET: &str = "diagnostics";
