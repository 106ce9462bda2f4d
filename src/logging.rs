//! Logging configuration for the diagnostics bindings.

use std::os::raw::{c_char, c_void};
use std::sync::RwLock;

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::{Lazy, OnceCell};

use crate::error::{clear_error, cstring_from_str_lossy, diag_error_t, write_error};

/// Environment variable consulted when `diag_log_init` gets no config.
const LOG_ENV: &str = "DIAGNOSTICS_LOG";

/// Whether `log::set_logger` accepted our logger; decided once per process.
static INSTALLED: OnceCell<bool> = OnceCell::new();
static DIAG_LOGGER: Lazy<DiagLogger> = Lazy::new(DiagLogger::new);

/// Log level values for the bindings' own records.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum diag_log_level_t {
    DIAG_LOG_LEVEL_OFF = 0,
    DIAG_LOG_LEVEL_ERROR = 1,
    DIAG_LOG_LEVEL_WARN = 2,
    DIAG_LOG_LEVEL_INFO = 3,
    DIAG_LOG_LEVEL_DEBUG = 4,
    DIAG_LOG_LEVEL_TRACE = 5,
}

impl From<diag_log_level_t> for LevelFilter {
    fn from(value: diag_log_level_t) -> Self {
        match value {
            diag_log_level_t::DIAG_LOG_LEVEL_OFF => LevelFilter::Off,
            diag_log_level_t::DIAG_LOG_LEVEL_ERROR => LevelFilter::Error,
            diag_log_level_t::DIAG_LOG_LEVEL_WARN => LevelFilter::Warn,
            diag_log_level_t::DIAG_LOG_LEVEL_INFO => LevelFilter::Info,
            diag_log_level_t::DIAG_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            diag_log_level_t::DIAG_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for diag_log_level_t {
    fn from(value: Level) -> Self {
        match value {
            Level::Error => diag_log_level_t::DIAG_LOG_LEVEL_ERROR,
            Level::Warn => diag_log_level_t::DIAG_LOG_LEVEL_WARN,
            Level::Info => diag_log_level_t::DIAG_LOG_LEVEL_INFO,
            Level::Debug => diag_log_level_t::DIAG_LOG_LEVEL_DEBUG,
            Level::Trace => diag_log_level_t::DIAG_LOG_LEVEL_TRACE,
        }
    }
}

/// Log record delivered to a C callback.
///
/// String pointers are only valid for the duration of the callback.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct diag_log_record_t {
    pub level: diag_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
}

/// Callback invoked for each enabled record, from whichever thread logged it.
#[allow(non_camel_case_types)]
pub type diag_log_callback_t =
    Option<extern "C" fn(record: *const diag_log_record_t, user_data: *mut c_void)>;

/// Logging configuration.
///
/// If `callback` is null, records are written to stderr. Otherwise they are
/// delivered to the callback with `user_data` forwarded unchanged.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct diag_log_config_t {
    pub level: diag_log_level_t,
    pub callback: diag_log_callback_t,
    pub user_data: *mut c_void,
}

/// Where enabled records go, and from which level on.
#[derive(Clone, Copy)]
struct Sink {
    level: LevelFilter,
    callback: diag_log_callback_t,
    user_data: usize,
}

impl Sink {
    fn from_config(level: LevelFilter, config: Option<&diag_log_config_t>) -> Self {
        Self {
            level,
            callback: config.and_then(|config| config.callback),
            user_data: config.map_or(0, |config| config.user_data as usize),
        }
    }

    fn emit(&self, record: &Record) {
        let Some(callback) = self.callback else {
            eprintln!("{} {}: {}", record.level(), record.target(), record.args());
            return;
        };
        let target = cstring_from_str_lossy(record.target());
        let message = cstring_from_str_lossy(&record.args().to_string());
        let entry = diag_log_record_t {
            level: record.level().into(),
            target: target.as_ptr(),
            message: message.as_ptr(),
        };
        callback(&entry, self.user_data as *mut c_void);
    }
}

struct DiagLogger {
    sink: RwLock<Sink>,
}

impl DiagLogger {
    fn new() -> Self {
        Self {
            sink: RwLock::new(Sink::from_config(LevelFilter::Warn, None)),
        }
    }

    fn replace(&self, sink: Sink) {
        *self.sink.write().unwrap_or_else(|err| err.into_inner()) = sink;
    }
}

impl Log for DiagLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
        metadata.level() <= sink.level
    }

    fn log(&self, record: &Record) {
        // Copied out so a callback may reconfigure logging.
        let sink = *self.sink.read().unwrap_or_else(|err| err.into_inner());
        if record.level() <= sink.level {
            sink.emit(record);
        }
    }

    fn flush(&self) {}
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

fn resolve_level(
    config: Option<&diag_log_config_t>,
    env_value: Option<String>,
) -> Result<LevelFilter, String> {
    if let Some(config) = config {
        return Ok(config.level.into());
    }
    match env_value {
        Some(value) => {
            parse_level(&value).ok_or_else(|| format!("invalid {LOG_ENV} value `{value}`"))
        }
        None => Ok(LevelFilter::Warn),
    }
}

fn install_logger() -> Result<(), String> {
    let installed = *INSTALLED.get_or_init(|| log::set_logger(&*DIAG_LOGGER).is_ok());
    if installed {
        Ok(())
    } else {
        Err("logging already initialized by another logger".to_string())
    }
}

/// Fills `config` with defaults: WARN level, no callback.
#[unsafe(no_mangle)]
pub extern "C" fn diag_log_config_init(config: *mut diag_log_config_t) {
    if config.is_null() {
        return;
    }
    // Safety: caller provided a writable config pointer.
    unsafe {
        *config = diag_log_config_t {
            level: diag_log_level_t::DIAG_LOG_LEVEL_WARN,
            callback: None,
            user_data: std::ptr::null_mut(),
        };
    }
}

/// Installs the bindings' logger, or reconfigures it on later calls.
///
/// With a null `config`, the level comes from `DIAGNOSTICS_LOG` when set and
/// defaults to WARN otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn diag_log_init(
    config: *const diag_log_config_t,
    out_error: *mut *mut diag_error_t,
) -> bool {
    clear_error(out_error);

    // Safety: a non-null config must point to a valid diag_log_config_t.
    let config = unsafe { config.as_ref() };
    let level = resolve_level(config, std::env::var(LOG_ENV).ok())
        .and_then(|level| install_logger().map(|()| level));
    match level {
        Ok(level) => {
            DIAG_LOGGER.replace(Sink::from_config(level, config));
            log::set_max_level(level);
            true
        }
        Err(message) => {
            write_error(out_error, message);
            false
        }
    }
}
