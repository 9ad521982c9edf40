//! Diagnostics: the process-wide `tracing` subscriber and the FMI logger callback.

use std::ffi::{CStr, CString};

use once_cell::sync::OnceCell;

use crate::config::env_vars;
use crate::types::{string_lossy, CallbackFunctions, FmiString, Status};

static SUBSCRIBER: OnceCell<bool> = OnceCell::new();

/// Install a stderr `tracing` subscriber if `CSWRAPPER_LOG` is set.
///
/// Runs at most once per process. Returns whether this adapter's subscriber
/// is active; a host that already installed its own keeps it.
pub fn init() -> bool {
    *SUBSCRIBER.get_or_init(|| {
        let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env(env_vars::LOG) else {
            return false;
        };

        let json = std::env::var(env_vars::LOG_JSON)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let result = if json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_thread_ids(false)
                .compact()
                .with_writer(std::io::stderr)
                .try_init()
        };

        result.is_ok()
    })
}

/// The caller-supplied `fmi2CallbackFunctions`, used for creation diagnostics.
#[derive(Clone, Copy)]
pub struct FmiLogger<'a> {
    functions: Option<&'a CallbackFunctions>,
    instance_name: FmiString,
}

impl<'a> FmiLogger<'a> {
    /// # Safety
    /// `functions` must be null or point to a valid `fmi2CallbackFunctions`
    /// that outlives the returned logger.
    pub unsafe fn new(functions: *const CallbackFunctions, instance_name: FmiString) -> Self {
        Self {
            // SAFETY: caller guarantees the pointer is null or valid.
            functions: unsafe { functions.as_ref() },
            instance_name,
        }
    }

    /// The instance name as text, for `tracing` fields.
    pub fn instance_name(&self) -> String {
        // SAFETY: FMI strings are NUL-terminated when non-null.
        unsafe { string_lossy(self.instance_name) }
    }

    /// Send `message` to the host logger with category `logError`.
    pub fn error(&self, message: &str) {
        self.log(Status::ERROR, c"logError", message);
    }

    pub fn log(&self, status: Status, category: &CStr, message: &str) {
        let Some(functions) = self.functions else {
            return;
        };
        let Some(logger) = functions.logger else {
            return;
        };

        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();

        // SAFETY: the logger is a host callback with the fmi2CallbackLogger
        // signature; the message goes through "%s" so it is never parsed as
        // a format string.
        unsafe {
            logger(
                functions.component_environment,
                self.instance_name,
                status,
                category.as_ptr(),
                c"%s".as_ptr(),
                message.as_ptr(),
            );
        }
    }
}
