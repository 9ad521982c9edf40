//! FMI 2.0 ABI types shared by the adapter surface and the companion binding.
//!
//! Enumerations that cross the C boundary (`fmi2Status`, `fmi2Type`,
//! `fmi2StatusKind`) are C `int`s. They are modelled as transparent newtypes
//! rather than Rust enums so that any value a host or companion hands us is
//! representable and can be passed through unchanged.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::fmt;

pub type Component = *mut c_void;
pub type ComponentEnvironment = *mut c_void;
pub type FmuState = *mut c_void;
pub type ValueReference = c_uint;
pub type Real = f64;
pub type Integer = c_int;
pub type Boolean = c_int;
pub type FmiString = *const c_char;
pub type Byte = c_char;

pub const FMI_TRUE: Boolean = 1;
pub const FMI_FALSE: Boolean = 0;

/// Value returned by `fmi2GetTypesPlatform`.
pub const TYPES_PLATFORM: &CStr = c"default";

/// Value returned by `fmi2GetVersion`, and the version a companion must report.
pub const FMI_VERSION: &CStr = c"2.0";

/// `fmi2Status`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub c_int);

impl Status {
    pub const OK: Status = Status(0);
    pub const WARNING: Status = Status(1);
    pub const DISCARD: Status = Status(2);
    pub const ERROR: Status = Status(3);
    pub const FATAL: Status = Status(4);
    pub const PENDING: Status = Status(5);

    pub fn is_ok(self) -> bool {
        self == Status::OK
    }

    pub fn as_str(self) -> &'static str {
        match self.0 {
            0 => "fmi2OK",
            1 => "fmi2Warning",
            2 => "fmi2Discard",
            3 => "fmi2Error",
            4 => "fmi2Fatal",
            5 => "fmi2Pending",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `fmi2Type`: which calling convention an instance is created for.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FmuType(pub c_int);

impl FmuType {
    /// Derivative-polling convention; the one the companion implements.
    pub const MODEL_EXCHANGE: FmuType = FmuType(0);
    /// Self-stepping convention; the one this adapter advertises.
    pub const CO_SIMULATION: FmuType = FmuType(1);

    pub fn as_str(self) -> &'static str {
        match self.0 {
            0 => "fmi2ModelExchange",
            1 => "fmi2CoSimulation",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for FmuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.0)
    }
}

impl fmt::Display for FmuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `fmi2StatusKind`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusKind(pub c_int);

impl StatusKind {
    pub const DO_STEP_STATUS: StatusKind = StatusKind(0);
    pub const PENDING_STATUS: StatusKind = StatusKind(1);
    pub const LAST_SUCCESSFUL_TIME: StatusKind = StatusKind(2);
    pub const TERMINATED: StatusKind = StatusKind(3);
}

/// `fmi2CallbackLogger`. Variadic: the message is a printf-style format.
pub type CallbackLogger = Option<
    unsafe extern "C" fn(
        ComponentEnvironment,
        FmiString,
        Status,
        FmiString,
        FmiString,
        ...
    )
>;
pub type CallbackAllocateMemory = Option<unsafe extern "C" fn(usize, usize) -> *mut c_void>;
pub type CallbackFreeMemory = Option<unsafe extern "C" fn(*mut c_void)>;
pub type StepFinished = Option<unsafe extern "C" fn(ComponentEnvironment, Status)>;

/// `fmi2CallbackFunctions`, passed through to the companion untouched.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CallbackFunctions {
    pub logger: CallbackLogger,
    pub allocate_memory: CallbackAllocateMemory,
    pub free_memory: CallbackFreeMemory,
    pub step_finished: StepFinished,
    pub component_environment: ComponentEnvironment,
}

/// Copy a possibly-null FMI string into an owned `String`.
///
/// # Safety
/// A non-null `s` must point to a NUL-terminated string.
pub unsafe fn string_lossy(s: FmiString) -> String {
    if s.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
}
