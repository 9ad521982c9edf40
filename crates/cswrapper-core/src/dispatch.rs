//! The Co-Simulation surface, one function per `fmi2*` entry point.
//!
//! Handles arrive as opaque `fmi2Component`s created by [`instantiate`].
//! A null handle is rejected with `fmi2Error` before anything else happens.
//! Operations the companion implements are forwarded with the same
//! arguments and their status returned unchanged. Co-Simulation operations
//! with no Model Exchange counterpart always return `fmi2Error`.

use std::ffi::c_char;

use crate::binding::ModelExchange;
use crate::error::WrapperError;
use crate::instance::Instance;
use crate::instantiate::{InstantiateArgs, Instantiator};
use crate::library::LibraryLoader;
use crate::location::LocationResolver;
use crate::logging::FmiLogger;
use crate::types::{
    Boolean, Byte, Component, FmiString, FmuState, Integer, Real, Status, StatusKind,
    ValueReference, FMI_VERSION, TYPES_PLATFORM,
};

/// Run `call` against the instance behind `handle`, or reject a null handle.
///
/// # Safety
/// `handle` must be null or a live handle for an `Instance<B>`.
#[inline]
unsafe fn forward<B, F>(handle: Component, operation: &'static str, call: F) -> Status
where
    B: ModelExchange,
    F: FnOnce(&B, Component) -> Status,
{
    // SAFETY: upheld by the caller.
    match unsafe { Instance::<B>::from_handle(handle) } {
        Some(instance) => {
            let status = call(instance.binding(), instance.component());
            if status.is_ok() {
                tracing::trace!(instance = %instance.name(), operation, "Forwarded");
            } else {
                let error = WrapperError::NativeFailure(status);
                tracing::debug!(instance = %instance.name(), operation, %error, "Forwarded");
            }
            status
        }
        None => reject(WrapperError::NullHandle(operation)),
    }
}

fn reject(error: WrapperError) -> Status {
    tracing::debug!(%error, "Rejected call");
    error.status()
}

fn unsupported(operation: &'static str) -> Status {
    reject(WrapperError::UnsupportedOperation(operation))
}

// ============================================================================
// Inquiry
// ============================================================================

pub fn get_types_platform() -> *const c_char {
    TYPES_PLATFORM.as_ptr()
}

pub fn get_version() -> *const c_char {
    FMI_VERSION.as_ptr()
}

// ============================================================================
// Creation and destruction
// ============================================================================

/// Create an instance and return its opaque handle, or null on failure.
///
/// Failures are reported to the host's logger callback, if any.
///
/// # Safety
/// The pointers in `args` must satisfy the `fmi2Instantiate` contract.
pub unsafe fn instantiate<R, L>(instantiator: &Instantiator<R, L>, args: &InstantiateArgs) -> Component
where
    R: LocationResolver,
    L: LibraryLoader,
{
    // SAFETY: upheld by the caller.
    let logger = unsafe { FmiLogger::new(args.functions, args.instance_name) };

    match unsafe { instantiator.instantiate(args) } {
        Ok(instance) => {
            tracing::info!(instance = %instance.name(), "Instantiated companion as Model Exchange");
            instance.into_handle()
        }
        Err(e) => {
            tracing::error!(instance = %logger.instance_name(), error = %e, "Instantiation failed");
            logger.error(&e.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Free the companion component, close the library and release the record.
///
/// # Safety
/// `handle` must be null or a live handle for an `Instance<B>`; it is
/// invalid afterwards.
pub unsafe fn free_instance<B: ModelExchange>(handle: Component) {
    // SAFETY: upheld by the caller.
    if let Some(instance) = unsafe { Instance::<B>::release(handle) } {
        tracing::info!(instance = %instance.name(), "Freeing instance");
        drop(instance);
    }
}

// ============================================================================
// Forwarded operations
// ============================================================================

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle; other pointers as
/// for `fmi2SetDebugLogging`.
pub unsafe fn set_debug_logging<B: ModelExchange>(
    handle: Component,
    logging_on: Boolean,
    n_categories: usize,
    categories: *const FmiString,
) -> Status {
    unsafe {
        forward::<B, _>(handle, "fmi2SetDebugLogging", |b, c| {
            b.set_debug_logging(c, logging_on, n_categories, categories)
        })
    }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn setup_experiment<B: ModelExchange>(
    handle: Component,
    tolerance_defined: Boolean,
    tolerance: Real,
    start_time: Real,
    stop_time_defined: Boolean,
    stop_time: Real,
) -> Status {
    unsafe {
        forward::<B, _>(handle, "fmi2SetupExperiment", |b, c| {
            b.setup_experiment(
                c,
                tolerance_defined,
                tolerance,
                start_time,
                stop_time_defined,
                stop_time,
            )
        })
    }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn enter_initialization_mode<B: ModelExchange>(handle: Component) -> Status {
    unsafe {
        forward::<B, _>(handle, "fmi2EnterInitializationMode", |b, c| {
            b.enter_initialization_mode(c)
        })
    }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn exit_initialization_mode<B: ModelExchange>(handle: Component) -> Status {
    unsafe {
        forward::<B, _>(handle, "fmi2ExitInitializationMode", |b, c| {
            b.exit_initialization_mode(c)
        })
    }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn terminate<B: ModelExchange>(handle: Component) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2Terminate", |b, c| b.terminate(c)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn reset<B: ModelExchange>(handle: Component) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2Reset", |b, c| b.reset(c)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle; `vr` and `value`
/// must be valid for `nvr` elements.
pub unsafe fn get_real<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Real,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2GetReal", |b, c| b.get_real(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn get_integer<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Integer,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2GetInteger", |b, c| b.get_integer(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn get_boolean<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Boolean,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2GetBoolean", |b, c| b.get_boolean(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn get_string<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut FmiString,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2GetString", |b, c| b.get_string(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn set_real<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Real,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2SetReal", |b, c| b.set_real(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn set_integer<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Integer,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2SetInteger", |b, c| b.set_integer(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn set_boolean<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Boolean,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2SetBoolean", |b, c| b.set_boolean(c, vr, nvr, value)) }
}

/// # Safety
/// As for [`get_real`].
pub unsafe fn set_string<B: ModelExchange>(
    handle: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const FmiString,
) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2SetString", |b, c| b.set_string(c, vr, nvr, value)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn get_fmu_state<B: ModelExchange>(handle: Component, state: *mut FmuState) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2GetFMUstate", |b, c| b.get_fmu_state(c, state)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn set_fmu_state<B: ModelExchange>(handle: Component, state: FmuState) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2SetFMUstate", |b, c| b.set_fmu_state(c, state)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle.
pub unsafe fn free_fmu_state<B: ModelExchange>(handle: Component, state: *mut FmuState) -> Status {
    unsafe { forward::<B, _>(handle, "fmi2FreeFMUstate", |b, c| b.free_fmu_state(c, state)) }
}

/// # Safety
/// `handle` must be null or a live `Instance<B>` handle; arrays must be
/// valid for the lengths given.
pub unsafe fn get_directional_derivative<B: ModelExchange>(
    handle: Component,
    unknown_refs: *const ValueReference,
    n_unknown: usize,
    known_refs: *const ValueReference,
    n_known: usize,
    dv_known: *const Real,
    dv_unknown: *mut Real,
) -> Status {
    unsafe {
        forward::<B, _>(handle, "fmi2GetDirectionalDerivative", |b, c| {
            b.get_directional_derivative(
                c,
                unknown_refs,
                n_unknown,
                known_refs,
                n_known,
                dv_known,
                dv_unknown,
            )
        })
    }
}

// ============================================================================
// Unsupported: no Model Exchange counterpart
// ============================================================================

pub fn serialized_fmu_state_size(_c: Component, _state: FmuState, _size: *mut usize) -> Status {
    unsupported("fmi2SerializedFMUstateSize")
}

pub fn serialize_fmu_state(
    _c: Component,
    _state: FmuState,
    _serialized: *mut Byte,
    _size: usize,
) -> Status {
    unsupported("fmi2SerializeFMUstate")
}

pub fn deserialize_fmu_state(
    _c: Component,
    _serialized: *const Byte,
    _size: usize,
    _state: *mut FmuState,
) -> Status {
    unsupported("fmi2DeSerializeFMUstate")
}

pub fn set_real_input_derivatives(
    _c: Component,
    _vr: *const ValueReference,
    _nvr: usize,
    _order: *const Integer,
    _value: *const Real,
) -> Status {
    unsupported("fmi2SetRealInputDerivatives")
}

pub fn get_real_output_derivatives(
    _c: Component,
    _vr: *const ValueReference,
    _nvr: usize,
    _order: *const Integer,
    _value: *mut Real,
) -> Status {
    unsupported("fmi2GetRealOutputDerivatives")
}

pub fn do_step(
    _c: Component,
    _current_communication_point: Real,
    _communication_step_size: Real,
    _no_set_fmu_state_prior_to_current_point: Boolean,
) -> Status {
    unsupported("fmi2DoStep")
}

pub fn cancel_step(_c: Component) -> Status {
    unsupported("fmi2CancelStep")
}

pub fn get_status(_c: Component, _kind: StatusKind, _value: *mut Status) -> Status {
    unsupported("fmi2GetStatus")
}

pub fn get_real_status(_c: Component, _kind: StatusKind, _value: *mut Real) -> Status {
    unsupported("fmi2GetRealStatus")
}

pub fn get_integer_status(_c: Component, _kind: StatusKind, _value: *mut Integer) -> Status {
    unsupported("fmi2GetIntegerStatus")
}

pub fn get_boolean_status(_c: Component, _kind: StatusKind, _value: *mut Boolean) -> Status {
    unsupported("fmi2GetBooleanStatus")
}

pub fn get_string_status(_c: Component, _kind: StatusKind, _value: *mut FmiString) -> Status {
    unsupported("fmi2GetStringStatus")
}
