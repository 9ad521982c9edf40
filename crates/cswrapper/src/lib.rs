//! FMI 2.0 Co-Simulation entry points over a Model Exchange companion.
//!
//! Build this crate as `<id>_cs<ext>` and place it next to the Model
//! Exchange binary `<id><ext>`. Every `fmi2Component` this library hands out
//! is an adapter instance; calls on it are forwarded to the companion or
//! answered with `fmi2Error` when Co-Simulation has no Model Exchange
//! counterpart.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};

use cswrapper_core::dispatch;
use cswrapper_core::logging;
use cswrapper_core::prelude::*;
use once_cell::sync::Lazy;

type Binding = LibraryBinding<libloading::Library>;

static CONFIG: Lazy<WrapperConfig> = Lazy::new(|| {
    let config = WrapperConfig::from_env();
    tracing::debug!(?config, "Adapter configuration loaded");
    config
});

// ============================================================================
// Inquiry
// ============================================================================

#[no_mangle]
pub extern "C" fn fmi2GetTypesPlatform() -> *const c_char {
    dispatch::get_types_platform()
}

#[no_mangle]
pub extern "C" fn fmi2GetVersion() -> *const c_char {
    dispatch::get_version()
}

// ============================================================================
// Creation and destruction
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn fmi2Instantiate(
    instanceName: FmiString,
    fmuType: FmuType,
    fmuGUID: FmiString,
    fmuResourceLocation: FmiString,
    functions: *const CallbackFunctions,
    visible: Boolean,
    loggingOn: Boolean,
) -> Component {
    logging::init();

    let instantiator = Instantiator::new(
        ModuleLocator::new(fmi2Instantiate as *const c_void),
        NativeLoader,
        CONFIG.clone(),
    );
    let args = InstantiateArgs {
        instance_name: instanceName,
        fmu_type: fmuType,
        guid: fmuGUID,
        resource_location: fmuResourceLocation,
        functions,
        visible,
        logging_on: loggingOn,
    };

    unsafe { dispatch::instantiate(&instantiator, &args) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeInstance(c: Component) {
    unsafe { dispatch::free_instance::<Binding>(c) }
}

// ============================================================================
// Forwarded to the companion
// ============================================================================

#[no_mangle]
pub unsafe extern "C" fn fmi2SetDebugLogging(
    c: Component,
    loggingOn: Boolean,
    nCategories: usize,
    categories: *const FmiString,
) -> Status {
    unsafe { dispatch::set_debug_logging::<Binding>(c, loggingOn, nCategories, categories) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetupExperiment(
    c: Component,
    toleranceDefined: Boolean,
    tolerance: Real,
    startTime: Real,
    stopTimeDefined: Boolean,
    stopTime: Real,
) -> Status {
    unsafe {
        dispatch::setup_experiment::<Binding>(
            c,
            toleranceDefined,
            tolerance,
            startTime,
            stopTimeDefined,
            stopTime,
        )
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2EnterInitializationMode(c: Component) -> Status {
    unsafe { dispatch::enter_initialization_mode::<Binding>(c) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2ExitInitializationMode(c: Component) -> Status {
    unsafe { dispatch::exit_initialization_mode::<Binding>(c) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Terminate(c: Component) -> Status {
    unsafe { dispatch::terminate::<Binding>(c) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Reset(c: Component) -> Status {
    unsafe { dispatch::reset::<Binding>(c) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetReal(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Real,
) -> Status {
    unsafe { dispatch::get_real::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetInteger(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Integer,
) -> Status {
    unsafe { dispatch::get_integer::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetBoolean(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut Boolean,
) -> Status {
    unsafe { dispatch::get_boolean::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetString(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *mut FmiString,
) -> Status {
    unsafe { dispatch::get_string::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetReal(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Real,
) -> Status {
    unsafe { dispatch::set_real::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetInteger(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Integer,
) -> Status {
    unsafe { dispatch::set_integer::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetBoolean(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const Boolean,
) -> Status {
    unsafe { dispatch::set_boolean::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetString(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    value: *const FmiString,
) -> Status {
    unsafe { dispatch::set_string::<Binding>(c, vr, nvr, value) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetFMUstate(c: Component, FMUstate: *mut FmuState) -> Status {
    unsafe { dispatch::get_fmu_state::<Binding>(c, FMUstate) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetFMUstate(c: Component, FMUstate: FmuState) -> Status {
    unsafe { dispatch::set_fmu_state::<Binding>(c, FMUstate) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeFMUstate(c: Component, FMUstate: *mut FmuState) -> Status {
    unsafe { dispatch::free_fmu_state::<Binding>(c, FMUstate) }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetDirectionalDerivative(
    c: Component,
    vUnknown_ref: *const ValueReference,
    nUnknown: usize,
    vKnown_ref: *const ValueReference,
    nKnown: usize,
    dvKnown: *const Real,
    dvUnknown: *mut Real,
) -> Status {
    unsafe {
        dispatch::get_directional_derivative::<Binding>(
            c,
            vUnknown_ref,
            nUnknown,
            vKnown_ref,
            nKnown,
            dvKnown,
            dvUnknown,
        )
    }
}

// ============================================================================
// No Model Exchange counterpart
// ============================================================================

#[no_mangle]
pub extern "C" fn fmi2SerializedFMUstateSize(
    c: Component,
    FMUstate: FmuState,
    size: *mut usize,
) -> Status {
    dispatch::serialized_fmu_state_size(c, FMUstate, size)
}

#[no_mangle]
pub extern "C" fn fmi2SerializeFMUstate(
    c: Component,
    FMUstate: FmuState,
    serializedState: *mut Byte,
    size: usize,
) -> Status {
    dispatch::serialize_fmu_state(c, FMUstate, serializedState, size)
}

#[no_mangle]
pub extern "C" fn fmi2DeSerializeFMUstate(
    c: Component,
    serializedState: *const Byte,
    size: usize,
    FMUstate: *mut FmuState,
) -> Status {
    dispatch::deserialize_fmu_state(c, serializedState, size, FMUstate)
}

#[no_mangle]
pub extern "C" fn fmi2SetRealInputDerivatives(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    order: *const Integer,
    value: *const Real,
) -> Status {
    dispatch::set_real_input_derivatives(c, vr, nvr, order, value)
}

#[no_mangle]
pub extern "C" fn fmi2GetRealOutputDerivatives(
    c: Component,
    vr: *const ValueReference,
    nvr: usize,
    order: *const Integer,
    value: *mut Real,
) -> Status {
    dispatch::get_real_output_derivatives(c, vr, nvr, order, value)
}

#[no_mangle]
pub extern "C" fn fmi2DoStep(
    c: Component,
    currentCommunicationPoint: Real,
    communicationStepSize: Real,
    noSetFMUStatePriorToCurrentPoint: Boolean,
) -> Status {
    dispatch::do_step(
        c,
        currentCommunicationPoint,
        communicationStepSize,
        noSetFMUStatePriorToCurrentPoint,
    )
}

#[no_mangle]
pub extern "C" fn fmi2CancelStep(c: Component) -> Status {
    dispatch::cancel_step(c)
}

#[no_mangle]
pub extern "C" fn fmi2GetStatus(c: Component, s: StatusKind, value: *mut Status) -> Status {
    dispatch::get_status(c, s, value)
}

#[no_mangle]
pub extern "C" fn fmi2GetRealStatus(c: Component, s: StatusKind, value: *mut Real) -> Status {
    dispatch::get_real_status(c, s, value)
}

#[no_mangle]
pub extern "C" fn fmi2GetIntegerStatus(c: Component, s: StatusKind, value: *mut Integer) -> Status {
    dispatch::get_integer_status(c, s, value)
}

#[no_mangle]
pub extern "C" fn fmi2GetBooleanStatus(c: Component, s: StatusKind, value: *mut Boolean) -> Status {
    dispatch::get_boolean_status(c, s, value)
}

#[no_mangle]
pub extern "C" fn fmi2GetStringStatus(c: Component, s: StatusKind, value: *mut FmiString) -> Status {
    dispatch::get_string_status(c, s, value)
}
