//! Binding the companion's Model Exchange entry points.
//!
//! [`FunctionTable`] holds one typed function pointer per entry point the
//! adapter forwards to. It can only be built when every one of them
//! resolves, so a bound companion never has a missing entry.
//! [`LibraryBinding`] pairs the table with the library it was resolved from
//! and exposes it through the [`ModelExchange`] trait.

use std::ffi::{c_char, c_void, CStr};
use std::fmt;

use crate::error::{Result, WrapperError};
use crate::library::SymbolSource;
use crate::types::{
    Boolean, CallbackFunctions, Component, FmiString, FmuState, FmuType, Integer, Real, Status,
    ValueReference, FMI_VERSION,
};

pub type InstantiateFn = unsafe extern "C" fn(
    FmiString,
    FmuType,
    FmiString,
    FmiString,
    *const CallbackFunctions,
    Boolean,
    Boolean,
) -> Component;
pub type FreeInstanceFn = unsafe extern "C" fn(Component);
pub type SetDebugLoggingFn =
    unsafe extern "C" fn(Component, Boolean, usize, *const FmiString) -> Status;
pub type SetupExperimentFn =
    unsafe extern "C" fn(Component, Boolean, Real, Real, Boolean, Real) -> Status;
pub type ComponentFn = unsafe extern "C" fn(Component) -> Status;
pub type GetRealFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *mut Real) -> Status;
pub type GetIntegerFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *mut Integer) -> Status;
pub type GetBooleanFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *mut Boolean) -> Status;
pub type GetStringFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *mut FmiString) -> Status;
pub type SetRealFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *const Real) -> Status;
pub type SetIntegerFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *const Integer) -> Status;
pub type SetBooleanFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *const Boolean) -> Status;
pub type SetStringFn =
    unsafe extern "C" fn(Component, *const ValueReference, usize, *const FmiString) -> Status;
pub type GetFmuStateFn = unsafe extern "C" fn(Component, *mut FmuState) -> Status;
pub type SetFmuStateFn = unsafe extern "C" fn(Component, FmuState) -> Status;
pub type FreeFmuStateFn = unsafe extern "C" fn(Component, *mut FmuState) -> Status;
pub type GetDirectionalDerivativeFn = unsafe extern "C" fn(
    Component,
    *const ValueReference,
    usize,
    *const ValueReference,
    usize,
    *const Real,
    *mut Real,
) -> Status;
pub type GetVersionFn = unsafe extern "C" fn() -> *const c_char;

/// Symbol probed after binding to check the companion's FMI version.
pub const VERSION_SYMBOL: &CStr = c"fmi2GetVersion";

macro_rules! function_table {
    ($( $field:ident : $symbol:expr => $ty:ty ),* $(,)?) => {
        /// Companion entry points, resolved once and never modified.
        #[derive(Clone, Copy)]
        pub struct FunctionTable {
            $( pub $field: $ty, )*
        }

        /// Every symbol the companion must export.
        pub const REQUIRED_SYMBOLS: &[&CStr] = &[$( $symbol ),*];

        impl FunctionTable {
            /// Resolve every required symbol from `source`.
            ///
            /// Fails with the full list of missing names, in declaration order.
            pub fn bind<S: SymbolSource + ?Sized>(source: &S) -> Result<Self> {
                let mut missing = Vec::new();

                $(
                    let $field = source.symbol($symbol).map(|address| {
                        // SAFETY: the companion exports this name with the
                        // FMI 2.0 signature named by the alias. Function and
                        // data pointers have the same size on every target
                        // with a dynamic loader.
                        unsafe { std::mem::transmute::<*mut c_void, $ty>(address.as_ptr()) }
                    });
                    if $field.is_none() {
                        missing.push($symbol.to_string_lossy().into_owned());
                    }
                )*

                match ($( $field, )*) {
                    ($( Some($field), )*) => Ok(Self { $( $field, )* }),
                    _ => Err(WrapperError::MissingSymbols(missing)),
                }
            }
        }
    };
}

function_table! {
    instantiate: c"fmi2Instantiate" => InstantiateFn,
    free_instance: c"fmi2FreeInstance" => FreeInstanceFn,
    set_debug_logging: c"fmi2SetDebugLogging" => SetDebugLoggingFn,
    setup_experiment: c"fmi2SetupExperiment" => SetupExperimentFn,
    enter_initialization_mode: c"fmi2EnterInitializationMode" => ComponentFn,
    exit_initialization_mode: c"fmi2ExitInitializationMode" => ComponentFn,
    terminate: c"fmi2Terminate" => ComponentFn,
    reset: c"fmi2Reset" => ComponentFn,
    get_real: c"fmi2GetReal" => GetRealFn,
    get_integer: c"fmi2GetInteger" => GetIntegerFn,
    get_boolean: c"fmi2GetBoolean" => GetBooleanFn,
    get_string: c"fmi2GetString" => GetStringFn,
    set_real: c"fmi2SetReal" => SetRealFn,
    set_integer: c"fmi2SetInteger" => SetIntegerFn,
    set_boolean: c"fmi2SetBoolean" => SetBooleanFn,
    set_string: c"fmi2SetString" => SetStringFn,
    get_fmu_state: c"fmi2GetFMUstate" => GetFmuStateFn,
    set_fmu_state: c"fmi2SetFMUstate" => SetFmuStateFn,
    free_fmu_state: c"fmi2FreeFMUstate" => FreeFmuStateFn,
    get_directional_derivative: c"fmi2GetDirectionalDerivative" => GetDirectionalDerivativeFn,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("entries", &REQUIRED_SYMBOLS.len())
            .finish()
    }
}

/// The Model Exchange operations the adapter forwards to.
///
/// Arguments are passed through exactly as received from the host.
///
/// # Safety
/// Every method has the contract of the FMI 2.0 function of the same name:
/// `c` must be a live component created by [`ModelExchange::instantiate`] on
/// the same binding, and pointer arguments must be valid for the lengths given.
pub trait ModelExchange {
    unsafe fn instantiate(
        &self,
        instance_name: FmiString,
        fmu_type: FmuType,
        guid: FmiString,
        resource_location: FmiString,
        functions: *const CallbackFunctions,
        visible: Boolean,
        logging_on: Boolean,
    ) -> Component;
    unsafe fn free_instance(&self, c: Component);

    unsafe fn set_debug_logging(
        &self,
        c: Component,
        logging_on: Boolean,
        n_categories: usize,
        categories: *const FmiString,
    ) -> Status;

    unsafe fn setup_experiment(
        &self,
        c: Component,
        tolerance_defined: Boolean,
        tolerance: Real,
        start_time: Real,
        stop_time_defined: Boolean,
        stop_time: Real,
    ) -> Status;
    unsafe fn enter_initialization_mode(&self, c: Component) -> Status;
    unsafe fn exit_initialization_mode(&self, c: Component) -> Status;
    unsafe fn terminate(&self, c: Component) -> Status;
    unsafe fn reset(&self, c: Component) -> Status;

    unsafe fn get_real(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Real) -> Status;
    unsafe fn get_integer(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Integer) -> Status;
    unsafe fn get_boolean(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Boolean) -> Status;
    unsafe fn get_string(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut FmiString) -> Status;
    unsafe fn set_real(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Real) -> Status;
    unsafe fn set_integer(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Integer) -> Status;
    unsafe fn set_boolean(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Boolean) -> Status;
    unsafe fn set_string(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const FmiString) -> Status;

    unsafe fn get_fmu_state(&self, c: Component, state: *mut FmuState) -> Status;
    unsafe fn set_fmu_state(&self, c: Component, state: FmuState) -> Status;
    unsafe fn free_fmu_state(&self, c: Component, state: *mut FmuState) -> Status;

    unsafe fn get_directional_derivative(
        &self,
        c: Component,
        unknown_refs: *const ValueReference,
        n_unknown: usize,
        known_refs: *const ValueReference,
        n_known: usize,
        dv_known: *const Real,
        dv_unknown: *mut Real,
    ) -> Status;
}

/// A loaded companion library together with its resolved entry points.
///
/// The library is only closed when the binding is dropped, after every
/// component created through it has been freed by its owner.
pub struct LibraryBinding<L> {
    table: FunctionTable,
    _library: L,
}

impl<L: SymbolSource> LibraryBinding<L> {
    /// Bind every required entry point, then check the companion's version.
    ///
    /// On failure `library` is dropped, which closes it.
    pub fn new(library: L) -> Result<Self> {
        let table = FunctionTable::bind(&library)?;
        check_version(&library)?;
        Ok(Self {
            table,
            _library: library,
        })
    }
}

impl<L> fmt::Debug for LibraryBinding<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryBinding")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Compare the companion's `fmi2GetVersion` against ours, when it has one.
fn check_version<S: SymbolSource + ?Sized>(source: &S) -> Result<()> {
    let Some(address) = source.symbol(VERSION_SYMBOL) else {
        tracing::debug!("Companion does not export fmi2GetVersion, skipping version check");
        return Ok(());
    };

    // SAFETY: fmi2GetVersion takes no arguments and returns a static string;
    // the address fits a function pointer as in `FunctionTable::bind`.
    let get_version = unsafe { std::mem::transmute::<*mut c_void, GetVersionFn>(address.as_ptr()) };
    let version = unsafe { get_version() };

    let found = if version.is_null() {
        String::new()
    } else {
        // SAFETY: non-null results are NUL-terminated strings.
        unsafe { CStr::from_ptr(version) }.to_string_lossy().into_owned()
    };

    if found.as_bytes() != FMI_VERSION.to_bytes() {
        return Err(WrapperError::IncompatibleVersion {
            expected: FMI_VERSION.to_string_lossy().into_owned(),
            found,
        });
    }

    Ok(())
}

impl<L> ModelExchange for LibraryBinding<L> {
    unsafe fn instantiate(
        &self,
        instance_name: FmiString,
        fmu_type: FmuType,
        guid: FmiString,
        resource_location: FmiString,
        functions: *const CallbackFunctions,
        visible: Boolean,
        logging_on: Boolean,
    ) -> Component {
        unsafe {
            (self.table.instantiate)(
                instance_name,
                fmu_type,
                guid,
                resource_location,
                functions,
                visible,
                logging_on,
            )
        }
    }

    unsafe fn free_instance(&self, c: Component) {
        unsafe { (self.table.free_instance)(c) }
    }

    unsafe fn set_debug_logging(
        &self,
        c: Component,
        logging_on: Boolean,
        n_categories: usize,
        categories: *const FmiString,
    ) -> Status {
        unsafe { (self.table.set_debug_logging)(c, logging_on, n_categories, categories) }
    }

    unsafe fn setup_experiment(
        &self,
        c: Component,
        tolerance_defined: Boolean,
        tolerance: Real,
        start_time: Real,
        stop_time_defined: Boolean,
        stop_time: Real,
    ) -> Status {
        unsafe {
            (self.table.setup_experiment)(
                c,
                tolerance_defined,
                tolerance,
                start_time,
                stop_time_defined,
                stop_time,
            )
        }
    }

    unsafe fn enter_initialization_mode(&self, c: Component) -> Status {
        unsafe { (self.table.enter_initialization_mode)(c) }
    }

    unsafe fn exit_initialization_mode(&self, c: Component) -> Status {
        unsafe { (self.table.exit_initialization_mode)(c) }
    }

    unsafe fn terminate(&self, c: Component) -> Status {
        unsafe { (self.table.terminate)(c) }
    }

    unsafe fn reset(&self, c: Component) -> Status {
        unsafe { (self.table.reset)(c) }
    }

    unsafe fn get_real(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Real) -> Status {
        unsafe { (self.table.get_real)(c, vr, nvr, value) }
    }

    unsafe fn get_integer(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Integer) -> Status {
        unsafe { (self.table.get_integer)(c, vr, nvr, value) }
    }

    unsafe fn get_boolean(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut Boolean) -> Status {
        unsafe { (self.table.get_boolean)(c, vr, nvr, value) }
    }

    unsafe fn get_string(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *mut FmiString) -> Status {
        unsafe { (self.table.get_string)(c, vr, nvr, value) }
    }

    unsafe fn set_real(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Real) -> Status {
        unsafe { (self.table.set_real)(c, vr, nvr, value) }
    }

    unsafe fn set_integer(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Integer) -> Status {
        unsafe { (self.table.set_integer)(c, vr, nvr, value) }
    }

    unsafe fn set_boolean(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const Boolean) -> Status {
        unsafe { (self.table.set_boolean)(c, vr, nvr, value) }
    }

    unsafe fn set_string(&self, c: Component, vr: *const ValueReference, nvr: usize, value: *const FmiString) -> Status {
        unsafe { (self.table.set_string)(c, vr, nvr, value) }
    }

    unsafe fn get_fmu_state(&self, c: Component, state: *mut FmuState) -> Status {
        unsafe { (self.table.get_fmu_state)(c, state) }
    }

    unsafe fn set_fmu_state(&self, c: Component, state: FmuState) -> Status {
        unsafe { (self.table.set_fmu_state)(c, state) }
    }

    unsafe fn free_fmu_state(&self, c: Component, state: *mut FmuState) -> Status {
        unsafe { (self.table.free_fmu_state)(c, state) }
    }

    unsafe fn get_directional_derivative(
        &self,
        c: Component,
        unknown_refs: *const ValueReference,
        n_unknown: usize,
        known_refs: *const ValueReference,
        n_known: usize,
        dv_known: *const Real,
        dv_unknown: *mut Real,
    ) -> Status {
        unsafe {
            (self.table.get_directional_derivative)(
                c,
                unknown_refs,
                n_unknown,
                known_refs,
                n_known,
                dv_known,
                dv_unknown,
            )
        }
    }
}
