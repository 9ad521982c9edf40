//! A stub Model Exchange companion served from memory.
//!
//! Entry points are plain `extern "C"` functions. Call counts, live
//! components and library opens/closes are tracked per test thread.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr::{null_mut, NonNull};

use cswrapper_core::binding::LibraryBinding;
use cswrapper_core::dispatch;
use cswrapper_core::prelude::*;

thread_local! {
    static CALLS: RefCell<HashMap<&'static str, usize>> = RefCell::new(HashMap::new());
    static LIVE_COMPONENTS: Cell<isize> = const { Cell::new(0) };
    static LIVE_STATES: Cell<isize> = const { Cell::new(0) };
    static OPENS: Cell<usize> = const { Cell::new(0) };
    static CLOSES: Cell<usize> = const { Cell::new(0) };
    static OPENED_PATHS: RefCell<Vec<PathBuf>> = const { RefCell::new(Vec::new()) };
    static LAST_FMU_TYPE: Cell<Option<FmuType>> = const { Cell::new(None) };
    static LAST_EXPERIMENT: Cell<Option<(Boolean, Real, Real, Boolean, Real)>> = const { Cell::new(None) };
    static FAIL_INSTANTIATE: Cell<bool> = const { Cell::new(false) };
    static LOGGED: RefCell<Vec<LoggedMessage>> = const { RefCell::new(Vec::new()) };
}

/// Clear every counter on this thread. Call first in each test.
pub fn reset() {
    CALLS.with(|c| c.borrow_mut().clear());
    LIVE_COMPONENTS.with(|l| l.set(0));
    LIVE_STATES.with(|l| l.set(0));
    OPENS.with(|o| o.set(0));
    CLOSES.with(|c| c.set(0));
    OPENED_PATHS.with(|p| p.borrow_mut().clear());
    LAST_FMU_TYPE.with(|t| t.set(None));
    LAST_EXPERIMENT.with(|e| e.set(None));
    FAIL_INSTANTIATE.with(|f| f.set(false));
    LOGGED.with(|l| l.borrow_mut().clear());
}

fn hit(name: &'static str) {
    CALLS.with(|c| *c.borrow_mut().entry(name).or_default() += 1);
}

pub fn calls(name: &str) -> usize {
    CALLS.with(|c| c.borrow().get(name).copied().unwrap_or(0))
}

pub fn total_calls() -> usize {
    CALLS.with(|c| c.borrow().values().sum())
}

pub fn live_components() -> isize {
    LIVE_COMPONENTS.with(Cell::get)
}

pub fn live_states() -> isize {
    LIVE_STATES.with(Cell::get)
}

pub fn opens() -> usize {
    OPENS.with(Cell::get)
}

pub fn closes() -> usize {
    CLOSES.with(Cell::get)
}

pub fn opened_paths() -> Vec<PathBuf> {
    OPENED_PATHS.with(|p| p.borrow().clone())
}

pub fn last_fmu_type() -> Option<FmuType> {
    LAST_FMU_TYPE.with(Cell::get)
}

pub fn last_experiment() -> Option<(Boolean, Real, Real, Boolean, Real)> {
    LAST_EXPERIMENT.with(Cell::get)
}

pub fn fail_instantiate(fail: bool) {
    FAIL_INSTANTIATE.with(|f| f.set(fail));
}

/// One call the host logger received.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedMessage {
    pub environment: usize,
    pub instance: String,
    pub status: Status,
    pub category: String,
    pub format: String,
    pub message: String,
}

pub fn logged() -> Vec<LoggedMessage> {
    LOGGED.with(|l| l.borrow().clone())
}

type RecordLogFn =
    unsafe extern "C" fn(ComponentEnvironment, FmiString, Status, FmiString, FmiString, *const c_char);

/// Host logger that reads the single `%s` argument it is always called with.
unsafe extern "C" fn record_log(
    environment: ComponentEnvironment,
    instance: FmiString,
    status: Status,
    category: FmiString,
    format: FmiString,
    message: *const c_char,
) {
    let text = |s: FmiString| unsafe { string_lossy(s) };
    LOGGED.with(|l| {
        l.borrow_mut().push(LoggedMessage {
            environment: environment as usize,
            instance: text(instance),
            status,
            category: text(category),
            format: text(format),
            message: text(message),
        })
    });
}

/// Callbacks whose logger records into [`logged`], tagged with `environment`.
pub fn recording_callbacks(environment: usize) -> CallbackFunctions {
    // SAFETY: the recorder has the fixed prefix of fmi2CallbackLogger plus the
    // one variadic argument the adapter passes; on the C ABIs this runs on a
    // pointer-sized variadic argument is read like a named one.
    let logger = unsafe { std::mem::transmute::<RecordLogFn, CallbackLogger>(record_log) };
    CallbackFunctions {
        logger,
        allocate_memory: None,
        free_memory: None,
        step_finished: None,
        component_environment: environment as ComponentEnvironment,
    }
}

/// Per-component storage of the stub.
#[derive(Default, Clone)]
struct StubComponent {
    reals: HashMap<ValueReference, Real>,
    integers: HashMap<ValueReference, Integer>,
    booleans: HashMap<ValueReference, Boolean>,
    strings: HashMap<ValueReference, CString>,
    initialized: bool,
}

unsafe fn component<'a>(c: Component) -> &'a mut StubComponent {
    assert!(!c.is_null(), "stub called with a null component");
    unsafe { &mut *(c as *mut StubComponent) }
}

unsafe fn slice<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

unsafe fn slice_mut<'a, T>(ptr: *mut T, len: usize) -> &'a mut [T] {
    if len == 0 {
        return &mut [];
    }
    unsafe { std::slice::from_raw_parts_mut(ptr, len) }
}

unsafe extern "C" fn stub_instantiate(
    _name: FmiString,
    fmu_type: FmuType,
    _guid: FmiString,
    _resources: FmiString,
    _functions: *const CallbackFunctions,
    _visible: Boolean,
    _logging_on: Boolean,
) -> Component {
    hit("fmi2Instantiate");
    LAST_FMU_TYPE.with(|t| t.set(Some(fmu_type)));
    if FAIL_INSTANTIATE.with(Cell::get) {
        return null_mut();
    }
    LIVE_COMPONENTS.with(|l| l.set(l.get() + 1));
    Box::into_raw(Box::<StubComponent>::default()) as Component
}

unsafe extern "C" fn stub_free_instance(c: Component) {
    hit("fmi2FreeInstance");
    if !c.is_null() {
        drop(unsafe { Box::from_raw(c as *mut StubComponent) });
        LIVE_COMPONENTS.with(|l| l.set(l.get() - 1));
    }
}

unsafe extern "C" fn stub_set_debug_logging(
    c: Component,
    _logging_on: Boolean,
    n_categories: usize,
    _categories: *const FmiString,
) -> Status {
    hit("fmi2SetDebugLogging");
    unsafe { component(c) };
    if n_categories > 3 {
        Status::WARNING
    } else {
        Status::OK
    }
}

unsafe extern "C" fn stub_setup_experiment(
    c: Component,
    tolerance_defined: Boolean,
    tolerance: Real,
    start_time: Real,
    stop_time_defined: Boolean,
    stop_time: Real,
) -> Status {
    hit("fmi2SetupExperiment");
    unsafe { component(c) };
    LAST_EXPERIMENT.with(|e| {
        e.set(Some((tolerance_defined, tolerance, start_time, stop_time_defined, stop_time)))
    });
    Status::OK
}

unsafe extern "C" fn stub_enter_initialization_mode(c: Component) -> Status {
    hit("fmi2EnterInitializationMode");
    let model = unsafe { component(c) };
    model.initialized = true;
    Status::OK
}

unsafe extern "C" fn stub_exit_initialization_mode(c: Component) -> Status {
    hit("fmi2ExitInitializationMode");
    if unsafe { component(c) }.initialized {
        Status::OK
    } else {
        Status::ERROR
    }
}

unsafe extern "C" fn stub_terminate(c: Component) -> Status {
    hit("fmi2Terminate");
    unsafe { component(c) };
    Status::OK
}

unsafe extern "C" fn stub_reset(c: Component) -> Status {
    hit("fmi2Reset");
    let model = unsafe { component(c) };
    *model = StubComponent::default();
    Status::OK
}

macro_rules! stub_get {
    ($name:ident, $symbol:literal, $field:ident, $ty:ty, |$v:ident| $out:expr) => {
        unsafe extern "C" fn $name(
            c: Component,
            vr: *const ValueReference,
            nvr: usize,
            value: *mut $ty,
        ) -> Status {
            hit($symbol);
            let model = unsafe { component(c) };
            let refs = unsafe { slice(vr, nvr) };
            let out = unsafe { slice_mut(value, nvr) };
            for (slot, r) in out.iter_mut().zip(refs) {
                match model.$field.get(r) {
                    Some($v) => *slot = $out,
                    None => return Status::DISCARD,
                }
            }
            Status::OK
        }
    };
}

macro_rules! stub_set {
    ($name:ident, $symbol:literal, $field:ident, $ty:ty, |$v:ident| $stored:expr) => {
        unsafe extern "C" fn $name(
            c: Component,
            vr: *const ValueReference,
            nvr: usize,
            value: *const $ty,
        ) -> Status {
            hit($symbol);
            let model = unsafe { component(c) };
            let refs = unsafe { slice(vr, nvr) };
            let values = unsafe { slice(value, nvr) };
            for (r, $v) in refs.iter().zip(values) {
                model.$field.insert(*r, $stored);
            }
            Status::OK
        }
    };
}

stub_get!(stub_get_real, "fmi2GetReal", reals, Real, |v| *v);
stub_get!(stub_get_integer, "fmi2GetInteger", integers, Integer, |v| *v);
stub_get!(stub_get_boolean, "fmi2GetBoolean", booleans, Boolean, |v| *v);
stub_get!(stub_get_string, "fmi2GetString", strings, FmiString, |v| v.as_ptr());
stub_set!(stub_set_real, "fmi2SetReal", reals, Real, |v| *v);
stub_set!(stub_set_integer, "fmi2SetInteger", integers, Integer, |v| *v);
stub_set!(stub_set_boolean, "fmi2SetBoolean", booleans, Boolean, |v| *v);
stub_set!(stub_set_string, "fmi2SetString", strings, FmiString, |v| unsafe {
    CStr::from_ptr(*v).to_owned()
});

unsafe extern "C" fn stub_get_fmu_state(c: Component, state: *mut FmuState) -> Status {
    hit("fmi2GetFMUstate");
    let snapshot = unsafe { component(c) }.clone();
    LIVE_STATES.with(|l| l.set(l.get() + 1));
    unsafe { *state = Box::into_raw(Box::new(snapshot)) as FmuState };
    Status::OK
}

unsafe extern "C" fn stub_set_fmu_state(c: Component, state: FmuState) -> Status {
    hit("fmi2SetFMUstate");
    if state.is_null() {
        return Status::ERROR;
    }
    let snapshot = unsafe { &*(state as *const StubComponent) };
    let model = unsafe { component(c) };
    *model = snapshot.clone();
    Status::OK
}

unsafe extern "C" fn stub_free_fmu_state(_c: Component, state: *mut FmuState) -> Status {
    hit("fmi2FreeFMUstate");
    let owned = unsafe { *state };
    if !owned.is_null() {
        drop(unsafe { Box::from_raw(owned as *mut StubComponent) });
        LIVE_STATES.with(|l| l.set(l.get() - 1));
        unsafe { *state = null_mut() };
    }
    Status::OK
}

/// Every unknown is twice the sum of the seeds.
unsafe extern "C" fn stub_get_directional_derivative(
    c: Component,
    _unknown_refs: *const ValueReference,
    n_unknown: usize,
    _known_refs: *const ValueReference,
    n_known: usize,
    dv_known: *const Real,
    dv_unknown: *mut Real,
) -> Status {
    hit("fmi2GetDirectionalDerivative");
    unsafe { component(c) };
    let seed: Real = unsafe { slice(dv_known, n_known) }.iter().sum();
    for out in unsafe { slice_mut(dv_unknown, n_unknown) } {
        *out = 2.0 * seed;
    }
    Status::OK
}

unsafe extern "C" fn stub_get_version() -> *const c_char {
    c"2.0".as_ptr()
}

unsafe extern "C" fn stub_do_step(_c: Component, _t: Real, _h: Real, _flag: Boolean) -> Status {
    hit("fmi2DoStep");
    Status::OK
}

fn entry(name: &'static CStr, f: *const ()) -> (&'static CStr, NonNull<c_void>) {
    (name, NonNull::new(f as *mut c_void).expect("function address"))
}

/// Every symbol a complete stub companion exports.
pub fn stub_symbols() -> HashMap<&'static CStr, NonNull<c_void>> {
    [
        entry(c"fmi2Instantiate", stub_instantiate as *const ()),
        entry(c"fmi2FreeInstance", stub_free_instance as *const ()),
        entry(c"fmi2SetDebugLogging", stub_set_debug_logging as *const ()),
        entry(c"fmi2SetupExperiment", stub_setup_experiment as *const ()),
        entry(c"fmi2EnterInitializationMode", stub_enter_initialization_mode as *const ()),
        entry(c"fmi2ExitInitializationMode", stub_exit_initialization_mode as *const ()),
        entry(c"fmi2Terminate", stub_terminate as *const ()),
        entry(c"fmi2Reset", stub_reset as *const ()),
        entry(c"fmi2GetReal", stub_get_real as *const ()),
        entry(c"fmi2GetInteger", stub_get_integer as *const ()),
        entry(c"fmi2GetBoolean", stub_get_boolean as *const ()),
        entry(c"fmi2GetString", stub_get_string as *const ()),
        entry(c"fmi2SetReal", stub_set_real as *const ()),
        entry(c"fmi2SetInteger", stub_set_integer as *const ()),
        entry(c"fmi2SetBoolean", stub_set_boolean as *const ()),
        entry(c"fmi2SetString", stub_set_string as *const ()),
        entry(c"fmi2GetFMUstate", stub_get_fmu_state as *const ()),
        entry(c"fmi2SetFMUstate", stub_set_fmu_state as *const ()),
        entry(c"fmi2FreeFMUstate", stub_free_fmu_state as *const ()),
        entry(c"fmi2GetDirectionalDerivative", stub_get_directional_derivative as *const ()),
        entry(c"fmi2GetVersion", stub_get_version as *const ()),
        // Exported by the stub but never bound: the adapter must not forward to it.
        entry(c"fmi2DoStep", stub_do_step as *const ()),
    ]
    .into_iter()
    .collect()
}

/// An "opened" stub library. Dropping it counts as closing it.
pub struct StubLibrary {
    symbols: HashMap<&'static CStr, NonNull<c_void>>,
}

impl SymbolSource for StubLibrary {
    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        self.symbols.get(name).copied()
    }
}

impl Drop for StubLibrary {
    fn drop(&mut self) {
        CLOSES.with(|c| c.set(c.get() + 1));
    }
}

/// Loader for [`StubLibrary`], optionally missing symbols or the whole file.
#[derive(Default)]
pub struct StubLoader {
    pub omit: Vec<&'static CStr>,
    pub missing: bool,
}

impl StubLoader {
    pub fn without(omit: &[&'static CStr]) -> Self {
        Self {
            omit: omit.to_vec(),
            missing: false,
        }
    }

    pub fn missing() -> Self {
        Self {
            omit: Vec::new(),
            missing: true,
        }
    }
}

impl LibraryLoader for StubLoader {
    type Library = StubLibrary;

    fn open(&self, path: &Path) -> cswrapper_core::Result<StubLibrary> {
        OPENED_PATHS.with(|p| p.borrow_mut().push(path.to_path_buf()));
        if self.missing {
            return Err(WrapperError::LoadFailed {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }
        OPENS.with(|o| o.set(o.get() + 1));

        let mut symbols = stub_symbols();
        for name in &self.omit {
            symbols.remove(*name);
        }
        Ok(StubLibrary { symbols })
    }
}

pub type StubBinding = LibraryBinding<StubLibrary>;

pub fn adapter_path() -> PathBuf {
    PathBuf::from(format!("/fmus/model/binaries/model_cs{}", std::env::consts::DLL_SUFFIX))
}

pub fn companion_path() -> PathBuf {
    PathBuf::from(format!("/fmus/model/binaries/model{}", std::env::consts::DLL_SUFFIX))
}

pub fn instantiator(loader: StubLoader) -> Instantiator<FixedLocation, StubLoader> {
    Instantiator::new(
        FixedLocation::new(adapter_path()),
        loader,
        WrapperConfig::default(),
    )
}

pub fn args(fmu_type: FmuType) -> InstantiateArgs {
    InstantiateArgs {
        instance_name: c"stub".as_ptr(),
        fmu_type,
        guid: c"{8c4e810f-3df3-4a00-8276-176fa3c9f000}".as_ptr(),
        resource_location: c"file:///fmus/model/resources".as_ptr(),
        functions: std::ptr::null(),
        visible: FMI_FALSE,
        logging_on: FMI_FALSE,
    }
}

/// Create an instance through the dispatcher, as the exported entry point does.
pub fn create<L: LibraryLoader>(instantiator: &Instantiator<FixedLocation, L>) -> Component {
    unsafe { dispatch::instantiate(instantiator, &args(FmuType::CO_SIMULATION)) }
}

pub fn destroy(handle: Component) {
    unsafe { dispatch::free_instance::<StubBinding>(handle) }
}
