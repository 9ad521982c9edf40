//! The per-component instance record behind an opaque `fmi2Component`.

use std::ffi::c_void;

use crate::binding::ModelExchange;
use crate::types::Component;

/// One adapter instance: the companion binding (library handle plus
/// dispatch table) and the component the companion created.
///
/// Only ever exists fully built. Dropping it frees the companion component
/// first and then closes the library.
pub struct Instance<B: ModelExchange> {
    component: Component,
    name: String,
    binding: B,
}

impl<B: ModelExchange> Instance<B> {
    /// # Safety
    /// `component` must be a non-null component returned by
    /// `binding.instantiate` and not yet freed. The instance takes ownership
    /// of it.
    pub unsafe fn new(binding: B, component: Component, name: impl Into<String>) -> Self {
        debug_assert!(!component.is_null());
        Self {
            component,
            name: name.into(),
            binding,
        }
    }

    /// The companion's component handle, passed unchanged on every call.
    pub fn component(&self) -> Component {
        self.component
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Move the record to the heap and hand out its opaque address.
    pub fn into_handle(self) -> Component {
        Box::into_raw(Box::new(self)) as *mut c_void
    }

    /// Borrow the record behind a handle; `None` for null.
    ///
    /// # Safety
    /// A non-null `handle` must come from [`Instance::into_handle`] with the
    /// same `B` and must not have been released.
    pub unsafe fn from_handle<'a>(handle: Component) -> Option<&'a Self> {
        // SAFETY: upheld by the caller.
        unsafe { (handle as *const Self).as_ref() }
    }

    /// Take back ownership of the record behind a handle; `None` for null.
    ///
    /// # Safety
    /// As for [`Instance::from_handle`]; the handle is invalid afterwards.
    pub unsafe fn release(handle: Component) -> Option<Box<Self>> {
        if handle.is_null() {
            return None;
        }
        // SAFETY: upheld by the caller.
        Some(unsafe { Box::from_raw(handle as *mut Self) })
    }
}

impl<B: ModelExchange> Drop for Instance<B> {
    fn drop(&mut self) {
        tracing::debug!(instance = %self.name, "Freeing companion component");
        // SAFETY: the component came from this binding and is freed only here.
        unsafe { self.binding.free_instance(self.component) };
    }
}
