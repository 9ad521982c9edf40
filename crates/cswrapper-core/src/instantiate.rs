//! Creating an instance: locate, load, bind, then instantiate the companion.

use crate::binding::{LibraryBinding, ModelExchange};
use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::instance::Instance;
use crate::library::LibraryLoader;
use crate::location::LocationResolver;
use crate::types::{string_lossy, Boolean, CallbackFunctions, FmiString, FmuType};

/// Raw `fmi2Instantiate` arguments as received from the host.
#[derive(Debug, Clone, Copy)]
pub struct InstantiateArgs {
    pub instance_name: FmiString,
    pub fmu_type: FmuType,
    pub guid: FmiString,
    pub resource_location: FmiString,
    pub functions: *const CallbackFunctions,
    pub visible: Boolean,
    pub logging_on: Boolean,
}

/// The convention the adapter's own surface implements.
pub const ADVERTISED_TYPE: FmuType = FmuType::CO_SIMULATION;

/// The convention the companion implements; every companion instance is
/// created with it regardless of what the host asked for.
pub const COMPANION_TYPE: FmuType = FmuType::MODEL_EXCHANGE;

/// Builds instances from a location resolver, a library loader and the
/// adapter configuration.
pub struct Instantiator<R, L> {
    resolver: R,
    loader: L,
    config: WrapperConfig,
}

impl<R: LocationResolver, L: LibraryLoader> Instantiator<R, L> {
    pub fn new(resolver: R, loader: L, config: WrapperConfig) -> Self {
        Self {
            resolver,
            loader,
            config,
        }
    }

    /// Create a fully bound instance.
    ///
    /// Anything acquired before a failing step is released before returning.
    ///
    /// # Safety
    /// The pointers in `args` must satisfy the `fmi2Instantiate` contract;
    /// they are handed to the companion unchanged.
    pub unsafe fn instantiate(
        &self,
        args: &InstantiateArgs,
    ) -> Result<Instance<LibraryBinding<L::Library>>> {
        if args.fmu_type != ADVERTISED_TYPE {
            return Err(WrapperError::WrongConvention(args.fmu_type));
        }

        let adapter_path = self.resolver.resolve_self_path()?;
        let companion_path = self.config.companion_path(&adapter_path)?;
        if companion_path == adapter_path {
            return Err(WrapperError::CompanionIsAdapter(companion_path));
        }
        tracing::debug!(
            adapter = %adapter_path.display(),
            companion = %companion_path.display(),
            "Loading companion library"
        );

        let library = self.loader.open(&companion_path)?;
        let binding = LibraryBinding::new(library)?;

        // SAFETY: arguments are forwarded as received, except the type.
        let component = unsafe {
            binding.instantiate(
                args.instance_name,
                COMPANION_TYPE,
                args.guid,
                args.resource_location,
                args.functions,
                args.visible,
                args.logging_on,
            )
        };
        if component.is_null() {
            return Err(WrapperError::CompanionInstantiation);
        }

        // SAFETY: non-null component fresh from this binding.
        let name = unsafe { string_lossy(args.instance_name) };
        Ok(unsafe { Instance::new(binding, component, name) })
    }
}
