//! Core of the Co-Simulation adapter.
//!
//! A Model Exchange FMU binary (the *companion*) is driven through the FMI
//! 2.0 Co-Simulation entry points. The adapter library sits next to the
//! companion, finds it from its own location, binds the companion's entry
//! points and forwards every supported call to it.
//!
//! Creation flows through [`instantiate::Instantiator`]:
//! [`location::LocationResolver`] → [`config::SuffixPolicy`] →
//! [`library::LibraryLoader`] → [`binding::LibraryBinding`] → the
//! companion's `fmi2Instantiate`. The result is an [`instance::Instance`]
//! that the [`dispatch`] functions address through an opaque handle.

pub mod binding;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod instance;
pub mod instantiate;
pub mod library;
pub mod location;
pub mod logging;
pub mod types;

pub use binding::{FunctionTable, LibraryBinding, ModelExchange, REQUIRED_SYMBOLS};
pub use config::{SuffixPolicy, WrapperConfig};
pub use error::{Result, WrapperError};
pub use instance::Instance;
pub use instantiate::{InstantiateArgs, Instantiator, ADVERTISED_TYPE, COMPANION_TYPE};
pub use library::{LibraryLoader, NativeLoader, SymbolSource};
pub use location::{FixedLocation, LocationResolver, ModuleLocator};
pub use types::{CallbackFunctions, Component, FmuType, Status};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::binding::{LibraryBinding, ModelExchange};
    pub use crate::config::WrapperConfig;
    pub use crate::error::{Result, WrapperError};
    pub use crate::instantiate::{InstantiateArgs, Instantiator};
    pub use crate::library::{LibraryLoader, NativeLoader, SymbolSource};
    pub use crate::location::{FixedLocation, LocationResolver, ModuleLocator};
    pub use crate::types::*;
}
