//! Opening the companion library and looking up its symbols.

use std::ffi::{c_void, CStr};
use std::path::Path;
use std::ptr::NonNull;

use libloading::Library;

use crate::error::{Result, WrapperError};

/// Exact-name symbol lookup in a loaded library.
pub trait SymbolSource {
    /// Address of `name`, or `None` when the symbol is absent or null.
    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>>;
}

/// Opens native libraries by path.
///
/// The returned value owns the OS handle; dropping it closes the library,
/// so each handle is released exactly once.
pub trait LibraryLoader {
    type Library: SymbolSource;

    fn open(&self, path: &Path) -> Result<Self::Library>;
}

/// Loader backed by the platform dynamic loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLoader;

impl LibraryLoader for NativeLoader {
    type Library = Library;

    fn open(&self, path: &Path) -> Result<Library> {
        // SAFETY: loading runs the companion's initializers; the companion is
        // the FMU binary this adapter is shipped with.
        unsafe { Library::new(path) }.map_err(|e| WrapperError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl SymbolSource for Library {
    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: the symbol is read as a plain address; callers decide the
        // function type it is used as. dlsym and GetProcAddress both return
        // code addresses as data pointers of the same size.
        let symbol = unsafe { self.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        NonNull::new(*symbol)
    }
}
