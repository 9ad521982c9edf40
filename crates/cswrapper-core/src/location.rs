//! Finding the file the adapter was loaded from.

use std::ffi::c_void;
use std::path::PathBuf;

use crate::error::{Result, WrapperError};

/// Reports the filesystem path of the module the adapter runs from.
pub trait LocationResolver {
    fn resolve_self_path(&self) -> Result<PathBuf>;
}

/// Resolves the module containing a given code address through the
/// platform loader.
#[derive(Debug, Clone, Copy)]
pub struct ModuleLocator {
    anchor: *const c_void,
}

impl ModuleLocator {
    /// `anchor` should be the address of a function exported by the adapter,
    /// so the module that contains it is the adapter itself.
    pub fn new(anchor: *const c_void) -> Self {
        Self { anchor }
    }
}

impl LocationResolver for ModuleLocator {
    fn resolve_self_path(&self) -> Result<PathBuf> {
        if self.anchor.is_null() {
            return Err(WrapperError::LocationUnknown(
                "no anchor address to introspect".to_string(),
            ));
        }
        module_path(self.anchor)
    }
}

#[cfg(unix)]
fn module_path(anchor: *const c_void) -> Result<PathBuf> {
    use std::ffi::CStr;
    use std::os::unix::ffi::OsStrExt;

    let mut info = std::mem::MaybeUninit::<libc::Dl_info>::zeroed();

    // SAFETY: dladdr only inspects the address and fills `info`.
    let found = unsafe { libc::dladdr(anchor, info.as_mut_ptr()) };
    if found == 0 {
        return Err(WrapperError::LocationUnknown(
            "dladdr could not map the adapter address to a module".to_string(),
        ));
    }

    // SAFETY: dladdr succeeded, so `info` is initialized.
    let info = unsafe { info.assume_init() };
    if info.dli_fname.is_null() {
        return Err(WrapperError::LocationUnknown(
            "dladdr returned no file name".to_string(),
        ));
    }

    // SAFETY: dli_fname is a NUL-terminated string owned by the loader.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    Ok(PathBuf::from(std::ffi::OsStr::from_bytes(name.to_bytes())))
}

#[cfg(windows)]
fn module_path(anchor: *const c_void) -> Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HMODULE;
    use windows::Win32::System::LibraryLoader::{
        GetModuleFileNameW, GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
        GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    };

    let mut module = HMODULE::default();

    // SAFETY: with FROM_ADDRESS the name argument is treated as an address
    // inside the module; UNCHANGED_REFCOUNT means nothing needs releasing.
    unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            PCWSTR(anchor as *const u16),
            &mut module,
        )
    }
    .map_err(|e| WrapperError::LocationUnknown(format!("GetModuleHandleExW failed: {}", e)))?;

    let mut buffer = vec![0u16; 260];
    loop {
        // SAFETY: `module` is a valid handle and the buffer is writable.
        let len = unsafe { GetModuleFileNameW(module, &mut buffer) } as usize;
        if len == 0 {
            return Err(WrapperError::LocationUnknown(
                "GetModuleFileNameW returned no path".to_string(),
            ));
        }
        if len < buffer.len() {
            return Ok(PathBuf::from(OsString::from_wide(&buffer[..len])));
        }
        // Truncated; retry with more room.
        buffer.resize(buffer.len() * 2, 0);
    }
}

#[cfg(not(any(unix, windows)))]
fn module_path(_anchor: *const c_void) -> Result<PathBuf> {
    Err(WrapperError::LocationUnknown(
        "module introspection is not available on this platform".to_string(),
    ))
}

/// A resolver that always reports the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLocation(pub PathBuf);

impl FixedLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl LocationResolver for FixedLocation {
    fn resolve_self_path(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}
