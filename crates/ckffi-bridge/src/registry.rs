//! Default bridge: a process-wide registry of loaded libraries keyed by name.
//!
//! Mirrors what a host-side FFI bridge does: `open` registers a library under
//! a name, `load` resolves and calls a `char* f(const char*, ...)` symbol on a
//! registered name, `close` unregisters and unloads. Strings on the bridge side
//! are in the bridge's wire encoding; the native side always sees UTF-8
//! C strings.
//!
//! Opening a name that is already registered is refused with
//! [`BridgeError::AlreadyOpen`] instead of silently replacing the first handle.
//!
//! The registry lock is held only to look a name up. Calls run on a cloned
//! `Arc<Library>`, so a slow call on one name does not block the others, and a
//! `close` during a call unloads the library only once the call returns.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use ckffi_core::encoding::{self, TextEncoding};
use ckffi_dlopen::{call_loaded, CallError};
use libloading::Library;
use tracing::{debug, warn};

use crate::Bridge;

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<Library>>>> = OnceLock::new();

fn registry() -> MutexGuard<'static, HashMap<String, Arc<Library>>> {
    REGISTRY
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Failures raised by [`LibraryBridge`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The name is already registered.
    #[error("library `{library}` is already open")]
    AlreadyOpen {
        /// Registered name.
        library: String,
    },
    /// The name is not registered.
    #[error("library `{library}` is not open")]
    NotOpen {
        /// Requested name.
        library: String,
    },
    /// Loading the library or resolving a symbol failed.
    #[error(transparent)]
    Load(#[from] libloading::Error),
    /// Text could not be converted between the wire and C strings.
    #[error("invalid text for `{func}`: {reason}")]
    InvalidText {
        /// Function being called.
        func: String,
        /// What went wrong.
        reason: String,
    },
    /// The native call itself failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Process-wide, name-keyed bridge backed by `libloading`.
///
/// `wire` is the encoding strings have on the bridge side: under
/// [`TextEncoding::Utf16`] arguments arrive as UTF-16LE and results leave as
/// UTF-16LE with a trailing NUL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryBridge {
    wire: TextEncoding,
}

impl LibraryBridge {
    /// Bridge speaking `wire`.
    #[must_use]
    pub const fn new(wire: TextEncoding) -> Self {
        Self { wire }
    }

    /// Wire encoding of this bridge.
    #[must_use]
    pub const fn wire(&self) -> TextEncoding {
        self.wire
    }

    /// Whether `library` is currently registered by any instance.
    #[must_use]
    pub fn is_registered(library: &str) -> bool {
        registry().contains_key(library)
    }

    fn to_c_string(&self, func: &str, arg: &[u8]) -> Result<CString, BridgeError> {
        let invalid = |reason: String| BridgeError::InvalidText {
            func: func.to_string(),
            reason,
        };
        let text = encoding::decode(arg, self.wire).map_err(|e| invalid(e.to_string()))?;
        CString::new(text).map_err(|e| invalid(e.to_string()))
    }

    fn to_wire(&self, text: &str) -> Vec<u8> {
        let mut out = encoding::encode(text, self.wire);
        if self.wire == TextEncoding::Utf16 {
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }
}

impl Bridge for LibraryBridge {
    type Error = BridgeError;

    fn open(&self, library: &str, path: &Path) -> Result<(), BridgeError> {
        let mut reg = registry();
        if reg.contains_key(library) {
            warn!(library, "refusing to open a name that is already registered");
            return Err(BridgeError::AlreadyOpen {
                library: library.to_string(),
            });
        }
        // SAFETY: loading runs the library's initializers; the path is the
        // prebuilt prover artifact chosen by the caller.
        #[allow(unsafe_code)]
        let lib = unsafe { Library::new(path) }?;
        debug!(library, path = %path.display(), "registered");
        reg.insert(library.to_string(), Arc::new(lib));
        Ok(())
    }

    fn close(&self, library: &str) {
        if registry().remove(library).is_some() {
            debug!(library, "unregistered");
        }
    }

    fn load(&self, library: &str, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, BridgeError> {
        let c_args = args
            .iter()
            .map(|a| self.to_c_string(func, a))
            .collect::<Result<Vec<_>, _>>()?;

        let lib = registry()
            .get(library)
            .cloned()
            .ok_or_else(|| BridgeError::NotOpen {
                library: library.to_string(),
            })?;
        let text = call_loaded(&lib, func, &c_args)?;

        Ok(self.to_wire(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_wire_carries_terminator() {
        let bridge = LibraryBridge::new(TextEncoding::Utf16);
        assert_eq!(bridge.to_wire("hi"), vec![b'h', 0, b'i', 0, 0, 0]);
        let c = bridge.to_c_string("echo", &[b'h', 0, b'i', 0]).unwrap();
        assert_eq!(c.as_bytes(), b"hi");
    }

    #[test]
    fn utf8_wire_is_verbatim() {
        let bridge = LibraryBridge::new(TextEncoding::Utf8);
        assert_eq!(bridge.to_wire("hi"), b"hi");
        assert!(bridge.to_c_string("echo", b"a\0b").is_err());
    }

    #[test]
    fn load_on_unknown_name_is_not_open() {
        let bridge = LibraryBridge::new(TextEncoding::Utf8);
        let err = bridge
            .load("ckffi_registry_unknown", "echo", &[b"x".to_vec()])
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotOpen { .. }));
    }

    #[test]
    fn open_of_junk_file_registers_nothing() {
        let f = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(f.path(), b"junk").unwrap();
        let bridge = LibraryBridge::new(TextEncoding::Utf8);
        let err = bridge.open("ckffi_registry_junk", f.path()).unwrap_err();
        assert!(matches!(err, BridgeError::Load(_)));
        assert!(!LibraryBridge::is_registered("ckffi_registry_junk"));
    }
}
