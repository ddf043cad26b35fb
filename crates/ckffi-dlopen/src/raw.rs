//! The one C-ABI call shape the prover library exports:
//! `char* f(const char*, ...)` with one to three arguments.
//!
//! Both bindings go through [`call_loaded`]; they differ only in how long the
//! [`Library`] lives and how a [`CallError`] is reported.

use std::ffi::{c_char, CStr, CString};
use std::str::Utf8Error;

use ckffi_core::Error;
use libloading::{Library, Symbol};

type Fn1 = unsafe extern "C" fn(*const c_char) -> *const c_char;
type Fn2 = unsafe extern "C" fn(*const c_char, *const c_char) -> *const c_char;
type Fn3 = unsafe extern "C" fn(*const c_char, *const c_char, *const c_char) -> *const c_char;

/// Failure of a single call on a loaded library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The symbol could not be resolved.
    #[error(transparent)]
    Symbol(#[from] libloading::Error),
    /// No exported function takes this many arguments.
    #[error("`{symbol}` called with {arity} arguments (expected 1 to 3)")]
    Arity {
        /// Function being called.
        symbol: String,
        /// Number of arguments given.
        arity: usize,
    },
    /// The function returned a null pointer.
    #[error("`{symbol}` returned null")]
    Null {
        /// Function being called.
        symbol: String,
    },
    /// The returned C string is not UTF-8.
    #[error("`{symbol}` returned invalid UTF-8: {source}")]
    Utf8 {
        /// Function being called.
        symbol: String,
        /// Decoder error.
        source: Utf8Error,
    },
}

impl From<CallError> for Error {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Symbol(e) => Self::native(e),
            CallError::Arity { .. } => Self::InvalidArgument(err.to_string()),
            CallError::Null { symbol } => Self::NullResponse { symbol },
            CallError::Utf8 { .. } => Self::Encoding(err.to_string()),
        }
    }
}

/// Call `symbol` on `lib` and copy the C-string result into a `String`.
///
/// The arity is taken from `args.len()`. The returned buffer is owned by the
/// library, which exports no free function; it is copied and left alone.
#[allow(unsafe_code)]
pub fn call_loaded(lib: &Library, symbol: &str, args: &[CString]) -> Result<String, CallError> {
    let name = symbol.as_bytes();
    // SAFETY: the declared function types match the exported ABI: N pointers
    // to NUL-terminated strings in, one pointer to a NUL-terminated string out.
    // The argument CStrings outlive the call.
    let ptr = unsafe {
        match args {
            [a] => {
                let f: Symbol<'_, Fn1> = lib.get(name)?;
                f(a.as_ptr())
            }
            [a, b] => {
                let f: Symbol<'_, Fn2> = lib.get(name)?;
                f(a.as_ptr(), b.as_ptr())
            }
            [a, b, c] => {
                let f: Symbol<'_, Fn3> = lib.get(name)?;
                f(a.as_ptr(), b.as_ptr(), c.as_ptr())
            }
            _ => {
                return Err(CallError::Arity {
                    symbol: symbol.to_string(),
                    arity: args.len(),
                })
            }
        }
    };
    read_c_string(ptr, symbol)
}

#[allow(unsafe_code)]
fn read_c_string(ptr: *const c_char, symbol: &str) -> Result<String, CallError> {
    if ptr.is_null() {
        return Err(CallError::Null {
            symbol: symbol.to_string(),
        });
    }
    // SAFETY: non-null, and the native side returns a NUL-terminated buffer it
    // keeps alive; `lib` is borrowed by the caller for the whole copy.
    let cstr = unsafe { CStr::from_ptr(ptr) };
    cstr.to_str()
        .map(str::to_owned)
        .map_err(|source| CallError::Utf8 {
            symbol: symbol.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_result_maps_to_null_response() {
        let err = read_c_string(std::ptr::null(), "echo").unwrap_err();
        assert!(matches!(err, CallError::Null { .. }));
        let err = Error::from(err);
        assert!(matches!(err, Error::NullResponse { ref symbol } if symbol == "echo"));
    }

    #[test]
    fn invalid_utf8_maps_to_encoding() {
        let bytes = CString::new(vec![0xff, 0xfe]).unwrap();
        let err = read_c_string(bytes.as_ptr(), "echo").unwrap_err();
        assert!(matches!(err, CallError::Utf8 { .. }));
        assert!(matches!(Error::from(err), Error::Encoding(_)));
    }

    #[test]
    fn arity_error_is_an_invalid_argument() {
        let err = CallError::Arity {
            symbol: "echo".into(),
            arity: 4,
        };
        assert!(matches!(Error::from(err), Error::InvalidArgument(m) if m.contains("4 arguments")));
    }
}
