//! `ckffi-dlopen`: direct dynamic-load binding.
//!
//! Stateless across calls. Every operation opens the library at the configured
//! path, resolves the one symbol it needs, calls it with NUL-terminated UTF-8
//! arguments, copies the NUL-terminated result into a `String`, and lets the
//! library handle drop. No handle is kept between calls, so there is no shared
//! mutable state and a `DirectBackend` is `Send + Sync`.
//!
//! The call itself lives in [`raw`], shared with the bridge binding.
//!
//! ```no_run
//! use ckffi_core::{ProverBackend, Runtime};
//! use ckffi_dlopen::DirectBackend;
//!
//! let lib = DirectBackend::new("./libcircomkit_ffi-linux-amd64.so", Runtime::Direct)?;
//! assert_eq!(lib.echo("hi theree")?, "hi theree");
//! # Ok::<(), ckffi_core::Error>(())
//! ```

#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::ffi::CString;
use std::path::{Path, PathBuf};

use ckffi_core::{
    check_lambdaworks_r1cs, ensure_library_exists, symbols, Error, IcicleDevice, ProofResult,
    ProverBackend, Result, Runtime,
};
use libloading::Library;
use tracing::debug;

pub mod raw;

pub use raw::{call_loaded, CallError};

/// Backend that loads the library afresh for every call.
#[derive(Debug, Clone)]
pub struct DirectBackend {
    path: PathBuf,
}

impl DirectBackend {
    /// Binding name used in logs.
    pub const NAME: &'static str = "dlopen";

    /// Construct for the library at `path`.
    ///
    /// Fails with [`Error::WrongRuntime`] unless `runtime` offers a direct
    /// loader, and with [`Error::LibraryNotFound`] if `path` is not a file.
    pub fn new(path: impl Into<PathBuf>, runtime: Runtime) -> Result<Self> {
        if !runtime.has_direct_loader() {
            return Err(Error::WrongRuntime {
                required: Runtime::Direct,
                actual: runtime,
            });
        }
        let path = path.into();
        ensure_library_exists(&path)?;
        Ok(Self { path })
    }

    /// [`DirectBackend::new`] with the runtime taken from the environment.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(path, Runtime::detect())
    }

    fn call(&self, symbol: &str, args: &[&str]) -> Result<String> {
        call_symbol(&self.path, symbol, args)
    }

    fn prove(&self, symbol: &str, args: &[&str]) -> Result<ProofResult> {
        ProofResult::from_json(&self.call(symbol, args)?)
    }
}

impl ProverBackend for DirectBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn echo(&self, input: &str) -> Result<String> {
        self.call(symbols::ECHO, &[input])
    }

    fn arkworks_prove(
        &self,
        wtns_path: &str,
        r1cs_path: &str,
        pkey_path: &str,
    ) -> Result<ProofResult> {
        self.prove(symbols::ARKWORKS_PROVE, &[wtns_path, r1cs_path, pkey_path])
    }

    fn lambdaworks_prove(&self, wtns_path: &str, r1cs_path: &str) -> Result<ProofResult> {
        check_lambdaworks_r1cs(r1cs_path)?;
        self.prove(symbols::LAMBDAWORKS_PROVE, &[wtns_path, r1cs_path])
    }

    fn icicle_prove(
        &self,
        wtns_path: &str,
        pkey_path: &str,
        device: IcicleDevice,
    ) -> Result<ProofResult> {
        self.prove(symbols::ICICLE_PROVE, &[wtns_path, pkey_path, device.as_str()])
    }
}

/// Load `path`, call `symbol` with up to three C-string arguments, and return
/// the C-string result as UTF-8.
///
/// The symbol must have the shape `char* f(const char*, ...)`.
pub fn call_symbol(path: &Path, symbol: &str, args: &[&str]) -> Result<String> {
    let c_args = args
        .iter()
        .map(|a| {
            CString::new(*a).map_err(|_| {
                Error::InvalidArgument(format!("argument to `{symbol}` contains a NUL byte"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(path = %path.display(), symbol, "loading library");
    // SAFETY: loading runs the library's initializers; the path is the
    // prebuilt prover artifact chosen by the caller.
    #[allow(unsafe_code)]
    let lib = unsafe { Library::new(path) }.map_err(Error::native)?;

    // The result is copied before `lib` drops and the library may be unmapped.
    call_loaded(&lib, symbol, &c_args).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junk_library() -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(f.path(), b"not a shared object").unwrap();
        f
    }

    #[test]
    fn refuses_bridged_runtime() {
        let lib = junk_library();
        let err = DirectBackend::new(lib.path(), Runtime::Bridged).unwrap_err();
        assert!(matches!(
            err,
            Error::WrongRuntime {
                required: Runtime::Direct,
                actual: Runtime::Bridged
            }
        ));
    }

    #[test]
    fn refuses_missing_library() {
        let err = DirectBackend::new("/no/such/libcircomkit_ffi.so", Runtime::Direct).unwrap_err();
        assert!(matches!(err, Error::LibraryNotFound { .. }));
    }

    #[test]
    fn lambdaworks_precondition_before_loading() {
        // A junk file would fail to load, so an InvalidArgument proves no load happened.
        let lib = junk_library();
        let backend = DirectBackend::new(lib.path(), Runtime::Direct).unwrap();
        let err = backend.lambdaworks_prove("w.wtns.json", "circuit.r1cs").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{err:?}");
    }

    #[test]
    fn loader_errors_pass_through() {
        let lib = junk_library();
        let backend = DirectBackend::new(lib.path(), Runtime::Direct).unwrap();
        let err = backend.echo("hi").unwrap_err();
        match err {
            Error::Native(inner) => assert!(inner.downcast_ref::<libloading::Error>().is_some()),
            other => panic!("expected native error, got {other:?}"),
        }
    }
}
