//! `ckffi-bridge`: binding through a generic, name-keyed FFI bridge.
//!
//! The bridge is three primitives supplied by the caller (see [`Bridge`]):
//! open a library under a name, close a name, and load-and-call a function on
//! a named library with string arguments. [`LibraryBridge`] is the default,
//! process-wide implementation.
//!
//! ## Lifecycle
//! `Closed --open--> Open --close--> Closed`, starting `Closed`. Every
//! operation acquires the handle for the duration of one call and releases it
//! on **every** exit path, including a failing native call (see
//! [`handle`]). Dropping the backend closes a handle left open.
//!
//! ## Text
//! The bridge speaks the encoding of the host runtime. The backend takes the
//! [`TextEncoding`] once at construction and runs every argument and result
//! through [`ckffi_core::encoding`]; callers only ever see UTF-8.
//!
//! ## Single flight
//! The open flag is a `Cell`, so a `BridgeBackend` is `!Sync`: overlapping
//! calls on one instance cannot be expressed. The bridge's registry is still
//! process-wide and keyed by name; two instances using the same name contend
//! for one slot (see [`BridgeBackend::with_library_name`]).

#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ckffi_core::encoding::{self, TextEncoding};
use ckffi_core::{
    check_lambdaworks_r1cs, ensure_library_exists, symbols, Error, IcicleDevice, ProofResult,
    ProverBackend, Result, Runtime,
};
use tracing::debug;

pub mod handle;
mod registry;

pub use registry::{BridgeError, LibraryBridge};

/// Name the library is registered under unless overridden.
pub const DEFAULT_LIBRARY_NAME: &str = "libcircomkit_ffi";

/// The three primitives of a generic FFI bridge.
///
/// Strings cross the bridge as bytes in the bridge's own encoding; the backend
/// does all normalization.
pub trait Bridge: fmt::Debug {
    /// Failure raised by the bridge; propagated to callers unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Register the library at `path` under `library`.
    fn open(&self, library: &str, path: &Path) -> Result<(), Self::Error>;

    /// Unregister `library` and free it.
    fn close(&self, library: &str);

    /// Call `func` on the library registered as `library`.
    fn load(&self, library: &str, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, Self::Error>;
}

impl<B: Bridge + ?Sized> Bridge for &B {
    type Error = B::Error;

    fn open(&self, library: &str, path: &Path) -> Result<(), Self::Error> {
        (**self).open(library, path)
    }

    fn close(&self, library: &str) {
        (**self).close(library);
    }

    fn load(&self, library: &str, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, Self::Error> {
        (**self).load(library, func, args)
    }
}

impl<B: Bridge + ?Sized> Bridge for Arc<B> {
    type Error = B::Error;

    fn open(&self, library: &str, path: &Path) -> Result<(), Self::Error> {
        (**self).open(library, path)
    }

    fn close(&self, library: &str) {
        (**self).close(library);
    }

    fn load(&self, library: &str, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, Self::Error> {
        (**self).load(library, func, args)
    }
}

/// Backend that goes through a [`Bridge`].
#[derive(Debug)]
pub struct BridgeBackend<B: Bridge = LibraryBridge> {
    path: PathBuf,
    library: String,
    bridge: B,
    encoding: TextEncoding,
    is_open: Cell<bool>,
}

impl BridgeBackend<LibraryBridge> {
    /// Default bridge, runtime taken from the environment.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let runtime = Runtime::detect();
        Self::new(path, LibraryBridge::new(runtime.bridge_encoding()), runtime)
    }
}

impl<B: Bridge> BridgeBackend<B> {
    /// Binding name used in logs.
    pub const NAME: &'static str = "bridge";

    /// Construct for the library at `path`, calling through `bridge`.
    ///
    /// Nothing is opened here. Fails with [`Error::LibraryNotFound`] if `path`
    /// is not a file.
    pub fn new(path: impl Into<PathBuf>, bridge: B, runtime: Runtime) -> Result<Self> {
        let path = path.into();
        ensure_library_exists(&path)?;
        Ok(Self {
            path,
            library: DEFAULT_LIBRARY_NAME.to_string(),
            bridge,
            encoding: runtime.bridge_encoding(),
            is_open: Cell::new(false),
        })
    }

    /// Register under `name` instead of [`DEFAULT_LIBRARY_NAME`], so that
    /// instances pointing at different libraries can coexist in one bridge.
    #[must_use]
    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library = name.into();
        self
    }

    /// Name the library is registered under.
    #[must_use]
    pub fn library_name(&self) -> &str {
        &self.library
    }

    /// Whether this instance currently holds an open handle.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open.get()
    }

    fn open_if_closed(&self) -> Result<()> {
        if !self.is_open.get() {
            debug!(library = %self.library, path = %self.path.display(), "opening handle");
            self.bridge
                .open(&self.library, &self.path)
                .map_err(Error::native)?;
            self.is_open.set(true);
        }
        Ok(())
    }

    fn close_if_open(&self) {
        if self.is_open.get() {
            debug!(library = %self.library, "closing handle");
            self.bridge.close(&self.library);
            self.is_open.set(false);
        }
    }

    fn call(&self, func: &str, args: &[&str]) -> Result<String> {
        let wire: Vec<Vec<u8>> = args
            .iter()
            .map(|a| encoding::encode(a, self.encoding))
            .collect();

        let handle = handle::OpenHandle::acquire(self)?;
        let out = handle.load(func, &wire)?;
        drop(handle);

        encoding::decode(&out, self.encoding)
    }

    fn prove(&self, func: &str, args: &[&str]) -> Result<ProofResult> {
        ProofResult::from_json(&self.call(func, args)?)
    }
}

impl<B: Bridge> Drop for BridgeBackend<B> {
    fn drop(&mut self) {
        self.close_if_open();
    }
}

impl<B: Bridge> ProverBackend for BridgeBackend<B> {
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
        // Checked before the handle is acquired.
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Open(String),
        Close(String),
        Load(String),
    }

    /// Bridge double that speaks `wire` and answers like the native library.
    #[derive(Debug)]
    struct Mock {
        wire: TextEncoding,
        fail_load: bool,
        events: RefCell<Vec<Event>>,
    }

    impl Mock {
        fn new(wire: TextEncoding) -> Self {
            Self {
                wire,
                fail_load: false,
                events: RefCell::default(),
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }

        fn respond(&self, text: &str) -> Vec<u8> {
            let mut out = encoding::encode(text, self.wire);
            if self.wire == TextEncoding::Utf16 {
                out.extend_from_slice(&[0, 0]);
            }
            out
        }
    }

    impl Bridge for Mock {
        type Error = BridgeError;

        fn open(&self, library: &str, _path: &Path) -> Result<(), BridgeError> {
            self.events.borrow_mut().push(Event::Open(library.into()));
            Ok(())
        }

        fn close(&self, library: &str) {
            self.events.borrow_mut().push(Event::Close(library.into()));
        }

        fn load(&self, library: &str, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, BridgeError> {
            self.events.borrow_mut().push(Event::Load(func.into()));
            if self.fail_load {
                return Err(BridgeError::NotOpen {
                    library: library.into(),
                });
            }
            let text = |i: usize| encoding::decode(&args[i], self.wire).unwrap();
            Ok(match func {
                "echo" => self.respond(&text(0)),
                "arkworks_prove" | "lambdaworks_prove" | "icicle_prove" => self.respond(
                    &serde_json::json!({
                        "proof": { "protocol": "groth16", "witness": text(0) },
                        "publicSignals": ["6"],
                    })
                    .to_string(),
                ),
                other => panic!("unexpected symbol {other}"),
            })
        }
    }

    fn library_file() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn echo_is_transparent_under_both_runtimes() {
        let lib = library_file();
        for runtime in [Runtime::Direct, Runtime::Bridged] {
            let mock = Mock::new(runtime.bridge_encoding());
            let backend = BridgeBackend::new(lib.path(), &mock, runtime).unwrap();
            assert_eq!(backend.echo("hi theree").unwrap(), "hi theree");
            assert_eq!(backend.echo("σ ∈ 𝔽_p").unwrap(), "σ ∈ 𝔽_p");
        }
    }

    #[test]
    fn each_call_opens_then_closes() {
        let lib = library_file();
        let mock = Mock::new(TextEncoding::Utf16);
        let backend = BridgeBackend::new(lib.path(), &mock, Runtime::Direct).unwrap();

        backend.echo("a").unwrap();
        assert!(!backend.is_open());
        backend.echo("b").unwrap();

        let name = DEFAULT_LIBRARY_NAME.to_string();
        assert_eq!(
            mock.events(),
            vec![
                Event::Open(name.clone()),
                Event::Load("echo".into()),
                Event::Close(name.clone()),
                Event::Open(name.clone()),
                Event::Load("echo".into()),
                Event::Close(name),
            ]
        );
    }

    #[test]
    fn failed_call_still_closes() {
        let lib = library_file();
        let mut mock = Mock::new(TextEncoding::Utf8);
        mock.fail_load = true;
        let backend = BridgeBackend::new(lib.path(), &mock, Runtime::Bridged).unwrap();

        let err = backend.echo("x").unwrap_err();
        match err {
            Error::Native(inner) => assert!(inner.downcast_ref::<BridgeError>().is_some()),
            other => panic!("expected native error, got {other:?}"),
        }
        assert!(!backend.is_open());
        assert_eq!(mock.events().last(), Some(&Event::Close(DEFAULT_LIBRARY_NAME.into())));
    }

    #[test]
    fn lambdaworks_precondition_touches_nothing() {
        let lib = library_file();
        let mock = Mock::new(TextEncoding::Utf16);
        let backend = BridgeBackend::new(lib.path(), &mock, Runtime::Direct).unwrap();

        let err = backend.lambdaworks_prove("w.wtns", "circuit.r1cs").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(mock.events().is_empty());
        assert!(!backend.is_open());
    }

    #[test]
    fn construct_and_drop_leaves_nothing_open() {
        let lib = library_file();
        let mock = Mock::new(TextEncoding::Utf8);
        drop(BridgeBackend::new(lib.path(), &mock, Runtime::Bridged).unwrap());
        assert!(mock.events().is_empty());
    }

    #[test]
    fn drop_closes_a_handle_left_open() {
        let lib = library_file();
        let mock = Mock::new(TextEncoding::Utf8);
        let backend = BridgeBackend::new(lib.path(), &mock, Runtime::Bridged)
            .unwrap()
            .with_library_name("ckffi_drop_test");
        backend.open_if_closed().unwrap();
        assert!(backend.is_open());
        drop(backend);
        assert_eq!(
            mock.events(),
            vec![
                Event::Open("ckffi_drop_test".into()),
                Event::Close("ckffi_drop_test".into())
            ]
        );
    }

    #[test]
    fn proofs_are_parsed_after_decoding() {
        let lib = library_file();
        let mock = Mock::new(TextEncoding::Utf16);
        let backend = BridgeBackend::new(lib.path(), &mock, Runtime::Direct).unwrap();

        let out = backend.arkworks_prove("mul3.wtns", "mul3.r1cs", "mul3.zkey").unwrap();
        assert_eq!(out.public_signals, vec!["6"]);
        assert_eq!(out.proof["witness"], "mul3.wtns");

        let out = backend
            .icicle_prove("mul3.wtns", "mul3.zkey", IcicleDevice::Cpu)
            .unwrap();
        assert_eq!(out.proof["protocol"], "groth16");
    }

    #[test]
    fn missing_library_fails_construction() {
        let mock = Mock::new(TextEncoding::Utf8);
        let err = BridgeBackend::new("/no/such/lib.so", &mock, Runtime::Bridged).unwrap_err();
        assert!(matches!(err, Error::LibraryNotFound { .. }));
        assert!(mock.events().is_empty());
    }
}
