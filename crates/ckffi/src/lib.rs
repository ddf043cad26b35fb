//! `ckffi`: host bindings for the circomkit-ffi native prover.
//!
//! The host chooses a backend **once**, at construction; nothing downstream
//! branches on the runtime again.
//!
//! ```no_run
//! use ckffi::{open_backend, BackendKind, Settings};
//!
//! let settings = Settings::from_env();
//! let path = settings.lib_path()?;
//! let prover = open_backend(BackendKind::Auto, path, settings.runtime)?;
//!
//! assert_eq!(prover.echo("hi theree")?, "hi theree");
//! let out = prover.arkworks_prove(
//!     "build/multiplier_3/default/witness.wtns",
//!     "build/multiplier_3/multiplier_3.r1cs",
//!     "build/multiplier_3/groth16_pkey.zkey",
//! )?;
//! println!("{:?}", out.public_signals);
//! # Ok::<(), ckffi::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use ckffi_bridge::{Bridge, BridgeBackend, BridgeError, LibraryBridge};
pub use ckffi_core::prelude::*;
pub use ckffi_core::{artifact_filename, io, TextEncoding};
pub use ckffi_dlopen::DirectBackend;

/// Artifact download (enabled by the `fetch` feature).
#[cfg(feature = "fetch")]
pub mod fetch {
    pub use ckffi_fetch::{fetch_artifact, fetch_if_missing, Fetcher};
}

/// Which binding to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Direct dynamic-load binding.
    Direct,
    /// Named-handle bridge binding.
    Bridge,
    /// Direct when the runtime has a direct loader, bridge otherwise.
    #[default]
    Auto,
}

impl BackendKind {
    /// Resolve [`BackendKind::Auto`] against `runtime`.
    #[must_use]
    pub const fn resolve(self, runtime: Runtime) -> Self {
        match self {
            Self::Auto if runtime.has_direct_loader() => Self::Direct,
            Self::Auto => Self::Bridge,
            other => other,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Bridge => "bridge",
            Self::Auto => "auto",
        })
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "dlopen" => Ok(Self::Direct),
            "bridge" | "bridged" => Ok(Self::Bridge),
            "auto" => Ok(Self::Auto),
            other => Err(Error::InvalidArgument(format!(
                "unknown backend `{other}` (use direct|bridge|auto)"
            ))),
        }
    }
}

/// Construct the chosen backend for the library at `path`.
///
/// The bridge backend uses the process-wide [`LibraryBridge`] speaking the
/// runtime's encoding.
pub fn open_backend(
    kind: BackendKind,
    path: impl Into<PathBuf>,
    runtime: Runtime,
) -> Result<Box<dyn ProverBackend>> {
    let kind = kind.resolve(runtime);
    let path = path.into();
    tracing::debug!(%kind, %runtime, path = %path.display(), "constructing backend");
    Ok(match kind {
        BackendKind::Direct => Box::new(DirectBackend::new(path, runtime)?),
        BackendKind::Bridge | BackendKind::Auto => Box::new(BridgeBackend::new(
            path,
            LibraryBridge::new(runtime.bridge_encoding()),
            runtime,
        )?),
    })
}
