//! ckffi-core: shared types for the circomkit-ffi host bindings.
//!
//! This crate defines the **stable boundary** used by every backend crate:
//! - platform resolution of the prebuilt artifact filename,
//! - the [`ProverBackend`] contract both bindings implement,
//! - the parsed [`ProofResult`] returned by every proving call,
//! - the [`Runtime`] flag and the single encode/decode pair for bridge text,
//! - the crate-wide [`Error`] and environment [`Settings`].
//!
//! ```no_run
//! use ckffi_core::{ArtifactDescriptor, ProverBackend};
//!
//! # fn demo(backend: &dyn ProverBackend) -> ckffi_core::Result<()> {
//! let artifact = ArtifactDescriptor::current()?;
//! println!("expecting {}", artifact.filename);
//!
//! assert_eq!(backend.echo("hi theree")?, "hi theree");
//! let out = backend.arkworks_prove("w.wtns", "c.r1cs", "c.zkey")?;
//! println!("{} public signals", out.public_signals.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Platform and architecture resolution for the release artifact.
pub mod artifact;
/// The capability interface every backend satisfies.
pub mod backend;
/// UTF-8 / UTF-16 normalization for text crossing the bridge.
pub mod encoding;
/// Error kinds shared by all binding crates.
pub mod error;
/// JSON/CBOR helpers for persisting proof results.
pub mod io;
/// Parsed proving output.
pub mod proof;
/// Host runtime flag and environment-driven settings.
pub mod runtime;

// ---- Re-exports for workspace compatibility ----
pub use artifact::*;
pub use backend::*;
pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use proof::*;
pub use runtime::*;

/// Commonly-used items for quick imports.
///
/// ```rust
/// use ckffi_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        artifact::{lib_path, ArtifactDescriptor},
        backend::{IcicleDevice, ProverBackend},
        error::{Error, Result},
        proof::ProofResult,
        runtime::{Runtime, Settings},
    };
}
