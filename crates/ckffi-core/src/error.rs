//! Error kinds surfaced by the binding layer.
//!
//! Every failure is fatal for the call that produced it: there is no retry and
//! no degraded mode. Failures raised by the loader or the bridge themselves are
//! carried in [`Error::Native`] untouched, so callers can downcast to the
//! original error type.

use std::path::PathBuf;

use crate::runtime::Runtime;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything the binding layer can fail with.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operating system has no prebuilt artifact.
    #[error("Unsupported OS (platform): {os}")]
    UnsupportedPlatform {
        /// OS identifier as reported by the host.
        os: String,
    },

    /// The CPU architecture has no prebuilt artifact.
    #[error("Unsupported ARCH: {arch}")]
    UnsupportedArchitecture {
        /// Architecture identifier as reported by the host.
        arch: String,
    },

    /// The release server answered with a non-success status.
    #[error("failed to download {url}: HTTP {status}")]
    DownloadFailed {
        /// Requested URL.
        url: String,
        /// HTTP status code of the response.
        status: u16,
    },

    /// The download never produced a response (DNS, TLS, connection reset, ...).
    #[error("failed to download {url}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A backend was constructed under a runtime it does not support.
    #[error("backend requires the {required} runtime, but this is {actual}")]
    WrongRuntime {
        /// Runtime the backend needs.
        required: Runtime,
        /// Runtime that was detected or injected.
        actual: Runtime,
    },

    /// No file exists at the configured library path.
    #[error("No library exists at {}", path.display())]
    LibraryNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// A call argument was rejected before crossing the FFI boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Text returned by the bridge could not be decoded.
    #[error("cannot decode bridge output: {0}")]
    Encoding(String),

    /// The native symbol returned a null pointer.
    #[error("native symbol `{symbol}` returned null")]
    NullResponse {
        /// Symbol that was called.
        symbol: String,
    },

    /// The native library returned text that is not the expected JSON.
    #[error("malformed proof output: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Failure raised by the loader or bridge, propagated unchanged.
    #[error(transparent)]
    Native(Box<dyn std::error::Error + Send + Sync>),

    /// Filesystem failure (e.g. while saving a downloaded artifact).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a loader/bridge error without altering it.
    pub fn native<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Native(Box::new(err))
    }
}
