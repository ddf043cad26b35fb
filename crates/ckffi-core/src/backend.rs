//! Backend contract for calling into the native prover.
//!
//! Implementors own a path to the shared library and expose one method per
//! exported symbol. Every method crosses the FFI boundary at most once, blocks
//! for the full duration of the native call, and either returns a complete
//! result or an error; there is no partial state.
//!
//! ## Contracts implementors should uphold
//! - `echo` returns its input unchanged; any encoding work must be invisible.
//! - `lambdaworks_prove` rejects constraint-system paths that do not end in
//!   `.json` **before** touching the library (see [`check_lambdaworks_r1cs`]).
//! - Native failures are propagated as [`crate::Error::Native`], not rewritten.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, ProofResult, Result};

/// Exported symbol names of the native library.
pub mod symbols {
    /// `char* echo(const char*)`
    pub const ECHO: &str = "echo";
    /// `char* arkworks_prove(const char* wtns, const char* r1cs, const char* pkey)`
    pub const ARKWORKS_PROVE: &str = "arkworks_prove";
    /// `char* lambdaworks_prove(const char* wtns, const char* r1cs_json)`
    pub const LAMBDAWORKS_PROVE: &str = "lambdaworks_prove";
    /// `char* icicle_prove(const char* wtns, const char* pkey, const char* device)`
    pub const ICICLE_PROVE: &str = "icicle_prove";
}

/// Device for the ICICLE prover.
///
/// ICICLE proving is unstable in the native library; devices are passed
/// through without checking that they are actually available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IcicleDevice {
    /// Host CPU.
    Cpu,
    /// NVIDIA CUDA.
    Cuda,
    /// Apple Metal.
    Metal,
}

impl IcicleDevice {
    /// Name sent to the native library.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Cuda => "CUDA",
            Self::Metal => "METAL",
        }
    }
}

impl fmt::Display for IcicleDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IcicleDevice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CPU" => Ok(Self::Cpu),
            "CUDA" => Ok(Self::Cuda),
            "METAL" => Ok(Self::Metal),
            other => Err(Error::InvalidArgument(format!(
                "unknown icicle device `{other}` (use CPU|CUDA|METAL)"
            ))),
        }
    }
}

/// The capability interface every backend satisfies.
///
/// Object safe, so hosts can hold a `Box<dyn ProverBackend>` chosen once at
/// startup. `Debug` is required so such a box can appear in logs and
/// assertions.
pub trait ProverBackend: fmt::Debug {
    /// Short name of the binding mechanism, for logs.
    fn name(&self) -> &'static str;

    /// Path to the shared library.
    fn path(&self) -> &Path;

    /// Round-trip `input` through the native library.
    fn echo(&self, input: &str) -> Result<String>;

    /// Prove with Arkworks.
    ///
    /// `wtns_path` is a `.wtns`/`.wtns.json` witness, `r1cs_path` an `.r1cs`
    /// constraint system and `pkey_path` a `.zkey` proving key. The native
    /// library opens the files itself.
    fn arkworks_prove(&self, wtns_path: &str, r1cs_path: &str, pkey_path: &str)
        -> Result<ProofResult>;

    /// Prove with Lambdaworks. `r1cs_path` must be the JSON export of the
    /// constraint system.
    fn lambdaworks_prove(&self, wtns_path: &str, r1cs_path: &str) -> Result<ProofResult>;

    /// Prove with ICICLE on `device`. Unstable in the native library.
    fn icicle_prove(
        &self,
        wtns_path: &str,
        pkey_path: &str,
        device: IcicleDevice,
    ) -> Result<ProofResult>;
}

/// Lambdaworks reads the constraint system as JSON; anything else is refused
/// here rather than handed to the native side.
pub fn check_lambdaworks_r1cs(r1cs_path: &str) -> Result<()> {
    if r1cs_path.ends_with(".json") {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "r1cs path must be a JSON file, got `{r1cs_path}`"
        )))
    }
}

/// Fail with [`Error::LibraryNotFound`] unless a file exists at `path`.
pub fn ensure_library_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::LibraryNotFound {
            path: path.to_path_buf(),
        })
    }
}
