//! Saving and loading [`ProofResult`]s.
//!
//! The format follows the file extension: `.json` or `.cbor`, matched
//! case-insensitively. Reads refuse anything else; writes fall back to JSON.
//! JSON files use the wire key `publicSignals`, so snarkjs tooling can read
//! them as-is.

use crate::ProofResult;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk encoding of a proof result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofFormat {
    /// Pretty-printed JSON.
    Json,
    /// CBOR via `ciborium`.
    Cbor,
}

impl ProofFormat {
    /// Format named by the extension of `path`, if it names one.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("cbor") {
            Some(Self::Cbor)
        } else {
            None
        }
    }
}

/// Read `path` in the given format.
pub fn read_proof(path: &Path, format: ProofFormat) -> Result<ProofResult> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(file);
    match format {
        ProofFormat::Json => serde_json::from_reader(rdr)
            .with_context(|| format!("decode JSON proof result from {}", path.display())),
        ProofFormat::Cbor => ciborium::de::from_reader(rdr)
            .with_context(|| format!("decode CBOR proof result from {}", path.display())),
    }
}

/// Write `result` to `path` in the given format, creating parent directories.
pub fn write_proof(path: &Path, result: &ProofResult, format: ProofFormat) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    match format {
        ProofFormat::Json => serde_json::to_writer_pretty(&mut w, result)
            .with_context(|| format!("encode JSON proof result to {}", path.display()))?,
        ProofFormat::Cbor => ciborium::ser::into_writer(result, &mut w)
            .with_context(|| format!("encode CBOR proof result to {}", path.display()))?,
    }
    // Dropping a BufWriter discards the final write error.
    w.flush().with_context(|| format!("flush {}", path.display()))
}

/// Read, picking the format from the extension.
pub fn read_proof_auto<P: AsRef<Path>>(path: P) -> Result<ProofResult> {
    let path = path.as_ref();
    let Some(format) = ProofFormat::from_path(path) else {
        bail!(
            "cannot tell the format of {} (expected .json or .cbor)",
            path.display()
        );
    };
    read_proof(path, format)
}

/// Write, picking the format from the extension (JSON when unrecognized).
pub fn write_proof_auto<P: AsRef<Path>>(path: P, result: &ProofResult) -> Result<()> {
    let path = path.as_ref();
    let format = ProofFormat::from_path(path).unwrap_or(ProofFormat::Json);
    write_proof(path, result, format)
}
