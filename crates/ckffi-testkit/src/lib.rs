//! Fixtures shared by the binding crates' tests.
//!
//! - [`system_libc`]: the C library, whose `strdup` has the shape of `echo`.
//! - [`fixture_library`]: a small cdylib exporting the prover's symbols with
//!   canned answers, compiled once per test binary with the toolchain running
//!   the tests.
//!
//! Both return `None` when unavailable; callers skip politely.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

/// Public signals every fixture proof carries.
pub const FIXTURE_SIGNALS: [&str; 2] = ["6", "2"];

/// Path of the system C library, if one is found.
#[must_use]
pub fn system_libc() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/lib/x86_64-linux-gnu/libc.so.6",
        "/usr/lib/x86_64-linux-gnu/libc.so.6",
        "/lib/aarch64-linux-gnu/libc.so.6",
        "/usr/lib/aarch64-linux-gnu/libc.so.6",
        "/lib64/libc.so.6",
        "/usr/lib64/libc.so.6",
        "/usr/lib/libc.so.6",
        "/lib/libc.so.6",
    ];
    CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file())
}

/// Path of the compiled fixture library.
///
/// Exports `echo`, `arkworks_prove`, `lambdaworks_prove`, `icicle_prove`
/// (proofs embed their arguments under `proof.inputs`), `sleepy(ms)` and
/// `null_result`.
#[must_use]
pub fn fixture_library() -> Option<&'static Path> {
    static BUILT: OnceLock<Option<(tempfile::TempDir, PathBuf)>> = OnceLock::new();
    BUILT
        .get_or_init(build_fixture)
        .as_ref()
        .map(|(_, path)| path.as_path())
}

/// `rustc` from `RUSTC`, else next to the `cargo` running the tests, else `PATH`.
fn rustc() -> PathBuf {
    if let Some(rustc) = std::env::var_os("RUSTC") {
        return PathBuf::from(rustc);
    }
    let exe = format!("rustc{}", std::env::consts::EXE_SUFFIX);
    std::env::var_os("CARGO")
        .map(|cargo| PathBuf::from(cargo).with_file_name(&exe))
        .filter(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from("rustc"))
}

fn build_fixture() -> Option<(tempfile::TempDir, PathBuf)> {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/mock_prover.rs");
    let dir = tempfile::Builder::new().prefix("ckffi-fixture").tempdir().ok()?;
    let out = dir.path().join(format!(
        "{}mock_prover.{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_EXTENSION
    ));
    let status = Command::new(rustc())
        .args(["--edition", "2021", "--crate-type", "cdylib", "--crate-name", "mock_prover"])
        .args(["-C", "opt-level=0", "--cap-lints", "allow", "-o"])
        .arg(&out)
        .arg(&src)
        .status();
    match status {
        Ok(s) if s.success() && out.is_file() => Some((dir, out)),
        Ok(s) => {
            tracing::warn!(%s, "fixture library failed to build");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "rustc not available for the fixture library");
            None
        }
    }
}
