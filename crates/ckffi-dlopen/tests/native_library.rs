//! Smoke test against a real circomkit-ffi artifact.
//!
//! Set `CIRCOMKIT_FFI_LIB=/abs/path/to/libcircomkit_ffi-<os>-<arch>.<ext>` to
//! run it; otherwise the test is *politely skipped*.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use ckffi_core::{ProverBackend, Runtime};
use ckffi_dlopen::DirectBackend;

#[test]
fn echo_through_real_library() {
    let Some(path) = std::env::var_os("CIRCOMKIT_FFI_LIB").map(PathBuf::from) else {
        eprintln!("skipping: set CIRCOMKIT_FFI_LIB to run against the native library");
        return;
    };
    let lib = DirectBackend::new(path, Runtime::Direct).unwrap();
    assert_eq!(lib.echo("hi theree").unwrap(), "hi theree");
}
