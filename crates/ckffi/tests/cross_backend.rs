//! Both bindings against a real artifact must agree.
//!
//! Requires:
//! - `CIRCOMKIT_FFI_LIB`: path to `libcircomkit_ffi-<os>-<arch>.<ext>`
//! - `CIRCOMKIT_FFI_FIXTURES`: directory with `mul3.wtns`, `mul3.r1cs`,
//!   `mul3.r1cs.json` and `mul3_groth16.zkey`
//!
//! Otherwise the tests are *politely skipped*. Everything runs in one test
//! function so the bridge binding never races itself for the library name.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use ckffi::{open_backend, BackendKind, Error, ProverBackend, Runtime};

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).map(PathBuf::from)
}

fn fixture(dir: &Path, name: &str) -> String {
    dir.join(name).to_str().unwrap().to_owned()
}

fn backends(lib: &Path) -> Vec<(String, Box<dyn ProverBackend>)> {
    let mut out = Vec::new();
    for runtime in [Runtime::Direct, Runtime::Bridged] {
        for kind in [BackendKind::Direct, BackendKind::Bridge] {
            if kind == BackendKind::Direct && !runtime.has_direct_loader() {
                continue;
            }
            out.push((
                format!("{kind}/{runtime}"),
                open_backend(kind, lib, runtime).unwrap(),
            ));
        }
    }
    out
}

#[test]
fn bindings_agree_on_real_library() {
    let (Some(lib), Some(fixtures)) = (
        env_path("CIRCOMKIT_FFI_LIB"),
        env_path("CIRCOMKIT_FFI_FIXTURES"),
    ) else {
        eprintln!("skipping: set CIRCOMKIT_FFI_LIB and CIRCOMKIT_FFI_FIXTURES");
        return;
    };
    let wtns = fixture(&fixtures, "mul3.wtns");
    let r1cs = fixture(&fixtures, "mul3.r1cs");
    let r1cs_json = fixture(&fixtures, "mul3.r1cs.json");
    let pkey = fixture(&fixtures, "mul3_groth16.zkey");

    let mut first = None;
    for (label, b) in backends(&lib) {
        assert_eq!(b.echo("hi theree").unwrap(), "hi theree", "{label}");

        let ark = b.arkworks_prove(&wtns, &r1cs, &pkey).unwrap();
        let g = ark.groth16().unwrap();
        assert_eq!(g.protocol, "groth16", "{label}");
        assert!(!ark.public_signals.is_empty(), "{label}");

        let lw = b.lambdaworks_prove(&wtns, &r1cs_json).unwrap();
        assert_eq!(lw.public_signals.len(), ark.public_signals.len(), "{label}");

        let err = b.lambdaworks_prove(&wtns, &r1cs).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "{label}: {err:?}");

        // Proofs are randomized; only the shape and the public signals match.
        let first = first.get_or_insert_with(|| ark.clone());
        assert!(first.same_shape(&ark), "{label}");
        assert_eq!(first.public_signals, ark.public_signals, "{label}");
    }
}
