//! Default bridge against the system C library.
//!
//! `strdup` stands in for `echo` (same `char* f(const char*)` shape). Each
//! test registers a unique name because the registry is process-wide and
//! tests run in parallel. Soft-skips when no libc file can be found.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ckffi_bridge::{Bridge, BridgeBackend, BridgeError, LibraryBridge, DEFAULT_LIBRARY_NAME};
use ckffi_core::encoding::{decode, encode, TextEncoding};
use ckffi_core::Runtime;
use ckffi_testkit::system_libc;
use proptest::prelude::*;

/// Encode, call `strdup` through the bridge, decode: what a backend does.
fn strdup_via(bridge: &LibraryBridge, name: &str, input: &str) -> String {
    let wire = bridge.wire();
    let out = bridge.load(name, "strdup", &[encode(input, wire)]).unwrap();
    decode(&out, wire).unwrap()
}

#[test]
fn both_wire_encodings_round_trip() {
    let Some(libc) = system_libc() else {
        eprintln!("skipping: no libc found");
        return;
    };
    for (name, wire) in [
        ("ckffi_it_utf8", TextEncoding::Utf8),
        ("ckffi_it_utf16", TextEncoding::Utf16),
    ] {
        let bridge = LibraryBridge::new(wire);
        bridge.open(name, &libc).unwrap();
        assert_eq!(strdup_via(&bridge, name, "hi theree"), "hi theree");
        assert_eq!(strdup_via(&bridge, name, "証明 ok"), "証明 ok");
        bridge.close(name);
        assert!(!LibraryBridge::is_registered(name));
    }
}

#[test]
fn second_open_under_same_name_is_refused() {
    let Some(libc) = system_libc() else {
        eprintln!("skipping: no libc found");
        return;
    };
    let name = "ckffi_it_collide";
    let bridge = LibraryBridge::new(TextEncoding::Utf8);
    bridge.open(name, &libc).unwrap();

    let err = bridge.open(name, &libc).unwrap_err();
    assert!(matches!(err, BridgeError::AlreadyOpen { .. }));
    // The first registration survives the refused open.
    assert_eq!(strdup_via(&bridge, name, "still here"), "still here");

    bridge.close(name);
    let err = bridge.load(name, "strdup", &[b"x".to_vec()]).unwrap_err();
    assert!(matches!(err, BridgeError::NotOpen { .. }));
}

#[test]
fn backend_construction_alone_registers_nothing() {
    let Some(libc) = system_libc() else {
        eprintln!("skipping: no libc found");
        return;
    };
    for runtime in [Runtime::Direct, Runtime::Bridged] {
        let backend =
            BridgeBackend::new(&libc, LibraryBridge::new(runtime.bridge_encoding()), runtime)
                .unwrap();
        assert!(!backend.is_open());
        drop(backend);
        assert!(!LibraryBridge::is_registered(DEFAULT_LIBRARY_NAME));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_text_survives_utf16_bridge(s in "[^\u{0}]{0,64}") {
        let Some(libc) = system_libc() else {
            return Ok(());
        };
        let name = "ckffi_it_prop";
        let bridge = LibraryBridge::new(TextEncoding::Utf16);
        bridge.open(name, &libc).unwrap();
        let got = strdup_via(&bridge, name, &s);
        bridge.close(name);
        prop_assert_eq!(got, s);
    }
}
