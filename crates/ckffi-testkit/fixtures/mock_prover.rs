//! Stand-in for the prover library: same exported symbols, same shapes.
//!
//! Built as a cdylib by `ckffi_testkit::fixture_library`. Results are leaked,
//! as the real library's are.

use std::ffi::{c_char, CStr, CString};
use std::time::Duration;

fn text(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn leak(s: String) -> *const c_char {
    CString::new(s).map_or(std::ptr::null(), |c| c.into_raw().cast_const())
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn proof(inputs: &[String]) -> *const c_char {
    let inputs: Vec<String> = inputs.iter().map(|s| quote(s)).collect();
    leak(format!(
        concat!(
            r#"{{"proof":{{"pi_a":["1","2","1"],"pi_b":[["1","0"],["2","0"],["1","0"]],"#,
            r#""pi_c":["3","4","1"],"protocol":"groth16","curve":"bn128","inputs":[{}]}},"#,
            r#""publicSignals":["6","2"]}}"#
        ),
        inputs.join(",")
    ))
}

#[no_mangle]
pub extern "C" fn echo(input: *const c_char) -> *const c_char {
    leak(text(input))
}

#[no_mangle]
pub extern "C" fn arkworks_prove(
    wtns: *const c_char,
    r1cs: *const c_char,
    pkey: *const c_char,
) -> *const c_char {
    proof(&[text(wtns), text(r1cs), text(pkey)])
}

#[no_mangle]
pub extern "C" fn lambdaworks_prove(wtns: *const c_char, r1cs: *const c_char) -> *const c_char {
    proof(&[text(wtns), text(r1cs)])
}

#[no_mangle]
pub extern "C" fn icicle_prove(
    wtns: *const c_char,
    pkey: *const c_char,
    device: *const c_char,
) -> *const c_char {
    proof(&[text(wtns), text(pkey), text(device)])
}

/// Sleeps for the given number of milliseconds.
#[no_mangle]
pub extern "C" fn sleepy(ms: *const c_char) -> *const c_char {
    let ms: u64 = text(ms).parse().unwrap_or(0);
    std::thread::sleep(Duration::from_millis(ms));
    leak(format!("slept {ms}"))
}

#[no_mangle]
pub extern "C" fn null_result(_input: *const c_char) -> *const c_char {
    std::ptr::null()
}
