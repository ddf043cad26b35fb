//! Host runtime flag and environment-driven settings.
//!
//! The runtime is decided **once**, when a backend is constructed, and then
//! carried as a value. Nothing in the call path re-detects it.
//!
//! Recognized variables:
//! - `CIRCOMKIT_FFI_RUNTIME` = `direct` | `bridged`
//! - `CIRCOMKIT_FFI_DIR` = directory holding (or receiving) the artifact
//! - `CIRCOMKIT_FFI_RELEASE_URL` = release base URL, without the filename

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::TextEncoding;

/// Environment variable selecting the [`Runtime`].
pub const RUNTIME_ENV: &str = "CIRCOMKIT_FFI_RUNTIME";
/// Environment variable overriding [`Settings::lib_dir`].
pub const DIR_ENV: &str = "CIRCOMKIT_FFI_DIR";
/// Environment variable overriding [`Settings::release_url`].
pub const RELEASE_URL_ENV: &str = "CIRCOMKIT_FFI_RELEASE_URL";

/// Where release artifacts are published; the filename is appended.
pub const DEFAULT_RELEASE_URL: &str =
    "https://github.com/erhant/circomkit-ffi/releases/latest/download";

/// Which foreign-function mechanisms the host offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    /// A direct C-ABI loader is available. The generic bridge in this host
    /// hands text over as UTF-16 with a trailing NUL unit.
    #[default]
    Direct,
    /// Native code is reachable only through the generic bridge, which passes
    /// UTF-8 text verbatim.
    Bridged,
}

impl Runtime {
    /// Read [`RUNTIME_ENV`]; unset or unrecognized values mean [`Runtime::Direct`].
    #[must_use]
    pub fn detect() -> Self {
        std::env::var(RUNTIME_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Encoding the generic bridge speaks under this runtime.
    #[must_use]
    pub const fn bridge_encoding(self) -> TextEncoding {
        match self {
            Self::Direct => TextEncoding::Utf16,
            Self::Bridged => TextEncoding::Utf8,
        }
    }

    /// Whether the direct dynamic-load binding can be used.
    #[must_use]
    pub const fn has_direct_loader(self) -> bool {
        matches!(self, Self::Direct)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Bridged => "bridged",
        })
    }
}

impl FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "bridged" => Ok(Self::Bridged),
            other => Err(format!("unknown runtime `{other}` (use direct|bridged)")),
        }
    }
}

/// Binding-layer configuration gathered from defaults and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Host runtime flag injected into backends.
    pub runtime: Runtime,
    /// Directory where the artifact is looked up and downloaded to.
    pub lib_dir: PathBuf,
    /// Release base URL.
    pub release_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: Runtime::Direct,
            lib_dir: PathBuf::from("."),
            release_url: DEFAULT_RELEASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Defaults merged with environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().merge_env(|k| std::env::var(k).ok())
    }

    /// Merge overrides from `lookup` (an environment accessor) into `self`.
    ///
    /// Empty or unrecognized values leave the current setting in place.
    #[must_use]
    pub fn merge_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rt) = lookup(RUNTIME_ENV).and_then(|v| v.parse().ok()) {
            self.runtime = rt;
        }
        if let Some(dir) = lookup(DIR_ENV).filter(|v| !v.is_empty()) {
            self.lib_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(RELEASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.release_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Full path of this machine's artifact under [`Settings::lib_dir`].
    pub fn lib_path(&self) -> crate::Result<PathBuf> {
        crate::artifact::lib_path(&self.lib_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn runtime_parses_case_insensitively() {
        assert_eq!("Direct".parse::<Runtime>().unwrap(), Runtime::Direct);
        assert_eq!(" BRIDGED ".parse::<Runtime>().unwrap(), Runtime::Bridged);
        assert!("deno".parse::<Runtime>().is_err());
    }

    #[test]
    fn only_direct_runtime_needs_utf16() {
        assert_eq!(Runtime::Direct.bridge_encoding(), TextEncoding::Utf16);
        assert_eq!(Runtime::Bridged.bridge_encoding(), TextEncoding::Utf8);
        assert!(Runtime::Direct.has_direct_loader());
        assert!(!Runtime::Bridged.has_direct_loader());
    }

    #[test]
    fn settings_merge_overrides() {
        let s = Settings::default().merge_env(env(&[
            (RUNTIME_ENV, "bridged"),
            (DIR_ENV, "/opt/ckffi"),
            (RELEASE_URL_ENV, "http://127.0.0.1:9/dl/"),
        ]));
        assert_eq!(s.runtime, Runtime::Bridged);
        assert_eq!(s.lib_dir, PathBuf::from("/opt/ckffi"));
        assert_eq!(s.release_url, "http://127.0.0.1:9/dl");
    }

    #[test]
    fn settings_ignore_garbage() {
        let s = Settings::default().merge_env(env(&[(RUNTIME_ENV, "wasm"), (DIR_ENV, "")]));
        assert_eq!(s, Settings::default());
    }
}
