//! Prebuilt artifact naming.
//!
//! Release artifacts are named `libcircomkit_ffi-{os}-{arch}.{ext}`. The OS and
//! architecture tags come from two host-reported identifiers; the extension is a
//! pure function of the OS tag.
//!
//! Both the JS-style identifiers (`darwin`, `win32`, `x64`, ...) and Rust's
//! [`std::env::consts`] identifiers (`macos`, `windows`, `x86_64`, ...) are
//! accepted.
//!
//! **Precedence:** the architecture is checked before the OS, so an
//! unsupported pair always reports [`Error::UnsupportedArchitecture`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Stem shared by every release artifact.
pub const ARTIFACT_STEM: &str = "libcircomkit_ffi";

/// Operating system tag as it appears in artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsTag {
    /// Apple macOS.
    #[serde(rename = "macOS")]
    MacOs,
    /// Linux (glibc).
    #[serde(rename = "linux")]
    Linux,
    /// Microsoft Windows.
    #[serde(rename = "windows")]
    Windows,
}

impl OsTag {
    /// All supported operating systems.
    pub const ALL: [Self; 3] = [Self::MacOs, Self::Linux, Self::Windows];

    /// Map a host OS identifier.
    #[must_use]
    pub fn from_host(os: &str) -> Option<Self> {
        match os {
            "darwin" | "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "win32" | "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Tag used in the filename.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Shared-library extension for this OS.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::MacOs => "dylib",
            Self::Linux => "so",
            Self::Windows => "dll",
        }
    }
}

impl fmt::Display for OsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture tag as it appears in artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchTag {
    /// x86-64.
    Amd64,
    /// 64-bit ARM (32-bit `arm` hosts are mapped here as well).
    Arm64,
}

impl ArchTag {
    /// All supported architectures.
    pub const ALL: [Self; 2] = [Self::Amd64, Self::Arm64];

    /// Map a host architecture identifier.
    #[must_use]
    pub fn from_host(arch: &str) -> Option<Self> {
        match arch {
            "x64" | "x86_64" => Some(Self::Amd64),
            "arm" | "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Tag used in the filename.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for ArchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved artifact for one (OS, architecture) pair.
///
/// Computed on demand; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Operating system tag.
    pub os: OsTag,
    /// Architecture tag.
    pub arch: ArchTag,
    /// File extension (derived from `os`).
    pub extension: String,
    /// Full artifact filename.
    pub filename: String,
}

impl ArtifactDescriptor {
    /// Build the descriptor for already-resolved tags.
    #[must_use]
    pub fn new(os: OsTag, arch: ArchTag) -> Self {
        let extension = os.extension().to_string();
        let filename = format!("{ARTIFACT_STEM}-{os}-{arch}.{extension}");
        Self {
            os,
            arch,
            extension,
            filename,
        }
    }

    /// Resolve from host-reported identifiers.
    pub fn resolve(os: &str, arch: &str) -> Result<Self> {
        let arch_tag = ArchTag::from_host(arch).ok_or_else(|| Error::UnsupportedArchitecture {
            arch: arch.to_string(),
        })?;
        let os_tag = OsTag::from_host(os).ok_or_else(|| Error::UnsupportedPlatform {
            os: os.to_string(),
        })?;
        Ok(Self::new(os_tag, arch_tag))
    }

    /// Resolve for the running process.
    pub fn current() -> Result<Self> {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }
}

/// Filename of the release artifact for this machine.
pub fn artifact_filename() -> Result<String> {
    ArtifactDescriptor::current().map(|d| d.filename)
}

/// Attach this machine's artifact filename to `dir`.
///
/// e.g. on an Intel Mac, `lib_path(".")` is `./libcircomkit_ffi-macOS-amd64.dylib`.
pub fn lib_path<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    Ok(dir.as_ref().join(artifact_filename()?))
}
