//! Artifact fetcher for the prebuilt circomkit-ffi library.
//!
//! One best-effort GET against the release location: no retry, no checksum,
//! no resume. A successful body overwrites whatever is already at the target
//! path. The "download only if missing" policy is a separate, caller-side
//! helper ([`Fetcher::fetch_if_missing`]).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::fs;
use std::path::{Path, PathBuf};

use ckffi_core::{artifact_filename, Error, Result, Settings, DEFAULT_RELEASE_URL};
use tracing::{debug, info};

/// Downloads release artifacts from a base URL.
#[derive(Debug, Clone)]
pub struct Fetcher {
    base_url: String,
    system_proxy: bool,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_RELEASE_URL)
    }
}

impl Fetcher {
    /// Fetcher rooted at the default release location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher rooted at `base_url` (the filename is appended).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            system_proxy: true,
        }
    }

    /// Ignore `HTTP(S)_PROXY` and connect directly (mirrors, loopback servers).
    #[must_use]
    pub const fn without_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }

    /// Fetcher configured from [`Settings::release_url`].
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_base_url(settings.release_url.clone())
    }

    /// Download URL for `filename`.
    #[must_use]
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{filename}", self.base_url)
    }

    /// Download this machine's artifact into `target_dir`; returns the saved path.
    pub fn fetch_into<P: AsRef<Path>>(&self, target_dir: P) -> Result<PathBuf> {
        let filename = artifact_filename()?;
        self.fetch_named(target_dir.as_ref(), &filename)
    }

    /// Return the local artifact path, downloading it first if absent.
    pub fn fetch_if_missing<P: AsRef<Path>>(&self, target_dir: P) -> Result<PathBuf> {
        let path = target_dir.as_ref().join(artifact_filename()?);
        if path.is_file() {
            debug!(path = %path.display(), "library already present");
            return Ok(path);
        }
        self.fetch_into(target_dir)
    }

    fn fetch_named(&self, target_dir: &Path, filename: &str) -> Result<PathBuf> {
        let url = self.url_for(filename);
        info!(%url, "downloading library {filename}");

        let transport = |e: reqwest::Error| Error::Transport {
            url: url.clone(),
            source: Box::new(e),
        };
        let mut builder = reqwest::blocking::Client::builder();
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(transport)?;
        let response = client.get(&url).send().map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadFailed {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(transport)?;

        let path = target_dir.join(filename);
        info!(path = %path.display(), bytes = body.len(), "saving library");
        fs::write(&path, &body)?;
        Ok(path)
    }
}

/// Download this machine's artifact from the default release location.
pub fn fetch_artifact<P: AsRef<Path>>(target_dir: P) -> Result<PathBuf> {
    Fetcher::new().fetch_into(target_dir)
}

/// [`fetch_artifact`], skipped when the file already exists.
pub fn fetch_if_missing<P: AsRef<Path>>(target_dir: P) -> Result<PathBuf> {
    Fetcher::new().fetch_if_missing(target_dir)
}
