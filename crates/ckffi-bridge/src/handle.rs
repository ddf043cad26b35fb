//! Scoped acquisition of the bridge handle.
//!
//! [`OpenHandle`] opens the named library if the backend has it closed and
//! closes it again when dropped, so the handle is released whether the call
//! returns, fails, or unwinds.

use ckffi_core::{Error, Result};

use crate::{Bridge, BridgeBackend};

/// An open bridge handle borrowed from a [`BridgeBackend`] for one call.
#[must_use = "the handle is closed as soon as it is dropped"]
pub struct OpenHandle<'a, B: Bridge> {
    backend: &'a BridgeBackend<B>,
}

impl<'a, B: Bridge> OpenHandle<'a, B> {
    /// Open the backend's library (if closed) for the lifetime of the guard.
    pub fn acquire(backend: &'a BridgeBackend<B>) -> Result<Self> {
        backend.open_if_closed()?;
        Ok(Self { backend })
    }

    /// Call `func` through the bridge with already-encoded arguments.
    pub fn load(&self, func: &str, args: &[Vec<u8>]) -> Result<Vec<u8>> {
        self.backend
            .bridge
            .load(&self.backend.library, func, args)
            .map_err(Error::native)
    }
}

impl<B: Bridge> Drop for OpenHandle<'_, B> {
    fn drop(&mut self) {
        self.backend.close_if_open();
    }
}
