//! The keyed-MAC (AES-CMAC) context.
//!
//! One incremental init/update/final protocol over two backends chosen at
//! build time: the default [`streaming`] backend drives the naturally
//! incremental RustCrypto primitive, while the `openssl-backend` feature
//! swaps in [`openssl`], which buffers the message and signs once at final.
//! Callers cannot tell the two apart: same state machine, same call
//! sequence, same tags.
//!
//! The CMAC construction fixes the chaining IV at the all-zero block. That
//! is a property of the MAC mode, not a caller choice; both backends
//! reproduce it exactly, and any peer validating these tags depends on it.

mod streaming;

#[cfg(feature = "openssl-backend")]
mod openssl;

#[cfg(not(feature = "openssl-backend"))]
use streaming::State;

#[cfg(feature = "openssl-backend")]
use openssl::State;

use tracing::debug;

/// Tag and cipher block length in bytes. Every supported algorithm is an
/// AES variant, so this never varies, but finals still report it
/// explicitly.
pub const MAC_BLOCK_LEN: usize = 16;

/// Cipher selection for the keyed MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    /// AES-128-CBC based CMAC.
    Aes128,
    /// AES-192-CBC based CMAC.
    Aes192,
    /// AES-256-CBC based CMAC.
    Aes256,
}

impl MacAlgorithm {
    /// Map a caller algorithm id. Ids outside the table select AES-128,
    /// preserving the historical mapping.
    pub const fn from_id(id: i32) -> Self {
        match id {
            2 => Self::Aes192,
            3 => Self::Aes256,
            _ => Self::Aes128,
        }
    }

    /// Key length the selected cipher requires.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

/// MAC context failures, flattened to 0 at the FFI edge.
#[derive(Debug, thiserror::Error)]
pub enum MacError {
    /// update/final before init.
    #[error("MAC context is not initialized")]
    NotInitialized,
    /// Key length does not match the selected cipher.
    #[error("invalid key length {0} for the selected cipher")]
    KeyLength(usize),
    /// Output buffer cannot hold the tag.
    #[error("output capacity {have} cannot hold a {need}-byte tag")]
    ShortOutput {
        /// Caller-supplied capacity.
        have: usize,
        /// Tag length.
        need: usize,
    },
    /// The backend primitive reported failure.
    #[error("MAC backend failure")]
    Backend,
}

/// A keyed-MAC context.
///
/// Lifecycle: `new` → `init(algorithm, key)` → `update`* → `finalize`.
/// Finalizing consumes the keyed state; the context must be re-initialized
/// before computing another tag.
pub struct MacContext {
    state: Option<State>,
}

impl std::fmt::Debug for MacContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacContext")
            .field("initialized", &self.state.is_some())
            .finish()
    }
}

impl MacContext {
    /// Create an uninitialized context.
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Key the context for the selected algorithm.
    pub fn init(&mut self, algorithm: MacAlgorithm, key: &[u8]) -> Result<(), MacError> {
        if key.len() != algorithm.key_len() {
            return Err(MacError::KeyLength(key.len()));
        }
        debug!(?algorithm, "keyed MAC context initialized");
        self.state = Some(State::init(algorithm, key)?);
        Ok(())
    }

    /// Feed message bytes. May be called zero or more times between init
    /// and finalize.
    pub fn update(&mut self, data: &[u8]) -> Result<(), MacError> {
        self.state
            .as_mut()
            .ok_or(MacError::NotInitialized)?
            .update(data)
    }

    /// Produce the tag into `out`, returning its length (always
    /// [`MAC_BLOCK_LEN`]).
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<usize, MacError> {
        if self.state.is_none() {
            return Err(MacError::NotInitialized);
        }
        if out.len() < MAC_BLOCK_LEN {
            return Err(MacError::ShortOutput {
                have: out.len(),
                need: MAC_BLOCK_LEN,
            });
        }
        let state = self.state.take().ok_or(MacError::NotInitialized)?;
        state.finalize(&mut out[..MAC_BLOCK_LEN])?;
        Ok(MAC_BLOCK_LEN)
    }
}

impl Default for MacContext {
    fn default() -> Self {
        Self::new()
    }
}
