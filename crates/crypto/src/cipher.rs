//! The AES-256-GCM cipher context.
//!
//! Direction is recorded once at init; update, final and ctrl introspect the
//! context instead of taking it again, so a caller cannot supply
//! inconsistent direction flags mid-sequence. The underlying AEAD primitive
//! is one-shot, so update accumulates input and the whole output is released
//! by the final call; the caller-visible init/update*/final/ctrl protocol is
//! unaffected.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit};
use tracing::trace;
use zeroize::Zeroizing;

use crate::ctrl::{self, TagCommand};

/// GCM key length in bytes (AES-256).
pub const GCM_KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const GCM_NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const GCM_TAG_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Cipher context failures. The FFI edge flattens these to the backend's
/// 0-for-failure status; nothing is retried or reinterpreted.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// update/final/ctrl before init.
    #[error("cipher context is not initialized")]
    NotInitialized,
    /// A second operation on a context that already ran its final.
    #[error("cipher context already finalized")]
    AlreadyFinalized,
    /// Decrypting final without a tag supplied through set-tag.
    #[error("no authentication tag supplied before decrypting final")]
    MissingTag,
    /// Tag transfer with an out-of-range length.
    #[error("invalid tag length {0}")]
    TagLength(usize),
    /// Output buffer shorter than the produced output.
    #[error("output buffer too small: {have} < {need}")]
    ShortOutput {
        /// Bytes available in the caller buffer.
        have: usize,
        /// Bytes the operation produced.
        need: usize,
    },
    /// A control command outside the caller vocabulary.
    #[error("unrecognized control command {0}")]
    UnknownCommand(i32),
    /// Tag transfer at the wrong point of the sequence for the recorded
    /// direction.
    #[error("control command not valid for this context state")]
    BadControlState,
    /// The underlying primitive reported failure (for decryption this is
    /// the tag-mismatch path).
    #[error("authenticated cipher operation failed")]
    Failed,
}

/// An authenticated-encryption context over AES-256-GCM.
///
/// Lifecycle: `new` → `init` → `update`* → `finish`, with tag transfer via
/// [`ctrl`](Self::ctrl) after an encrypting or before a decrypting finish.
/// At most one logical operation is valid per context lifetime.
pub struct CipherContext {
    direction: Option<Direction>,
    key: Zeroizing<[u8; GCM_KEY_LEN]>,
    nonce: [u8; GCM_NONCE_LEN],
    pending: Zeroizing<Vec<u8>>,
    tag: Option<[u8; GCM_TAG_LEN]>,
    finalized: bool,
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext")
            .field("direction", &self.direction)
            .field("pending", &self.pending.len())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl CipherContext {
    /// Create an uninitialized context.
    pub fn new() -> Self {
        Self {
            direction: None,
            key: Zeroizing::new([0; GCM_KEY_LEN]),
            nonce: [0; GCM_NONCE_LEN],
            pending: Zeroizing::new(Vec::new()),
            tag: None,
            finalized: false,
        }
    }

    /// Record direction, key and nonce. Re-initializing resets the context
    /// for a fresh operation.
    pub fn init(&mut self, encrypt: bool, key: &[u8; GCM_KEY_LEN], nonce: &[u8; GCM_NONCE_LEN]) {
        self.direction = Some(if encrypt {
            Direction::Encrypt
        } else {
            Direction::Decrypt
        });
        self.key.copy_from_slice(key);
        self.nonce = *nonce;
        self.pending.clear();
        self.tag = None;
        self.finalized = false;
    }

    /// Feed input bytes. No output is produced until [`finish`](Self::finish);
    /// the returned count of bytes written is therefore always 0.
    pub fn update(&mut self, input: &[u8]) -> Result<usize, CipherError> {
        if self.direction.is_none() {
            return Err(CipherError::NotInitialized);
        }
        if self.finalized {
            return Err(CipherError::AlreadyFinalized);
        }
        self.pending.extend_from_slice(input);
        Ok(0)
    }

    /// Number of output bytes the final call will produce.
    pub fn output_len(&self) -> usize {
        self.pending.len()
    }

    /// Run the operation recorded at init over the accumulated input.
    ///
    /// Encrypting writes the ciphertext and retains the tag for get-tag;
    /// decrypting verifies the tag supplied through set-tag and writes the
    /// plaintext, failing without output if the tag does not match.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<usize, CipherError> {
        let direction = self.direction.ok_or(CipherError::NotInitialized)?;
        if self.finalized {
            return Err(CipherError::AlreadyFinalized);
        }
        let need = self.pending.len();
        if out.len() < need {
            return Err(CipherError::ShortOutput {
                have: out.len(),
                need,
            });
        }

        let cipher = Aes256Gcm::new_from_slice(self.key.as_ref())
            .map_err(|_| CipherError::Failed)?;
        let nonce = GenericArray::from_slice(&self.nonce);

        match direction {
            Direction::Encrypt => {
                let tag = cipher
                    .encrypt_in_place_detached(nonce, b"", &mut self.pending)
                    .map_err(|_| CipherError::Failed)?;
                self.tag = Some(tag.into());
            }
            Direction::Decrypt => {
                let tag = self.tag.ok_or(CipherError::MissingTag)?;
                cipher
                    .decrypt_in_place_detached(
                        nonce,
                        b"",
                        &mut self.pending,
                        GenericArray::from_slice(&tag),
                    )
                    .map_err(|_| CipherError::Failed)?;
            }
        }

        out[..need].copy_from_slice(&self.pending);
        self.pending.clear();
        self.finalized = true;
        trace!(?direction, bytes = need, "cipher operation finalized");
        Ok(need)
    }

    /// Tag transfer. The caller command is routed through the
    /// [translation table](crate::ctrl); unrecognized commands fail locally
    /// without reaching the backend state at all.
    pub fn ctrl(&mut self, command: i32, buf: &mut [u8]) -> Result<(), CipherError> {
        let command = ctrl::translate(command).ok_or(CipherError::UnknownCommand(command))?;
        match command {
            TagCommand::Get => self.get_tag(buf),
            TagCommand::Set => self.set_tag(buf),
        }
    }

    /// Copy out a prefix of the tag computed by an encrypting final.
    fn get_tag(&self, buf: &mut [u8]) -> Result<(), CipherError> {
        if buf.is_empty() || buf.len() > GCM_TAG_LEN {
            return Err(CipherError::TagLength(buf.len()));
        }
        if self.direction != Some(Direction::Encrypt) || !self.finalized {
            return Err(CipherError::BadControlState);
        }
        let tag = self.tag.ok_or(CipherError::BadControlState)?;
        buf.copy_from_slice(&tag[..buf.len()]);
        Ok(())
    }

    /// Store the expected tag for a decrypting final. Only the full-length
    /// tag is accepted.
    fn set_tag(&mut self, buf: &mut [u8]) -> Result<(), CipherError> {
        if buf.len() != GCM_TAG_LEN {
            return Err(CipherError::TagLength(buf.len()));
        }
        if self.direction != Some(Direction::Decrypt) || self.finalized {
            return Err(CipherError::BadControlState);
        }
        let mut tag = [0u8; GCM_TAG_LEN];
        tag.copy_from_slice(buf);
        self.tag = Some(tag);
        Ok(())
    }
}

impl Default for CipherContext {
    fn default() -> Self {
        Self::new()
    }
}
