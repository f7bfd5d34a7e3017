//! One-shot CMAC backend over OpenSSL.
//!
//! OpenSSL's CMAC surface keys a signer and produces the tag in one pass, so
//! this backend accumulates update input and computes everything at
//! finalize. The caller-visible state machine is identical to the streaming
//! backend's.

use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::symm::Cipher;
use zeroize::Zeroizing;

use super::{MAC_BLOCK_LEN, MacAlgorithm, MacError};

pub(super) struct State {
    algorithm: MacAlgorithm,
    key: Zeroizing<Vec<u8>>,
    buffered: Zeroizing<Vec<u8>>,
}

impl State {
    pub(super) fn init(algorithm: MacAlgorithm, key: &[u8]) -> Result<Self, MacError> {
        if key.len() != algorithm.key_len() {
            return Err(MacError::KeyLength(key.len()));
        }
        Ok(Self {
            algorithm,
            key: Zeroizing::new(key.to_vec()),
            buffered: Zeroizing::new(Vec::new()),
        })
    }

    pub(super) fn update(&mut self, data: &[u8]) -> Result<(), MacError> {
        self.buffered.extend_from_slice(data);
        Ok(())
    }

    pub(super) fn finalize(self, out: &mut [u8]) -> Result<(), MacError> {
        let cipher = match self.algorithm {
            MacAlgorithm::Aes128 => Cipher::aes_128_cbc(),
            MacAlgorithm::Aes192 => Cipher::aes_192_cbc(),
            MacAlgorithm::Aes256 => Cipher::aes_256_cbc(),
        };
        let key = PKey::cmac(&cipher, &self.key).map_err(|_| MacError::Backend)?;
        let mut signer = Signer::new_without_digest(&key).map_err(|_| MacError::Backend)?;
        signer
            .update(&self.buffered)
            .map_err(|_| MacError::Backend)?;
        let tag = signer.sign_to_vec().map_err(|_| MacError::Backend)?;
        if tag.len() != MAC_BLOCK_LEN {
            return Err(MacError::Backend);
        }
        out.copy_from_slice(&tag);
        Ok(())
    }
}
