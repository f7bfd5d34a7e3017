//! Streaming CMAC backend over the RustCrypto primitive.
//!
//! `Cmac` is naturally incremental, so the state machine maps straight onto
//! it: init keys the primitive, update feeds it, finalize consumes it.

use aes::{Aes128, Aes192, Aes256};
use cmac::{Cmac, Mac};

use super::{MacAlgorithm, MacError};

pub(super) enum State {
    Aes128(Cmac<Aes128>),
    Aes192(Cmac<Aes192>),
    Aes256(Cmac<Aes256>),
}

impl State {
    pub(super) fn init(algorithm: MacAlgorithm, key: &[u8]) -> Result<Self, MacError> {
        Ok(match algorithm {
            MacAlgorithm::Aes128 => Self::Aes128(
                Cmac::new_from_slice(key).map_err(|_| MacError::KeyLength(key.len()))?,
            ),
            MacAlgorithm::Aes192 => Self::Aes192(
                Cmac::new_from_slice(key).map_err(|_| MacError::KeyLength(key.len()))?,
            ),
            MacAlgorithm::Aes256 => Self::Aes256(
                Cmac::new_from_slice(key).map_err(|_| MacError::KeyLength(key.len()))?,
            ),
        })
    }

    pub(super) fn update(&mut self, data: &[u8]) -> Result<(), MacError> {
        match self {
            Self::Aes128(mac) => mac.update(data),
            Self::Aes192(mac) => mac.update(data),
            Self::Aes256(mac) => mac.update(data),
        }
        Ok(())
    }

    pub(super) fn finalize(self, out: &mut [u8]) -> Result<(), MacError> {
        let tag = match self {
            Self::Aes128(mac) => mac.finalize().into_bytes(),
            Self::Aes192(mac) => mac.finalize().into_bytes(),
            Self::Aes256(mac) => mac.finalize().into_bytes(),
        };
        out.copy_from_slice(&tag);
        Ok(())
    }
}
