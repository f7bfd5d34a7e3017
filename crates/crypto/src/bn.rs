//! Big-number handles.
//!
//! The caller only ever converts between byte strings and opaque handles, so
//! the representation is an owned big-endian magnitude. Freeing a handle
//! wipes the bytes, matching the clear-free contract of the original
//! primitive.

use zeroize::Zeroizing;

/// An opaque big-number handle: an owned, minimal big-endian magnitude.
#[derive(Debug, Clone, Default)]
pub struct BigNum {
    bytes: Zeroizing<Vec<u8>>,
}

impl BigNum {
    /// Build from big-endian bytes, dropping leading zeros so the stored
    /// magnitude is minimal (zero is the empty magnitude).
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self {
            bytes: Zeroizing::new(bytes[start..].to_vec()),
        }
    }

    /// Replace the magnitude in place.
    pub fn set_be_bytes(&mut self, bytes: &[u8]) {
        *self = Self::from_be_bytes(bytes);
    }

    /// The minimal big-endian encoding.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in the minimal encoding.
    pub fn num_bytes(&self) -> usize {
        self.bytes.len()
    }
}
