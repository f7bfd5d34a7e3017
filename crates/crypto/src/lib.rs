//! Symmetric-crypto side of the cardlink native bridge.
//!
//! The managed caller reaches an authenticated-encryption context, a keyed
//! CMAC context and a handful of big-number and elliptic-curve primitives
//! through opaque handles and a fixed `extern "C"` surface. The bridge
//! translates types and memory layout; every algorithm lives in the
//! underlying crates.
//!
//! Two pieces are deliberately more than 1:1 forwards:
//!
//! - the [cipher context](cipher) records its direction once at init and
//!   infers it on every later call, so a caller cannot mix encrypt and
//!   decrypt steps on one context;
//! - the [MAC context](mac) presents one incremental init/update/final
//!   protocol over two build-time backends of different shape.
//!
//! Control commands cross the boundary through the [translation
//! table](ctrl), never as the backend's raw constants.

mod bn;
mod cipher;
pub mod ctrl;
mod ec;
pub mod ffi;
mod mac;

pub use bn::BigNum;
pub use cipher::{CipherContext, CipherError, GCM_KEY_LEN, GCM_NONCE_LEN, GCM_TAG_LEN};
pub use ec::{
    CURVE_ID_K256, CURVE_ID_P256, CURVE_ID_P384, CurveId, EcError, EcGroup, EcKey, EcPoint,
    ecdh_compute,
};
pub use mac::{MAC_BLOCK_LEN, MacAlgorithm, MacContext, MacError};
