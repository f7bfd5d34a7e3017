//! The shared library a managed runtime loads.
//!
//! This crate carries no logic of its own. Linking both member crates into
//! one `cdylib` puts every `Bridge_`-prefixed `extern "C"` symbol in a
//! single binary: the PC/SC passthroughs and the status-change bridge from
//! [`cardlink_pcsc`], and the cipher, MAC, big-number and elliptic-curve
//! surface from [`cardlink_crypto`].
//!
//! The safe APIs behind those symbols are re-exported for Rust callers and
//! for the integration tests.

pub use cardlink_crypto as crypto;
pub use cardlink_pcsc as pcsc;
