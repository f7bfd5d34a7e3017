//! PC/SC side of the cardlink native bridge.
//!
//! A managed caller drives the smart-card reader subsystem through a fixed,
//! platform-independent `extern "C"` surface. Most calls are 1:1 forwards to
//! `winscard`/`pcsclite` that only widen or narrow between the caller's fixed
//! `u32`/`i32` ABI and the platform `DWORD`/`LONG`. The one exception is the
//! status-change wait, which has to mirror an array of caller-owned packed
//! records into subsystem-native records around the blocking call; see
//! [`status_change`].
//!
//! The bridge holds no state of its own: context and card handles are owned
//! by the subsystem and merely pass through, and reader-name strings stay
//! owned by the caller for the duration of a single call.

pub mod ffi;
mod reader_state;
mod status_change;

pub use reader_state::{CALLER_ATR_LEN, ConvertError, ReaderStateRecord};
pub use status_change::wait_for_change;
