//! The status-change bridge.
//!
//! `SCardGetStatusChange` is the only call in the bridge with unbounded
//! blocking latency, and the only one whose argument cannot be forwarded
//! as-is: the caller hands over an array of fixed-layout records, while the
//! subsystem expects its own (platform-dependent) reader-state layout. The
//! bridge mirrors the array for exactly one call, blocks, and copies the
//! mutable fields back no matter which status the wait returned, so a
//! timeout or a cancellation from another thread still yields whatever
//! partial state the subsystem wrote.

use pcsc_sys::{LONG, SCARD_E_NO_MEMORY, SCARD_READERSTATE};
use tracing::trace;

use crate::reader_state::{self, ReaderStateRecord};

/// Run a blocking status-change wait over a caller-owned record slice.
///
/// The wait itself is injected so the blocking subsystem call stays at the
/// FFI edge; everything here is the ownership and layout discipline around
/// it. The transient mirror array lives on this frame and is released on
/// every exit path. An allocation failure short-circuits with
/// `SCARD_E_NO_MEMORY` before the wait is invoked at all.
pub fn wait_for_change<W>(wait: W, records: &mut [ReaderStateRecord]) -> i32
where
    W: FnOnce(&mut [SCARD_READERSTATE]) -> LONG,
{
    let mut mirror = match reader_state::to_native(records) {
        Ok(mirror) => mirror,
        Err(_) => return SCARD_E_NO_MEMORY as i32,
    };

    trace!(readers = records.len(), "waiting for reader status change");
    let status = wait(&mut mirror);
    trace!(status, "status change wait returned");

    // The reverse copy runs regardless of the status, cancellation included.
    reader_state::copy_back(&mirror, records);

    status as i32
}
