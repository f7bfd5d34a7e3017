//! Conversion between the caller's fixed-layout reader-state record and the
//! subsystem-native `SCARD_READERSTATE`.

use std::os::raw::{c_char, c_void};

use pcsc_sys::{ATR_BUFFER_SIZE, DWORD, SCARD_READERSTATE};

/// Size of the ATR buffer in the caller's fixed record layout.
///
/// This matches the Windows reader-state layout; `pcsc-lite` uses a smaller
/// buffer, so copies are bounded by [`MIRROR_ATR_LEN`].
pub const CALLER_ATR_LEN: usize = 36;

/// Number of ATR bytes that can travel between the two layouts.
pub(crate) const MIRROR_ATR_LEN: usize = if ATR_BUFFER_SIZE < CALLER_ATR_LEN {
    ATR_BUFFER_SIZE
} else {
    CALLER_ATR_LEN
};

/// Reader-state record in the caller's fixed, packed layout.
///
/// `reader_name` is a borrowed, null-terminated string owned by the caller.
/// It must stay valid for the duration of the enclosing call; the bridge
/// never copies, stores or frees it. `current_state` and `event_state` are
/// the subsystem's state bitmasks, `atr_len` counts the valid bytes in `atr`
/// and must not exceed [`CALLER_ATR_LEN`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug)]
pub struct ReaderStateRecord {
    /// Borrowed reader name, never owned by the bridge.
    pub reader_name: *const c_char,
    /// Opaque caller value, passed through untouched.
    pub user_data: *mut c_void,
    /// State the caller believes the reader is in.
    pub current_state: u32,
    /// State the subsystem reports back.
    pub event_state: u32,
    /// Count of valid bytes in `atr`.
    pub atr_len: u32,
    /// Answer-To-Reset of the card, if any.
    pub atr: [u8; CALLER_ATR_LEN],
}

/// Failure to build the transient native mirror array.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The mirror allocation itself failed. Reported to the caller as
    /// `SCARD_E_NO_MEMORY` without ever invoking the subsystem.
    #[error("out of memory mirroring {0} reader states")]
    OutOfMemory(usize),
}

fn zeroed_native() -> SCARD_READERSTATE {
    SCARD_READERSTATE {
        szReader: std::ptr::null(),
        pvUserData: std::ptr::null_mut(),
        dwCurrentState: 0,
        dwEventState: 0,
        cbAtr: 0,
        rgbAtr: [0; ATR_BUFFER_SIZE],
    }
}

/// Build the subsystem-native mirror of a caller record slice.
///
/// Reader-name pointers are copied as pointers, not content; the mirror
/// borrows them for the lifetime of the enclosing call.
pub(crate) fn to_native(
    records: &[ReaderStateRecord],
) -> Result<Vec<SCARD_READERSTATE>, ConvertError> {
    let mut mirror = Vec::new();
    mirror
        .try_reserve_exact(records.len())
        .map_err(|_| ConvertError::OutOfMemory(records.len()))?;

    for record in records {
        let mut native = zeroed_native();
        native.szReader = record.reader_name;
        native.pvUserData = record.user_data;
        native.dwCurrentState = DWORD::from(record.current_state);
        native.dwEventState = DWORD::from(record.event_state);
        native.cbAtr = DWORD::from(record.atr_len);
        let atr = record.atr;
        native.rgbAtr[..MIRROR_ATR_LEN].copy_from_slice(&atr[..MIRROR_ATR_LEN]);
        mirror.push(native);
    }

    Ok(mirror)
}

/// Copy the mutable fields back into the caller records.
///
/// Only `event_state`, `atr_len` and the ATR bytes are outputs of the wait;
/// `current_state` and `reader_name` are caller-owned inputs and are left
/// untouched.
pub(crate) fn copy_back(mirror: &[SCARD_READERSTATE], records: &mut [ReaderStateRecord]) {
    for (native, record) in mirror.iter().zip(records.iter_mut()) {
        record.event_state = native.dwEventState as u32;
        record.atr_len = native.cbAtr as u32;
        let mut atr = record.atr;
        atr[..MIRROR_ATR_LEN].copy_from_slice(&native.rgbAtr[..MIRROR_ATR_LEN]);
        record.atr = atr;
    }
}
