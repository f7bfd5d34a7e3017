//! The exported `extern "C"` surface of the PC/SC side.
//!
//! Every function narrows the subsystem's platform-width `DWORD`/`LONG`
//! values to the fixed `u32`/`i32` ABI the managed caller compiles against,
//! and nothing else: handles, status codes and buffers pass through
//! unmodified. The status-change export is the exception and routes through
//! [`wait_for_change`](crate::wait_for_change).

#![allow(non_snake_case)]

use std::os::raw::c_char;

use pcsc_sys::{
    DWORD, SCARD_E_INVALID_PARAMETER, SCARD_IO_REQUEST, SCARDCONTEXT, SCARDHANDLE,
};

use crate::ReaderStateRecord;
use crate::status_change::wait_for_change;

/// Establish a context with the reader subsystem.
///
/// # Safety
/// `out_context` must be a valid pointer to writable memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardEstablishContext(
    scope: u32,
    out_context: *mut SCARDCONTEXT,
) -> i32 {
    if out_context.is_null() {
        return SCARD_E_INVALID_PARAMETER as i32;
    }
    unsafe {
        pcsc_sys::SCardEstablishContext(
            DWORD::from(scope),
            std::ptr::null(),
            std::ptr::null(),
            out_context,
        ) as i32
    }
}

/// Release a context previously established through the bridge.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_SCardReleaseContext(context: SCARDCONTEXT) -> i32 {
    unsafe { pcsc_sys::SCardReleaseContext(context) as i32 }
}

/// Connect to the card in the named reader.
///
/// # Safety
/// `reader` must point to a valid null-terminated string; `out_card` and
/// `out_active_protocol` must be valid writable pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardConnect(
    context: SCARDCONTEXT,
    reader: *const c_char,
    share_mode: u32,
    preferred_protocols: u32,
    out_card: *mut SCARDHANDLE,
    out_active_protocol: *mut u32,
) -> i32 {
    if out_card.is_null() || out_active_protocol.is_null() {
        return SCARD_E_INVALID_PARAMETER as i32;
    }
    let mut active_protocol: DWORD = 0;
    let status = unsafe {
        pcsc_sys::SCardConnect(
            context,
            reader,
            DWORD::from(share_mode),
            DWORD::from(preferred_protocols),
            out_card,
            &mut active_protocol,
        )
    };
    unsafe { *out_active_protocol = active_protocol as u32 };
    status as i32
}

/// Reconnect an existing card handle under new parameters.
///
/// # Safety
/// `out_active_protocol` must be a valid writable pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardReconnect(
    card: SCARDHANDLE,
    share_mode: u32,
    preferred_protocols: u32,
    initialization: u32,
    out_active_protocol: *mut u32,
) -> i32 {
    if out_active_protocol.is_null() {
        return SCARD_E_INVALID_PARAMETER as i32;
    }
    let mut active_protocol: DWORD = 0;
    let status = unsafe {
        pcsc_sys::SCardReconnect(
            card,
            DWORD::from(share_mode),
            DWORD::from(preferred_protocols),
            DWORD::from(initialization),
            &mut active_protocol,
        )
    };
    unsafe { *out_active_protocol = active_protocol as u32 };
    status as i32
}

/// Disconnect a card handle.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_SCardDisconnect(card: SCARDHANDLE, disposition: u32) -> i32 {
    unsafe { pcsc_sys::SCardDisconnect(card, DWORD::from(disposition)) as i32 }
}

/// Begin a transaction on a card handle. May block until the card is free;
/// the locking discipline itself belongs to the subsystem.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_SCardBeginTransaction(card: SCARDHANDLE) -> i32 {
    unsafe { pcsc_sys::SCardBeginTransaction(card) as i32 }
}

/// End a transaction on a card handle.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_SCardEndTransaction(card: SCARDHANDLE, disposition: u32) -> i32 {
    unsafe { pcsc_sys::SCardEndTransaction(card, DWORD::from(disposition)) as i32 }
}

/// Block until the state of one of the given readers changes, or the timeout
/// elapses, or the wait is cancelled through [`Bridge_SCardCancel`].
///
/// `reader_states` is mutated in place. A timeout of `0` polls, and the
/// subsystem's infinite sentinel (`0xFFFF_FFFF`) passes through unchanged.
/// The records' reader-name pointers stay owned by the caller and must
/// remain valid until this call returns.
///
/// # Safety
/// `reader_states` must point to `count` valid records, each with a valid
/// null-terminated `reader_name`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardGetStatusChange(
    context: SCARDCONTEXT,
    timeout_ms: u32,
    reader_states: *mut ReaderStateRecord,
    count: u32,
) -> i32 {
    let records: &mut [ReaderStateRecord] = if count == 0 {
        &mut []
    } else {
        if reader_states.is_null() {
            return SCARD_E_INVALID_PARAMETER as i32;
        }
        unsafe { std::slice::from_raw_parts_mut(reader_states, count as usize) }
    };

    wait_for_change(
        |mirror| unsafe {
            pcsc_sys::SCardGetStatusChange(
                context,
                DWORD::from(timeout_ms),
                mirror.as_mut_ptr(),
                mirror.len() as DWORD,
            )
        },
        records,
    )
}

/// Transmit an APDU to the card and receive the response.
///
/// # Safety
/// The PCI and buffer pointers must follow the subsystem's `SCardTransmit`
/// contract; `recv_len` must be a valid writable pointer holding the receive
/// buffer capacity.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardTransmit(
    card: SCARDHANDLE,
    send_pci: *const SCARD_IO_REQUEST,
    send_buffer: *const u8,
    send_len: u32,
    recv_pci: *mut SCARD_IO_REQUEST,
    recv_buffer: *mut u8,
    recv_len: *mut u32,
) -> i32 {
    if recv_len.is_null() {
        return SCARD_E_INVALID_PARAMETER as i32;
    }
    let mut native_recv_len = DWORD::from(unsafe { *recv_len });
    let status = unsafe {
        pcsc_sys::SCardTransmit(
            card,
            send_pci,
            send_buffer,
            DWORD::from(send_len),
            recv_pci,
            recv_buffer,
            &mut native_recv_len,
        )
    };
    unsafe { *recv_len = native_recv_len as u32 };
    status as i32
}

/// List the readers known to the subsystem into a caller buffer.
///
/// # Safety
/// `readers_len` must be a valid writable pointer; `readers` may be null for
/// the length-query form, per the subsystem contract.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_SCardListReaders(
    context: SCARDCONTEXT,
    groups: *const c_char,
    readers: *mut c_char,
    readers_len: *mut u32,
) -> i32 {
    if readers_len.is_null() {
        return SCARD_E_INVALID_PARAMETER as i32;
    }
    let mut native_len = DWORD::from(unsafe { *readers_len });
    let status =
        unsafe { pcsc_sys::SCardListReaders(context, groups, readers, &mut native_len) };
    unsafe { *readers_len = native_len as u32 };
    status as i32
}

/// Unblock a wait currently parked in [`Bridge_SCardGetStatusChange`] on the
/// same context. The unblocked wait still copies results back before it
/// returns.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_SCardCancel(context: SCARDCONTEXT) -> i32 {
    unsafe { pcsc_sys::SCardCancel(context) as i32 }
}
