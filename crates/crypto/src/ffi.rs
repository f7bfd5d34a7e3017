//! The `extern "C"` surface of the crypto bridge.
//!
//! Every export takes and returns the caller's fixed ABI: opaque handles as
//! raw pointers, byte buffers as pointer-plus-length, status as `i32` with
//! 1 for success and 0 for failure. The exports only translate; all state
//! machines live in the safe modules.

#![allow(non_snake_case)]

use std::ffi::c_void;
use std::slice;

use tracing::trace;

use crate::bn::BigNum;
use crate::cipher::{CipherContext, GCM_KEY_LEN, GCM_NONCE_LEN};
use crate::ec::{self, EcGroup, EcKey, EcPoint};
use crate::mac::{MacAlgorithm, MacContext};

const STATUS_OK: i32 = 1;
const STATUS_FAIL: i32 = 0;

/// Allocate a cipher context handle.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_Cipher_new() -> *mut CipherContext {
    Box::into_raw(Box::new(CipherContext::new()))
}

/// Release a cipher context handle. A null handle is a no-op.
///
/// # Safety
///
/// `ctx` must be null or a handle from [`Bridge_Cipher_new`] that has not
/// been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Cipher_free(ctx: *mut CipherContext) {
    if !ctx.is_null() {
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// Key a cipher context for one AES-256-GCM operation. `encrypt` selects
/// the direction for the whole context lifetime; `key` and `nonce` must
/// point at 32 and 12 bytes respectively.
///
/// # Safety
///
/// `ctx` must be a live cipher handle; `key` and `nonce` must be readable
/// for their fixed lengths.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Aes256Gcm_init(
    encrypt: i32,
    ctx: *mut CipherContext,
    key: *const u8,
    nonce: *const u8,
) -> i32 {
    if ctx.is_null() || key.is_null() || nonce.is_null() {
        return STATUS_FAIL;
    }
    let key = unsafe { &*key.cast::<[u8; GCM_KEY_LEN]>() };
    let nonce = unsafe { &*nonce.cast::<[u8; GCM_NONCE_LEN]>() };
    unsafe { &mut *ctx }.init(encrypt != 0, key, nonce);
    STATUS_OK
}

/// Feed input to a cipher context. Output is withheld until the final
/// call, so `*out_len` is always set to 0 on success and `out` may be null.
///
/// # Safety
///
/// `ctx` must be a live cipher handle, `input` readable for `input_len`
/// bytes and `out_len` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Cipher_update(
    ctx: *mut CipherContext,
    _out: *mut u8,
    out_len: *mut i32,
    input: *const u8,
    input_len: i32,
) -> i32 {
    if ctx.is_null() || out_len.is_null() || (input.is_null() && input_len != 0) {
        return STATUS_FAIL;
    }
    let Ok(len) = usize::try_from(input_len) else {
        return STATUS_FAIL;
    };
    let input = if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(input, len) }
    };
    match unsafe { &mut *ctx }.update(input) {
        Ok(written) => {
            unsafe { out_len.write(written as i32) };
            STATUS_OK
        }
        Err(err) => {
            trace!(%err, "cipher update rejected");
            STATUS_FAIL
        }
    }
}

/// Run the operation recorded at init and release the whole output. The
/// context has accumulated every update's input, so `out_capacity` must
/// cover the full message; a short capacity fails with no output written
/// and the context left intact.
///
/// # Safety
///
/// `ctx` must be a live cipher handle, `out` writable for `out_capacity`
/// bytes and `out_len` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Cipher_final(
    ctx: *mut CipherContext,
    out: *mut u8,
    out_capacity: i32,
    out_len: *mut i32,
) -> i32 {
    if ctx.is_null() || out_len.is_null() {
        return STATUS_FAIL;
    }
    let Ok(capacity) = usize::try_from(out_capacity) else {
        return STATUS_FAIL;
    };
    if out.is_null() && capacity != 0 {
        return STATUS_FAIL;
    }
    let out = if capacity == 0 {
        &mut []
    } else {
        unsafe { slice::from_raw_parts_mut(out, capacity) }
    };
    match unsafe { &mut *ctx }.finish(out) {
        Ok(written) => {
            unsafe { out_len.write(written as i32) };
            STATUS_OK
        }
        Err(err) => {
            trace!(%err, "cipher final failed");
            STATUS_FAIL
        }
    }
}

/// Tag transfer in the caller's command vocabulary. Unrecognized commands
/// fail locally without touching the context state.
///
/// # Safety
///
/// `ctx` must be a live cipher handle and `buf` readable and writable for
/// `buf_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Cipher_ctrl(
    ctx: *mut CipherContext,
    command: i32,
    buf_len: i32,
    buf: *mut c_void,
) -> i32 {
    if ctx.is_null() || buf.is_null() {
        return STATUS_FAIL;
    }
    let Ok(len) = usize::try_from(buf_len) else {
        return STATUS_FAIL;
    };
    let buf = unsafe { slice::from_raw_parts_mut(buf.cast::<u8>(), len) };
    match unsafe { &mut *ctx }.ctrl(command, buf) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            trace!(%err, command, "cipher ctrl rejected");
            STATUS_FAIL
        }
    }
}

/// Allocate a MAC context handle.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_Mac_new() -> *mut MacContext {
    Box::into_raw(Box::new(MacContext::new()))
}

/// Release a MAC context handle. A null handle is a no-op.
///
/// # Safety
///
/// `ctx` must be null or a handle from [`Bridge_Mac_new`] that has not
/// been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Mac_free(ctx: *mut MacContext) {
    if !ctx.is_null() {
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// Key a MAC context. `algorithm` is the caller id (2 selects AES-192,
/// 3 AES-256, anything else AES-128) and the key length must match the
/// selected cipher.
///
/// # Safety
///
/// `ctx` must be a live MAC handle and `key` readable for `key_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Mac_init(
    ctx: *mut MacContext,
    algorithm: i32,
    key: *const u8,
    key_len: i32,
) -> i32 {
    if ctx.is_null() || key.is_null() {
        return STATUS_FAIL;
    }
    let Ok(len) = usize::try_from(key_len) else {
        return STATUS_FAIL;
    };
    let key = unsafe { slice::from_raw_parts(key, len) };
    match unsafe { &mut *ctx }.init(MacAlgorithm::from_id(algorithm), key) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            trace!(%err, algorithm, "MAC init rejected");
            STATUS_FAIL
        }
    }
}

/// Feed message bytes to a MAC context.
///
/// # Safety
///
/// `ctx` must be a live MAC handle and `data` readable for `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Mac_update(
    ctx: *mut MacContext,
    data: *const u8,
    len: i32,
) -> i32 {
    if ctx.is_null() || (data.is_null() && len != 0) {
        return STATUS_FAIL;
    }
    let Ok(len) = usize::try_from(len) else {
        return STATUS_FAIL;
    };
    let data = if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(data, len) }
    };
    match unsafe { &mut *ctx }.update(data) {
        Ok(()) => STATUS_OK,
        Err(_) => STATUS_FAIL,
    }
}

/// Produce the tag and report its length (always 16). A capacity smaller
/// than the tag fails with no output written and the keyed state intact;
/// on success the state is consumed and the context must be
/// re-initialized for another tag.
///
/// # Safety
///
/// `ctx` must be a live MAC handle, `out` writable for `out_capacity`
/// bytes and `out_len` writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_Mac_final(
    ctx: *mut MacContext,
    out: *mut u8,
    out_capacity: i32,
    out_len: *mut i32,
) -> i32 {
    if ctx.is_null() || out.is_null() || out_len.is_null() {
        return STATUS_FAIL;
    }
    let Ok(capacity) = usize::try_from(out_capacity) else {
        return STATUS_FAIL;
    };
    let out = unsafe { slice::from_raw_parts_mut(out, capacity) };
    match unsafe { &mut *ctx }.finalize(out) {
        Ok(written) => {
            unsafe { out_len.write(written as i32) };
            STATUS_OK
        }
        Err(err) => {
            trace!(%err, "MAC final failed");
            STATUS_FAIL
        }
    }
}

/// Build a big-number handle from big-endian bytes.
///
/// # Safety
///
/// `bytes` must be readable for `len` bytes (null is accepted only with a
/// zero length).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_BN_bin2bn(bytes: *const u8, len: i32) -> *mut BigNum {
    if bytes.is_null() && len != 0 {
        return std::ptr::null_mut();
    }
    let Ok(len) = usize::try_from(len) else {
        return std::ptr::null_mut();
    };
    let bytes = if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(bytes, len) }
    };
    Box::into_raw(Box::new(BigNum::from_be_bytes(bytes)))
}

/// Write the minimal big-endian encoding into `out`, returning the number
/// of bytes written.
///
/// # Safety
///
/// `bn` must be a live big-number handle and `out` writable for
/// [`Bridge_BN_num_bytes`] bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_BN_bn2bin(bn: *const BigNum, out: *mut u8) -> i32 {
    if bn.is_null() || out.is_null() {
        return 0;
    }
    let bytes = unsafe { &*bn }.as_be_bytes();
    unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len()) };
    bytes.len() as i32
}

/// Number of bytes in the minimal big-endian encoding.
///
/// # Safety
///
/// `bn` must be null or a live big-number handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_BN_num_bytes(bn: *const BigNum) -> i32 {
    if bn.is_null() {
        return 0;
    }
    unsafe { &*bn }.num_bytes() as i32
}

/// Release a big-number handle, wiping its bytes. A null handle is a
/// no-op.
///
/// # Safety
///
/// `bn` must be null or a handle from [`Bridge_BN_bin2bn`] that has not
/// been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_BN_clear_free(bn: *mut BigNum) {
    if !bn.is_null() {
        drop(unsafe { Box::from_raw(bn) });
    }
}

/// Allocate a group handle for a caller curve id, or null for an unknown
/// id.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_EC_GROUP_new_by_curve_id(id: i32) -> *mut EcGroup {
    match EcGroup::new(id) {
        Some(group) => Box::into_raw(Box::new(group)),
        None => {
            trace!(id, "unknown curve id");
            std::ptr::null_mut()
        }
    }
}

/// Bit length of the group's field, or 0 for a null handle.
///
/// # Safety
///
/// `group` must be null or a live group handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_GROUP_get_degree(group: *const EcGroup) -> i32 {
    if group.is_null() {
        return 0;
    }
    unsafe { &*group }.degree()
}

/// Release a group handle. A null handle is a no-op.
///
/// # Safety
///
/// `group` must be null or a handle from [`Bridge_EC_GROUP_new_by_curve_id`]
/// that has not been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_GROUP_free(group: *mut EcGroup) {
    if !group.is_null() {
        drop(unsafe { Box::from_raw(group) });
    }
}

/// Allocate an empty key handle for a caller curve id, or null for an
/// unknown id.
#[unsafe(no_mangle)]
pub extern "C" fn Bridge_EC_KEY_new_by_curve_id(id: i32) -> *mut EcKey {
    match EcKey::new(id) {
        Some(key) => Box::into_raw(Box::new(key)),
        None => std::ptr::null_mut(),
    }
}

/// Release a key handle. A null handle is a no-op.
///
/// # Safety
///
/// `key` must be null or a handle from [`Bridge_EC_KEY_new_by_curve_id`]
/// that has not been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_KEY_free(key: *mut EcKey) {
    if !key.is_null() {
        drop(unsafe { Box::from_raw(key) });
    }
}

/// Borrow the key's private scalar. The returned handle is owned by the
/// key and must not be freed; null means no private scalar is set.
///
/// # Safety
///
/// `key` must be null or a live key handle; the returned pointer is valid
/// only while the key is live and its scalar unchanged.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_KEY_get0_private_key(key: *const EcKey) -> *const BigNum {
    if key.is_null() {
        return std::ptr::null();
    }
    match unsafe { &*key }.private_key() {
        Some(private) => private as *const BigNum,
        None => std::ptr::null(),
    }
}

/// Store a copy of `scalar` as the key's private scalar.
///
/// # Safety
///
/// `key` must be a live key handle and `scalar` a live big-number handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_KEY_set_private_key(
    key: *mut EcKey,
    scalar: *const BigNum,
) -> i32 {
    if key.is_null() || scalar.is_null() {
        return STATUS_FAIL;
    }
    unsafe { &mut *key }.set_private_key(unsafe { &*scalar });
    STATUS_OK
}

/// Allocate a point handle at the group's identity.
///
/// # Safety
///
/// `group` must be a live group handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_POINT_new(group: *const EcGroup) -> *mut EcPoint {
    if group.is_null() {
        return std::ptr::null_mut();
    }
    Box::into_raw(Box::new(EcPoint::new(unsafe { &*group })))
}

/// Release a point handle. A null handle is a no-op.
///
/// # Safety
///
/// `point` must be null or a handle from [`Bridge_EC_POINT_new`] that has
/// not been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_POINT_free(point: *mut EcPoint) {
    if !point.is_null() {
        drop(unsafe { Box::from_raw(point) });
    }
}

/// Read the point's affine coordinates into the supplied big-number
/// handles. Fails for the identity point or mismatched curves.
///
/// # Safety
///
/// `group` and `point` must be live handles and `x`/`y` live big-number
/// handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_POINT_get_affine_coordinates(
    group: *const EcGroup,
    point: *const EcPoint,
    x: *mut BigNum,
    y: *mut BigNum,
) -> i32 {
    if group.is_null() || point.is_null() || x.is_null() || y.is_null() {
        return STATUS_FAIL;
    }
    let (group, point) = unsafe { (&*group, &*point) };
    match point.affine_coordinates(group, unsafe { &mut *x }, unsafe { &mut *y }) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            trace!(%err, "affine coordinate read failed");
            STATUS_FAIL
        }
    }
}

/// Set the point from affine coordinates, validating it lies on the
/// group's curve.
///
/// # Safety
///
/// `group` and `point` must be live handles and `x`/`y` live big-number
/// handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_POINT_set_affine_coordinates(
    group: *const EcGroup,
    point: *mut EcPoint,
    x: *const BigNum,
    y: *const BigNum,
) -> i32 {
    if group.is_null() || point.is_null() || x.is_null() || y.is_null() {
        return STATUS_FAIL;
    }
    let group = unsafe { &*group };
    match unsafe { &mut *point }.set_affine_coordinates(group, unsafe { &*x }, unsafe { &*y }) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            trace!(%err, "affine coordinate set failed");
            STATUS_FAIL
        }
    }
}

/// Compute `r = n * G + m * q`. `n` may be null, as may the `q`/`m` pair,
/// but not both. `r` and `q` may alias.
///
/// # Safety
///
/// `group` and `r` must be live handles; `n`, `q` and `m` must each be
/// null or live handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_EC_POINT_mul(
    group: *const EcGroup,
    r: *mut EcPoint,
    n: *const BigNum,
    q: *const EcPoint,
    m: *const BigNum,
) -> i32 {
    if group.is_null() || r.is_null() {
        return STATUS_FAIL;
    }
    if q.is_null() != m.is_null() {
        return STATUS_FAIL;
    }
    let group = unsafe { &*group };
    let n = if n.is_null() {
        None
    } else {
        Some(unsafe { &*n })
    };
    // r and q may be the same handle; operate on a copy of q.
    let q = if q.is_null() {
        None
    } else {
        Some(unsafe { &*q }.clone())
    };
    let qm = match (&q, m.is_null()) {
        (Some(q), false) => Some((q, unsafe { &*m })),
        _ => None,
    };
    match unsafe { &mut *r }.multiply(group, n, qm) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            trace!(%err, "point multiplication failed");
            STATUS_FAIL
        }
    }
}

/// Derive the ECDH shared secret (the x-coordinate of `d * Q`) into `out`,
/// returning the number of bytes written, or 0 on failure.
///
/// # Safety
///
/// `out` must be writable for `out_len` bytes; `public` and `key` must be
/// live handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Bridge_ECDH_compute_key(
    out: *mut u8,
    out_len: i32,
    public: *const EcPoint,
    key: *const EcKey,
) -> i32 {
    if out.is_null() || public.is_null() || key.is_null() {
        return 0;
    }
    let Ok(len) = usize::try_from(out_len) else {
        return 0;
    };
    let out = unsafe { slice::from_raw_parts_mut(out, len) };
    match ec::ecdh_compute(unsafe { &*key }, unsafe { &*public }, out) {
        Ok(written) => written as i32,
        Err(err) => {
            trace!(%err, "ECDH derivation failed");
            0
        }
    }
}
