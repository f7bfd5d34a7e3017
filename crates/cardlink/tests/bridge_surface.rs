//! End-to-end exercises of the exported crypto surface, driven the way a
//! managed caller would: raw handles, pointer-plus-length buffers, integer
//! statuses.

use cardlink::crypto::ffi::*;
use cardlink::crypto::{GCM_KEY_LEN, GCM_NONCE_LEN, GCM_TAG_LEN, MAC_BLOCK_LEN};

const CTRL_GET_TAG: i32 = 16;
const CTRL_SET_TAG: i32 = 17;

#[test]
fn gcm_seal_and_open_through_the_exported_surface() {
    let key = [0x42u8; GCM_KEY_LEN];
    let nonce = [0x24u8; GCM_NONCE_LEN];
    let plaintext = b"challenge-response transcript";

    unsafe {
        let enc = Bridge_Cipher_new();
        assert_eq!(Bridge_Aes256Gcm_init(1, enc, key.as_ptr(), nonce.as_ptr()), 1);

        let mut written = -1;
        assert_eq!(
            Bridge_Cipher_update(
                enc,
                std::ptr::null_mut(),
                &mut written,
                plaintext.as_ptr(),
                plaintext.len() as i32
            ),
            1
        );
        assert_eq!(written, 0);

        let mut ciphertext = vec![0u8; plaintext.len()];
        assert_eq!(
            Bridge_Cipher_final(
                enc,
                ciphertext.as_mut_ptr(),
                ciphertext.len() as i32,
                &mut written
            ),
            1
        );
        assert_eq!(written as usize, plaintext.len());
        assert_ne!(&ciphertext[..], &plaintext[..]);

        let mut tag = [0u8; GCM_TAG_LEN];
        assert_eq!(
            Bridge_Cipher_ctrl(enc, CTRL_GET_TAG, GCM_TAG_LEN as i32, tag.as_mut_ptr().cast()),
            1
        );
        Bridge_Cipher_free(enc);

        let dec = Bridge_Cipher_new();
        assert_eq!(Bridge_Aes256Gcm_init(0, dec, key.as_ptr(), nonce.as_ptr()), 1);
        assert_eq!(
            Bridge_Cipher_update(
                dec,
                std::ptr::null_mut(),
                &mut written,
                ciphertext.as_ptr(),
                ciphertext.len() as i32
            ),
            1
        );
        assert_eq!(
            Bridge_Cipher_ctrl(dec, CTRL_SET_TAG, GCM_TAG_LEN as i32, tag.as_mut_ptr().cast()),
            1
        );
        let mut recovered = vec![0u8; ciphertext.len()];
        assert_eq!(
            Bridge_Cipher_final(
                dec,
                recovered.as_mut_ptr(),
                recovered.len() as i32,
                &mut written
            ),
            1
        );
        assert_eq!(&recovered[..written as usize], &plaintext[..]);
        Bridge_Cipher_free(dec);
    }
}

#[test]
fn gcm_open_with_altered_tag_reports_failure_status() {
    let key = [0x42u8; GCM_KEY_LEN];
    let nonce = [0x24u8; GCM_NONCE_LEN];

    unsafe {
        let enc = Bridge_Cipher_new();
        assert_eq!(Bridge_Aes256Gcm_init(1, enc, key.as_ptr(), nonce.as_ptr()), 1);
        let mut written = 0;
        let mut ciphertext = [0u8; 4];
        assert_eq!(
            Bridge_Cipher_update(enc, std::ptr::null_mut(), &mut written, b"abcd".as_ptr(), 4),
            1
        );
        assert_eq!(
            Bridge_Cipher_final(enc, ciphertext.as_mut_ptr(), 4, &mut written),
            1
        );
        let mut tag = [0u8; GCM_TAG_LEN];
        assert_eq!(
            Bridge_Cipher_ctrl(enc, CTRL_GET_TAG, GCM_TAG_LEN as i32, tag.as_mut_ptr().cast()),
            1
        );
        Bridge_Cipher_free(enc);

        tag[0] ^= 0x80;

        let dec = Bridge_Cipher_new();
        assert_eq!(Bridge_Aes256Gcm_init(0, dec, key.as_ptr(), nonce.as_ptr()), 1);
        assert_eq!(
            Bridge_Cipher_update(
                dec,
                std::ptr::null_mut(),
                &mut written,
                ciphertext.as_ptr(),
                4
            ),
            1
        );
        assert_eq!(
            Bridge_Cipher_ctrl(dec, CTRL_SET_TAG, GCM_TAG_LEN as i32, tag.as_mut_ptr().cast()),
            1
        );
        let mut out = [0u8; 4];
        assert_eq!(Bridge_Cipher_final(dec, out.as_mut_ptr(), 4, &mut written), 0);
        Bridge_Cipher_free(dec);
    }
}

#[test]
fn unrecognized_ctrl_commands_fail_without_side_effects() {
    let key = [0u8; GCM_KEY_LEN];
    let nonce = [0u8; GCM_NONCE_LEN];
    unsafe {
        let ctx = Bridge_Cipher_new();
        assert_eq!(Bridge_Aes256Gcm_init(1, ctx, key.as_ptr(), nonce.as_ptr()), 1);
        let mut buf = [0u8; GCM_TAG_LEN];
        for command in [0, 1, 15, 18, -16] {
            assert_eq!(
                Bridge_Cipher_ctrl(ctx, command, GCM_TAG_LEN as i32, buf.as_mut_ptr().cast()),
                0
            );
        }
        // The context is still usable after the rejected commands.
        let mut written = -1;
        let mut out = [0u8; 0];
        assert_eq!(Bridge_Cipher_final(ctx, out.as_mut_ptr(), 0, &mut written), 1);
        assert_eq!(written, 0);
        Bridge_Cipher_free(ctx);
    }
}

#[test]
fn cmac_matches_the_rfc4493_vector_through_the_exported_surface() {
    let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
    let msg = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

    unsafe {
        let ctx = Bridge_Mac_new();
        assert_eq!(Bridge_Mac_init(ctx, 1, key.as_ptr(), key.len() as i32), 1);
        assert_eq!(Bridge_Mac_update(ctx, msg.as_ptr(), msg.len() as i32), 1);
        let mut tag = [0u8; MAC_BLOCK_LEN];
        let mut tag_len = 0;
        assert_eq!(
            Bridge_Mac_final(ctx, tag.as_mut_ptr(), MAC_BLOCK_LEN as i32, &mut tag_len),
            1
        );
        assert_eq!(tag_len as usize, MAC_BLOCK_LEN);
        assert_eq!(hex::encode(tag), "070a16b46b4d4144f79bdd9dd04a287c");

        // The keyed state is consumed; another final fails until re-init.
        assert_eq!(
            Bridge_Mac_final(ctx, tag.as_mut_ptr(), MAC_BLOCK_LEN as i32, &mut tag_len),
            0
        );
        assert_eq!(Bridge_Mac_init(ctx, 1, key.as_ptr(), key.len() as i32), 1);
        Bridge_Mac_free(ctx);
    }
}

#[test]
fn ecdh_agreement_through_the_exported_surface() {
    unsafe {
        let group = Bridge_EC_GROUP_new_by_curve_id(415);
        assert!(!group.is_null());
        assert_eq!(Bridge_EC_GROUP_get_degree(group), 256);

        let da = Bridge_BN_bin2bn([0x13, 0x37].as_ptr(), 2);
        let db = Bridge_BN_bin2bn([0xca, 0xfe].as_ptr(), 2);

        let qa = Bridge_EC_POINT_new(group);
        let qb = Bridge_EC_POINT_new(group);
        assert_eq!(
            Bridge_EC_POINT_mul(group, qa, da, std::ptr::null(), std::ptr::null()),
            1
        );
        assert_eq!(
            Bridge_EC_POINT_mul(group, qb, db, std::ptr::null(), std::ptr::null()),
            1
        );

        let key_a = Bridge_EC_KEY_new_by_curve_id(415);
        let key_b = Bridge_EC_KEY_new_by_curve_id(415);
        assert_eq!(Bridge_EC_KEY_set_private_key(key_a, da), 1);
        assert_eq!(Bridge_EC_KEY_set_private_key(key_b, db), 1);
        assert!(!Bridge_EC_KEY_get0_private_key(key_a).is_null());

        let mut shared_a = [0u8; 32];
        let mut shared_b = [0u8; 32];
        assert_eq!(
            Bridge_ECDH_compute_key(shared_a.as_mut_ptr(), 32, qb, key_a),
            32
        );
        assert_eq!(
            Bridge_ECDH_compute_key(shared_b.as_mut_ptr(), 32, qa, key_b),
            32
        );
        assert_eq!(shared_a, shared_b);

        Bridge_EC_KEY_free(key_a);
        Bridge_EC_KEY_free(key_b);
        Bridge_EC_POINT_free(qa);
        Bridge_EC_POINT_free(qb);
        Bridge_BN_clear_free(da);
        Bridge_BN_clear_free(db);
        Bridge_EC_GROUP_free(group);
    }
}

#[test]
fn unknown_curve_ids_yield_null_handles() {
    assert!(Bridge_EC_GROUP_new_by_curve_id(0).is_null());
    assert!(Bridge_EC_GROUP_new_by_curve_id(416).is_null());
    assert!(Bridge_EC_KEY_new_by_curve_id(-1).is_null());
}
