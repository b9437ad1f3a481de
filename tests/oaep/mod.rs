use num::bigint::BigUint;
use rand::rngs::StdRng;
use rand::SeedableRng;

use manger::oaep::{self, OaepHash};
use manger::{execute, CancelToken, Convention, PublicKeyParams};

use crate::common::*;

#[test]
fn check_recover_labelled_message() {
    let mut rng = StdRng::seed_from_u64(2001);
    let label = b"manger".to_vec();
    let msg = b"Things you want to keep";

    // 512-bit key and SHA-1 leave room for 22 bytes
    let em = oaep::encode(&msg[..22], &label, REF_K, OaepHash::Sha1, &mut rng).unwrap();
    let params = ref_params(&BigUint::from_bytes_be(&em), Some(label));

    let recovery = execute(
        &params,
        ref_oracle(),
        Convention::MANGER,
        None,
        Some(OaepHash::Sha1),
        CancelToken::new(),
    )
    .unwrap();

    assert_eq!(recovery.em, BigUint::from_bytes_be(&em));
    assert_eq!(recovery.message, Some(Ok(msg[..22].to_vec())));
}

#[test]
fn check_label_mismatch_keeps_em() {
    let mut rng = StdRng::seed_from_u64(2002);
    let em = oaep::encode(b"secret", b"sent label", REF_K, OaepHash::Sha1, &mut rng).unwrap();
    let em = BigUint::from_bytes_be(&em);

    let ciphertext = ref_params(&em, None).c().clone();
    let params =
        PublicKeyParams::new(ref_n(), ref_e(), ciphertext, Some(b"other label".to_vec())).unwrap();

    let recovery = execute(
        &params,
        ref_oracle(),
        Convention::MANGER,
        None,
        Some(OaepHash::Sha1),
        CancelToken::new(),
    )
    .unwrap();

    assert_eq!(recovery.em, em);
    assert_eq!(recovery.message, Some(Err(oaep::Error::LabelMismatch)));
}

#[test]
fn check_sha256_needs_room() {
    // 2 * 32 + 2 bytes of overhead do not fit a 64-byte modulus
    let mut rng = StdRng::seed_from_u64(2003);
    assert!(oaep::encode(b"", b"", REF_K, OaepHash::Sha256, &mut rng).is_err());

    let em = oaep::encode(b"", b"", REF_K, OaepHash::Sha1, &mut rng).unwrap();
    let params = ref_params(&BigUint::from_bytes_be(&em), None);
    let recovery = execute(
        &params,
        ref_oracle(),
        Convention::MANGER,
        None,
        Some(OaepHash::Sha256),
        CancelToken::new(),
    )
    .unwrap();

    assert!(matches!(recovery.message, Some(Err(oaep::Error::Decode(_)))));
}
