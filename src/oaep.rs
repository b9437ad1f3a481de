//! EME-OAEP decoding of a recovered encoded message, plus the matching encoder used to
//! build targets and check round trips.
//!
//! ```text
//! EM = 0x00 || maskedSeed || maskedDB
//! DB = lHash || PS || 0x01 || M
//! ```

use num::bigint::BigUint;
use rand::RngCore;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::arith;
use crate::bytes;

// Largest MGF1 counter is 2**32 - 1
const MGF1_MAX_BLOCKS: u64 = 1 << 32;

/// EME-OAEP errors
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("decoding error: {0}")]
    Decode(&'static str),
    #[error("label hash does not match the decoded message")]
    LabelMismatch,
    #[error("mask too long")]
    MaskTooLong,
    #[error("message of {len} bytes exceeds the {max} byte maximum")]
    MessageTooLong { len: usize, max: usize },
}

/// Hash function for MGF1 and the label digest
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OaepHash {
    Sha1,
    Sha256,
}

impl Default for OaepHash {
    fn default() -> Self {
        OaepHash::Sha1
    }
}

impl OaepHash {
    /// Digest length in bytes
    pub fn len(self) -> usize {
        match self {
            OaepHash::Sha1 => 20,
            OaepHash::Sha256 => 32,
        }
    }

    /// Hash the concatenation of the given parts
    pub fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            OaepHash::Sha1 => {
                let mut hash = Sha1::new();
                for part in parts {
                    hash.update(part);
                }
                hash.finalize().to_vec()
            }
            OaepHash::Sha256 => {
                let mut hash = Sha256::new();
                for part in parts {
                    hash.update(part);
                }
                hash.finalize().to_vec()
            }
        }
    }
}

/// MGF1 mask generation
///
/// T = Hash(seed || C(0)) || Hash(seed || C(1)) || ..., truncated to `len` bytes,
/// where C(i) is the 32-bit big-endian counter
///
/// errors: `len` needs more than 2**32 hash blocks
pub fn mgf1(hash: OaepHash, seed: &[u8], len: usize) -> Result<Vec<u8>, Error> {
    let h_len = hash.len();
    let blocks = (len + h_len - 1) / h_len;
    if blocks as u64 > MGF1_MAX_BLOCKS {
        return Err(Error::MaskTooLong);
    }

    let mut mask = Vec::with_capacity(blocks * h_len);
    for counter in 0..blocks {
        let c = (counter as u32).to_be_bytes();
        mask.extend_from_slice(&hash.digest(&[seed, c.as_ref()]));
    }
    mask.truncate(len);

    Ok(mask)
}

/// Decode a recovered encoded message
///
/// `k` is the modulus length in bytes; `em` is the recovered integer, which lies below
/// B = 2**(8 * (k - 1)) so its leading zero octet is implicit.
///
/// errors: malformed encoding, or the embedded label hash differs from Hash(label)
pub fn decode(em: &BigUint, k: usize, label: &[u8], hash: OaepHash) -> Result<Vec<u8>, Error> {
    let h_len = hash.len();
    if k < 2 * h_len + 2 {
        return Err(Error::Decode("modulus too short for hash"));
    }

    // EM without its leading 0x00, so exactly k - 1 octets
    let mut em = arith::to_fixed_be(em, k - 1).ok_or(Error::Decode("leading octet is non-zero"))?;
    let (masked_seed, masked_db) = em.split_at_mut(h_len);

    // seed = maskedSeed ^ MGF1(maskedDB, hLen)
    let seed_mask = mgf1(hash, masked_db, h_len)?;
    bytes::xor_assign(masked_seed, &seed_mask);

    // DB = maskedDB ^ MGF1(seed, k - hLen - 1)
    let db_mask = mgf1(hash, masked_seed, masked_db.len())?;
    bytes::xor_assign(masked_db, &db_mask);
    let db = &*masked_db;

    let l_hash = hash.digest(&[label]);
    if !bytes::constant_eq(&db[..h_len], &l_hash) {
        return Err(Error::LabelMismatch);
    }

    // PS is all zeros, then the 0x01 separator
    match db[h_len..].iter().position(|&b| b != 0x00) {
        Some(i) if db[h_len + i] == 0x01 => Ok(db[h_len + i + 1..].to_vec()),
        Some(_) => Err(Error::Decode("non-zero padding before separator")),
        None => Err(Error::Decode("missing 0x01 separator")),
    }
}

/// Encode a message with a random seed
///
/// Returns the k-byte encoded message, ready for raw RSA encryption
///
/// errors: message longer than k - 2 * hLen - 2
pub fn encode<R: RngCore>(
    msg: &[u8],
    label: &[u8],
    k: usize,
    hash: OaepHash,
    rng: &mut R,
) -> Result<Vec<u8>, Error> {
    let mut seed = vec![0_u8; hash.len()];
    rng.fill_bytes(&mut seed);
    encode_with_seed(msg, label, k, hash, &seed)
}

/// Encode a message with a caller-supplied seed of hLen bytes
pub fn encode_with_seed(
    msg: &[u8],
    label: &[u8],
    k: usize,
    hash: OaepHash,
    seed: &[u8],
) -> Result<Vec<u8>, Error> {
    let h_len = hash.len();
    if seed.len() != h_len {
        return Err(Error::Decode("seed length differs from hash length"));
    }
    let max = k.saturating_sub(2 * h_len + 2);
    if k < 2 * h_len + 2 || msg.len() > max {
        return Err(Error::MessageTooLong {
            len: msg.len(),
            max: max,
        });
    }

    let db_len = k - h_len - 1;
    let mut db = Vec::with_capacity(db_len);
    db.extend_from_slice(&hash.digest(&[label]));
    db.resize(db_len - msg.len() - 1, 0x00);
    db.push(0x01);
    db.extend_from_slice(msg);

    let mut masked_seed = seed.to_vec();
    bytes::xor_assign(&mut db, &mgf1(hash, seed, db_len)?);
    bytes::xor_assign(&mut masked_seed, &mgf1(hash, &db, h_len)?);

    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.extend_from_slice(&masked_seed);
    em.extend_from_slice(&db);

    Ok(em)
}
