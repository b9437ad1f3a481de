use num::bigint::BigUint;
use num::One;

use crate::arith;
use crate::error::{Error, Result};

/// Public key and target ciphertext under attack
///
/// Immutable once built: K and B are derived from N at construction
#[derive(Clone, Debug, PartialEq)]
pub struct PublicKeyParams {
    n: BigUint,
    e: BigUint,
    c: BigUint,
    k: usize,
    b: BigUint,
    label: Option<Vec<u8>>,
    label_line: Option<String>,
}

impl PublicKeyParams {
    /// Build attack parameters from an already-parsed key and ciphertext
    ///
    /// A byte label goes on the wire as uppercase hex
    ///
    /// errors: N <= 1, B >= N, or C >= N
    pub fn new(n: BigUint, e: BigUint, c: BigUint, label: Option<Vec<u8>>) -> Result<Self> {
        if n <= BigUint::one() {
            return Err(Error::Setup("modulus N must be greater than 1".into()));
        }
        if c >= n {
            return Err(Error::Setup("ciphertext C must be less than N".into()));
        }

        let k = arith::byte_len(&n);
        let b = arith::boundary(k);
        // B < N fails only when N is a power of 256
        if b >= n {
            return Err(Error::Setup(format!(
                "boundary B = 2**{} is not below N",
                8 * (k - 1)
            )));
        }

        Ok(Self {
            label_line: label.as_ref().map(hex::encode_upper),
            n: n,
            e: e,
            c: c,
            k: k,
            b: b,
            label: label,
        })
    }

    /// Build attack parameters from base-16 ASCII fields
    ///
    /// The label line is kept verbatim for the wire; its decoded bytes feed the OAEP label
    /// hash. An odd number of digits decodes as if left-padded with '0'.
    ///
    /// errors: any field fails to parse as hex, or the key itself is invalid
    pub fn from_hex(n: &str, e: &str, c: &str, label: Option<&str>) -> Result<Self> {
        let n = parse_field("N", n)?;
        let e = parse_field("E", e)?;
        let c = parse_field("C", c)?;
        let label = label.map(str::trim);
        let bytes = match label {
            Some(l) => Some(parse_label(l)?),
            None => None,
        };

        let mut params = Self::new(n, e, c, bytes)?;
        params.label_line = label.map(str::to_string);
        Ok(params)
    }

    /// RSA modulus N
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// Public exponent E
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Target ciphertext C
    pub fn c(&self) -> &BigUint {
        &self.c
    }

    /// Byte length K of the modulus
    pub fn k(&self) -> usize {
        self.k
    }

    /// Boundary constant B = 2**(8 * (K - 1))
    pub fn b(&self) -> &BigUint {
        &self.b
    }

    /// Optional OAEP label bytes
    pub fn label(&self) -> Option<&[u8]> {
        self.label.as_deref()
    }

    /// Label line as written to the target ahead of each ciphertext
    pub fn label_line(&self) -> Option<&str> {
        self.label_line.as_deref()
    }

    /// Raw RSA encryption: m**E mod N
    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.e, &self.n)
    }

    /// Blind the target ciphertext by `f`: (f**E * C) mod N
    ///
    /// Decrypts to (f * m) mod N without ever computing m
    pub fn rsa_f(&self, f: &BigUint) -> BigUint {
        (self.encrypt(f) * &self.c) % &self.n
    }

    /// Check a recovered message re-encrypts to the target ciphertext
    pub fn validate(&self, m: &BigUint) -> bool {
        self.encrypt(m) == self.c
    }
}

fn parse_field(name: &str, field: &str) -> Result<BigUint> {
    arith::parse_hex(field)
        .ok_or_else(|| Error::Setup(format!("field {} is not a base-16 integer", name)))
}

fn parse_label(line: &str) -> Result<Vec<u8>> {
    let decoded = if line.len() % 2 == 1 {
        hex::decode(format!("0{}", line))
    } else {
        hex::decode(line)
    };
    decoded.map_err(|e| Error::Setup(format!("label is not valid hex: {}", e)))
}
