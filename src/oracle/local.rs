use num::bigint::BigUint;

use crate::arith;
use crate::error::Result;
use crate::response::{Convention, OracleResponse};

use super::Oracle;

/// In-process decryption oracle backed by a known private exponent
///
/// Answers with the boundary convention only, as a faithful target would for a
/// ciphertext whose decryption is well-formed apart from its leading byte
pub struct LocalOracle {
    n: BigUint,
    d: BigUint,
    b: BigUint,
    convention: Convention,
    queries: u64,
}

impl LocalOracle {
    /// Create an oracle for the key (N, d) using Manger's convention
    pub fn new(n: BigUint, d: BigUint) -> Self {
        Self::with_convention(n, d, Convention::MANGER)
    }

    /// Create an oracle for the key (N, d) answering with a custom convention
    pub fn with_convention(n: BigUint, d: BigUint, convention: Convention) -> Self {
        let b = arith::boundary(arith::byte_len(&n));
        Self {
            n: n,
            d: d,
            b: b,
            convention: convention,
            queries: 0,
        }
    }

    /// Number of queries answered so far
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Raw RSA decryption: c**d mod N
    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        c.modpow(&self.d, &self.n)
    }
}

impl Oracle for LocalOracle {
    fn query(&mut self, candidate: &BigUint) -> Result<OracleResponse> {
        self.queries += 1;

        if candidate >= &self.n {
            return Ok(OracleResponse::RangeErrorC);
        }

        if self.decrypt(candidate) >= self.b {
            Ok(self.convention.at_or_above)
        } else {
            Ok(self.convention.below)
        }
    }
}
