use num::bigint::BigUint;
use num::{Integer, One, Zero};

/// Ceiling division of two unsigned big integers
///
/// Panics on a zero divisor, same as `/`
pub fn ceil_div(x: &BigUint, y: &BigUint) -> BigUint {
    let (q, r) = x.div_rem(y);
    if r.is_zero() {
        q
    } else {
        q + 1_u32
    }
}

/// Minimal number of bytes needed to represent `x`
pub fn byte_len(x: &BigUint) -> usize {
    ((x.bits() + 7) / 8) as usize
}

/// B = 2**(8 * (k - 1))
pub fn boundary(k: usize) -> BigUint {
    BigUint::one() << (8 * (k.saturating_sub(1)))
}

/// Big-endian bytes of `x`, left-padded with zeros to `len` bytes
///
/// Returns None if `x` does not fit in `len` bytes
pub fn to_fixed_be(x: &BigUint, len: usize) -> Option<Vec<u8>> {
    let bytes = if x.is_zero() { Vec::new() } else { x.to_bytes_be() };
    if bytes.len() > len {
        return None;
    }

    let mut res = vec![0_u8; len - bytes.len()];
    res.extend_from_slice(&bytes);
    Some(res)
}

/// Parse a base-16 ASCII field, tolerating surrounding whitespace
pub fn parse_hex(field: &str) -> Option<BigUint> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    BigUint::parse_bytes(field.as_bytes(), 16)
}
