use core::fmt;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Status codes the decryption oracle replies with
///
/// Wire values are the ASCII digits '0' through '7', in declaration order
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OracleResponse {
    Success,
    PaddingError1,
    PaddingError2,
    RangeErrorP,
    RangeErrorC,
    LengthErrorMessage,
    LengthErrorCiphertext,
    LengthErrorCipherHash,
}

const ALL: [OracleResponse; 8] = [
    OracleResponse::Success,
    OracleResponse::PaddingError1,
    OracleResponse::PaddingError2,
    OracleResponse::RangeErrorP,
    OracleResponse::RangeErrorC,
    OracleResponse::LengthErrorMessage,
    OracleResponse::LengthErrorCiphertext,
    OracleResponse::LengthErrorCipherHash,
];

impl OracleResponse {
    /// Decode the leading status byte of a response frame
    ///
    /// errors: any byte outside '0'..='7' is a protocol violation
    pub fn from_status_byte(byte: u8) -> Result<Self> {
        match byte {
            b'0'..=b'7' => Ok(ALL[(byte - b'0') as usize]),
            _ => Err(Error::Protocol(format!(
                "unknown status byte {:#04x} ({:?})",
                byte,
                byte as char
            ))),
        }
    }

    /// ASCII status byte for this response
    pub fn status_byte(self) -> u8 {
        b'0' + self as u8
    }
}

impl fmt::Display for OracleResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OracleResponse::Success => "SUCCESS",
            OracleResponse::PaddingError1 => "ERROR1",
            OracleResponse::PaddingError2 => "ERROR2",
            OracleResponse::RangeErrorP => "P_OUTOFRANGE",
            OracleResponse::RangeErrorC => "C_OUTOFRANGE",
            OracleResponse::LengthErrorMessage => "M_LENGTH",
            OracleResponse::LengthErrorCiphertext => "C_LENGTH",
            OracleResponse::LengthErrorCipherHash => "CH_LENGTH",
        };
        write!(f, "{}({})", name, *self as u8)
    }
}

/// Which responses reveal the position of a blinded plaintext relative to B
///
/// The narrowing loop only understands these two answers
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Convention {
    /// Response meaning the decrypted value is at or above B (leading byte non-zero)
    pub at_or_above: OracleResponse,
    /// Response meaning the decrypted value is below B
    pub below: OracleResponse,
}

impl Convention {
    /// Manger's convention: integer-to-octets failure reports ERROR1, everything later ERROR2
    pub const MANGER: Convention = Convention {
        at_or_above: OracleResponse::PaddingError1,
        below: OracleResponse::PaddingError2,
    };

    /// Build a custom convention
    ///
    /// errors: both positions mapped to the same response
    pub fn new(at_or_above: OracleResponse, below: OracleResponse) -> Result<Self> {
        if at_or_above == below {
            return Err(Error::Setup(format!(
                "convention maps both boundary positions to {}",
                below
            )));
        }
        Ok(Self {
            at_or_above: at_or_above,
            below: below,
        })
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self::MANGER
    }
}
