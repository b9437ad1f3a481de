use std::io;
use std::time::Duration;

use num::bigint::BigUint;
use thiserror::Error;

use crate::error::Result;
use crate::response::OracleResponse;

mod local;
mod process;

pub use local::*;
pub use process::*;

/// Transport failures talking to the target process
#[derive(Debug, Error)]
pub enum OracleIoError {
    #[error("failed to launch target: {0}")]
    Spawn(io::Error),
    #[error("failed to write query: {0}")]
    Write(io::Error),
    #[error("failed to read response: {0}")]
    Read(io::Error),
    #[error("target closed its output")]
    Closed,
    #[error("response frame truncated after {0} bytes")]
    Truncated(usize),
    #[error("empty response frame")]
    EmptyFrame,
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// A decryption oracle: ciphertext in, status code out
///
/// The only source of information about the secret plaintext
pub trait Oracle {
    /// Submit one candidate ciphertext and block until its status code arrives
    fn query(&mut self, candidate: &BigUint) -> Result<OracleResponse>;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn query(&mut self, candidate: &BigUint) -> Result<OracleResponse> {
        (**self).query(candidate)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn query(&mut self, candidate: &BigUint) -> Result<OracleResponse> {
        (**self).query(candidate)
    }
}
