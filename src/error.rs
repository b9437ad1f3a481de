use num::bigint::BigUint;
use thiserror::Error;

use crate::oracle::OracleIoError;

/// Fatal errors for an attack session
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing key material, or the target could not be launched
    #[error("setup error: {0}")]
    Setup(String),

    /// Transport failure talking to the target
    #[error("oracle I/O error: {0}")]
    OracleIo(#[from] OracleIoError),

    /// Status code outside the enumeration, or invalid for the current phase
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The plaintext interval left 0 < m_min <= m_max < N
    #[error("interval invariant violated: [{min:x}, {max:x}]")]
    InvariantViolation { min: BigUint, max: BigUint },

    /// Recovered value does not re-encrypt to the target ciphertext
    #[error("recovered message does not re-encrypt to the target ciphertext")]
    Validation,

    /// Session cancelled before convergence
    #[error("attack cancelled during {0}")]
    Cancelled(&'static str),

    /// Configured query limit reached before convergence
    #[error("query budget of {0} interactions exhausted")]
    QueryBudget(u64),
}

impl Error {
    /// Short name of the error class, kept on an aborted session
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Setup(_) => "setup",
            Error::OracleIo(_) => "oracle i/o",
            Error::Protocol(_) => "protocol",
            Error::InvariantViolation { .. } => "invariant violation",
            Error::Validation => "validation",
            Error::Cancelled(_) => "cancelled",
            Error::QueryBudget(_) => "query budget",
        }
    }
}

/// Convenient alias for attack results
pub type Result<T> = core::result::Result<T, Error>;
