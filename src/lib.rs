//! Manger's chosen-ciphertext attack against an RSA-OAEP decryption oracle running as an
//! external process.

pub mod arith;
pub mod attack;
pub mod bytes;
pub mod cancel;
pub mod config;
pub mod error;
pub mod keyfile;
pub mod oaep;
pub mod oracle;
pub mod params;
pub mod response;
pub mod wire;

pub use attack::{execute, AttackSession, Interval, Phase, Recovery};
pub use cancel::CancelToken;
pub use config::{AttackConfig, TransportConfig};
pub use error::{Error, Result};
pub use oracle::{LocalOracle, Oracle, OracleIoError, ProcessOracle};
pub use params::PublicKeyParams;
pub use response::{Convention, OracleResponse};
pub use wire::WireEncoding;
