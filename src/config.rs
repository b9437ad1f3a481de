//! Attack configuration. Parsed from an optional TOML file; every field has a default so an
//! empty file (or no file) runs the canonical Manger attack over a hex transport.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::oaep::OaepHash;
use crate::response::Convention;
use crate::wire::WireEncoding;

/// Top-level attack configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AttackConfig {
    /// Logging verbosity (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: Option<String>,

    /// Serialization of candidate ciphertexts
    pub encoding: WireEncoding,

    /// Which responses mean "at or above B" and "below B"
    pub convention: Convention,

    /// Hash used by MGF1 and the label check
    pub hash: OaepHash,

    /// Run the EME-OAEP decode stage on the recovered message
    pub oaep: bool,

    /// Abort once this many oracle queries have been issued
    pub max_queries: Option<u64>,

    /// Target process transport settings
    pub transport: TransportConfig,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            encoding: WireEncoding::default(),
            convention: Convention::default(),
            hash: OaepHash::default(),
            oaep: true,
            max_queries: None,
            transport: TransportConfig::default(),
        }
    }
}

/// Settings for talking to the target process
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Per-query response timeout, none blocks indefinitely
    pub timeout_ms: Option<u64>,

    /// Relaunch-and-resend attempts after a transport failure
    pub retries: u32,

    /// Delay before the first retry, doubled on each subsequent one
    pub backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(10_000),
            retries: 2,
            backoff_ms: 100,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Backoff before retry number `attempt` (zero-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1_u64 << attempt.min(16)))
    }
}

impl AttackConfig {
    /// Load a configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path).map_err(|e| {
            Error::Setup(format!(
                "failed to read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&data)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg = toml::from_str::<AttackConfig>(data)
            .map_err(|e| Error::Setup(format!("config parse error: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        Convention::new(self.convention.at_or_above, self.convention.below)?;
        if self.transport.timeout_ms == Some(0) {
            return Err(Error::Setup("transport timeout must be non-zero".into()));
        }
        if self.max_queries == Some(0) {
            return Err(Error::Setup("max_queries must be non-zero".into()));
        }
        Ok(())
    }
}
