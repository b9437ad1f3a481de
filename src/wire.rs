use std::io::{ErrorKind, Read};

use num::bigint::BigUint;
use serde::Deserialize;

use crate::arith;
use crate::oracle::OracleIoError;

// Response frames and text lines end here
const NEWLINE: u8 = b'\n';

// Initial capacity of the response read buffer, grown as needed
const FRAME_CHUNK: usize = 64;

/// Serialization of candidate ciphertexts written to the target
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireEncoding {
    /// Uppercase hex ASCII, left-padded with '0' to 2K characters, newline terminated
    Hex,
    /// Raw big-endian octets, left-padded with zeros to K bytes, no terminator
    Octet,
}

impl Default for WireEncoding {
    fn default() -> Self {
        WireEncoding::Hex
    }
}

impl WireEncoding {
    /// Encode one query frame: optional label line, then the candidate ciphertext
    ///
    /// The label line is written verbatim under either encoding.
    /// Returns None if the candidate does not fit in `k` bytes
    pub fn encode_query(self, candidate: &BigUint, k: usize, label: Option<&[u8]>) -> Option<Vec<u8>> {
        let octets = arith::to_fixed_be(candidate, k)?;
        let mut frame = Vec::with_capacity(2 * k + 1);

        if let Some(label) = label {
            frame.extend_from_slice(label);
            frame.push(NEWLINE);
        }

        match self {
            WireEncoding::Hex => {
                frame.extend_from_slice(hex::encode_upper(&octets).as_bytes());
                frame.push(NEWLINE);
            }
            WireEncoding::Octet => frame.extend_from_slice(&octets),
        }

        Some(frame)
    }
}

/// Newline-delimited frame reader over the target's output
///
/// Buffers partial reads and grows as needed, so frames of any length are accepted
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a byte source
    pub fn new(inner: R) -> Self {
        Self {
            inner: inner,
            buf: Vec::with_capacity(FRAME_CHUNK),
        }
    }

    /// Read the next frame, without its trailing newline
    ///
    /// errors: end of stream before any byte is `Closed`, part-way through a frame is `Truncated`
    pub fn next_frame(&mut self) -> Result<Vec<u8>, OracleIoError> {
        let mut chunk = [0_u8; FRAME_CHUNK];

        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == NEWLINE) {
                let mut frame: Vec<u8> = self.buf.drain(..=pos).collect();
                frame.pop();
                return Ok(frame);
            }

            let read = match self.inner.read(&mut chunk) {
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(OracleIoError::Read(e)),
            };

            if read == 0 {
                return if self.buf.is_empty() {
                    Err(OracleIoError::Closed)
                } else {
                    let partial = self.buf.len();
                    self.buf.clear();
                    Err(OracleIoError::Truncated(partial))
                };
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }
}
