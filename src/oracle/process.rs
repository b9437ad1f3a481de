use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use num::bigint::BigUint;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::response::OracleResponse;
use crate::wire::{FrameReader, WireEncoding};

use super::{Oracle, OracleIoError};

type Frame = core::result::Result<Vec<u8>, OracleIoError>;

/// Decryption oracle backed by an external target process
///
/// Queries are written to the target's stdin; one newline-terminated response line is
/// read back from its stdout per query. A reader thread owns stdout so reads can time out.
pub struct ProcessOracle {
    program: PathBuf,
    k: usize,
    label: Option<Vec<u8>>,
    encoding: WireEncoding,
    transport: TransportConfig,
    target: Option<Target>,
}

// A running target and the channel its response frames arrive on
struct Target {
    child: Child,
    stdin: ChildStdin,
    frames: Receiver<Frame>,
}

impl ProcessOracle {
    /// Launch the target program
    ///
    /// `k` is the modulus byte length every candidate is padded to.
    /// `label`, when present, is the label line written verbatim before each ciphertext.
    ///
    /// errors: the program cannot be found or launched
    pub fn spawn<P: AsRef<Path>>(
        program: P,
        k: usize,
        label: Option<Vec<u8>>,
        encoding: WireEncoding,
        transport: TransportConfig,
    ) -> Result<Self> {
        let mut oracle = Self {
            program: program.as_ref().to_path_buf(),
            k: k,
            label: label,
            encoding: encoding,
            transport: transport,
            target: None,
        };

        let target = oracle.launch().map_err(|e| {
            Error::Setup(format!(
                "error running command '{}': {}",
                oracle.program.display(),
                e
            ))
        })?;
        oracle.target = Some(target);

        Ok(oracle)
    }

    fn launch(&self) -> core::result::Result<Target, OracleIoError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(OracleIoError::Spawn)?;

        debug!(pid = child.id(), program = %self.program.display(), "launched target");

        let stdin = child.stdin.take().ok_or(OracleIoError::Closed)?;
        let stdout = child.stdout.take().ok_or(OracleIoError::Closed)?;
        let (tx, rx) = mpsc::channel::<Frame>();

        thread::spawn(move || {
            let mut reader = FrameReader::new(stdout);
            loop {
                let frame = reader.next_frame();
                let done = frame.is_err();
                if tx.send(frame).is_err() || done {
                    break;
                }
            }
        });

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    match line {
                        Ok(line) => debug!(target: "manger::target", "stderr: {}", line),
                        Err(_) => break,
                    }
                }
            });
        }

        Ok(Target {
            child: child,
            stdin: stdin,
            frames: rx,
        })
    }

    fn shutdown(&mut self) {
        if let Some(mut target) = self.target.take() {
            let _ = target.child.kill();
            let _ = target.child.wait();
        }
    }

    // One write/read round trip, relaunching the target first if a previous attempt killed it
    fn exchange(&mut self, frame: &[u8]) -> core::result::Result<Vec<u8>, OracleIoError> {
        if self.target.is_none() {
            self.target = Some(self.launch()?);
        }
        let timeout = self.transport.timeout();
        let target = match self.target.as_mut() {
            Some(target) => target,
            None => return Err(OracleIoError::Closed),
        };

        target.stdin.write_all(frame).map_err(OracleIoError::Write)?;
        target.stdin.flush().map_err(OracleIoError::Write)?;

        let reply = match timeout {
            Some(timeout) => target.frames.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => OracleIoError::Timeout(timeout),
                RecvTimeoutError::Disconnected => OracleIoError::Closed,
            })?,
            None => target.frames.recv().map_err(|_| OracleIoError::Closed)?,
        }?;

        if reply.is_empty() {
            return Err(OracleIoError::EmptyFrame);
        }
        Ok(reply)
    }
}

impl Oracle for ProcessOracle {
    fn query(&mut self, candidate: &BigUint) -> Result<OracleResponse> {
        let frame = self
            .encoding
            .encode_query(candidate, self.k, self.label.as_deref())
            .ok_or_else(|| {
                Error::Protocol(format!("candidate does not fit in {} bytes", self.k))
            })?;

        let mut attempt = 0;
        loop {
            match self.exchange(&frame) {
                Ok(reply) => return OracleResponse::from_status_byte(reply[0]),
                Err(e) if attempt < self.transport.retries => {
                    let backoff = self.transport.backoff(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        retries = self.transport.retries,
                        "oracle transport failed, relaunching target after {:?}",
                        backoff
                    );
                    // a late reply from the old target would desynchronise the stream
                    self.shutdown();
                    thread::sleep(backoff);
                    attempt += 1;
                }
                Err(e) => {
                    self.shutdown();
                    return Err(e.into());
                }
            }
        }
    }
}

impl Drop for ProcessOracle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
