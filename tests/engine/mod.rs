use std::cell::Cell;
use std::rc::Rc;

use num::bigint::BigUint;
use num::Zero;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use manger::{
    execute, AttackSession, CancelToken, Convention, Error, Interval, LocalOracle, Oracle,
    OracleResponse, Phase,
};

use crate::common::*;

// random message below B = 2**504
fn random_em(rng: &mut StdRng) -> BigUint {
    let mut em = [0_u8; REF_K - 1];
    rng.fill_bytes(&mut em);
    BigUint::from_bytes_be(&em)
}

#[test]
fn check_reference_key_recovery() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..3 {
        let m = random_em(&mut rng);
        let params = ref_params(&m, None);

        let recovery = execute(
            &params,
            ref_oracle(),
            Convention::MANGER,
            None,
            None,
            CancelToken::new(),
        )
        .unwrap();

        assert_eq!(recovery.em, m);
        assert!(recovery.interactions <= 2 * 512, "{} queries", recovery.interactions);
        assert!(recovery.message.is_none());
    }
}

#[test]
fn check_small_message_recovery() {
    // leading zero octets below the implicit one
    let m = BigUint::parse_bytes(b"0102030405060708090A", 16).unwrap();
    let params = ref_params(&m, None);

    let mut session = AttackSession::new(&params, ref_oracle());
    assert_eq!(session.run().unwrap(), m);
    assert_eq!(session.phase(), Phase::Converged);
}

#[test]
fn check_phase_invariants() {
    let mut rng = StdRng::seed_from_u64(1998);
    let m = random_em(&mut rng);
    let params = ref_params(&m, None);
    let n = params.n().clone();
    let b = params.b().clone();

    let mut session = AttackSession::new(&params, ref_oracle());

    let f1 = session.find_f1().unwrap();
    let f1_m = &f1 * &m;
    assert!(b <= f1_m && f1_m < (&b << 1_usize));
    assert!((&f1 >> 1_usize) * &m < b);
    assert_eq!(session.phase(), Phase::FindingF1);

    let f2 = session.find_f2().unwrap();
    let f2_m = &f2 * &m;
    assert!(n <= f2_m && f2_m < &n + &b);

    session.start_narrowing().unwrap();
    assert_eq!(session.phase(), Phase::Narrowing);

    let within_key = |interval: &Interval| {
        !interval.min.is_zero() && interval.min <= interval.max && interval.max < n
    };

    let interval = session.interval().unwrap();
    assert!(within_key(interval));
    assert!(interval.contains(&m));

    while !session.narrow_step().unwrap() {
        let interval = session.interval().unwrap();
        assert!(within_key(interval));
        assert!(interval.contains(&m));
    }

    assert_eq!(session.phase(), Phase::Converged);
    assert_eq!(session.interval().unwrap().min, m);
    assert!(session.interval().unwrap().is_point());
}

#[test]
fn check_boundary_convention() {
    // target only reports success when f = 64, every other query is out of range
    let params = toy_params(200);
    let convention = Convention::new(OracleResponse::Success, OracleResponse::PaddingError2).unwrap();
    let success = params.rsa_f(&BigUint::from(64_u8));

    let oracle = FnOracle(|c: &BigUint| -> manger::Result<OracleResponse> {
        if c == &success {
            Ok(OracleResponse::Success)
        } else {
            Ok(OracleResponse::RangeErrorP)
        }
    });

    let mut session = AttackSession::new(&params, oracle).with_convention(convention);
    assert_eq!(session.find_f1().unwrap(), BigUint::from(64_u8));
    // f1 = 2, 4, 8, 16, 32, 64
    assert_eq!(session.interactions(), 6);
}

#[test]
fn check_unexpected_narrowing_response() {
    let params = toy_params(200);
    let narrowing = Rc::new(Cell::new(false));

    let flag = narrowing.clone();
    let mut inner = LocalOracle::new(BigUint::from(3233_u32), BigUint::from(2753_u32));
    let oracle = FnOracle(move |c: &BigUint| {
        if flag.get() {
            Ok(OracleResponse::LengthErrorMessage)
        } else {
            inner.query(c)
        }
    });

    let mut session = AttackSession::new(&params, oracle);
    session.find_f1().unwrap();
    session.find_f2().unwrap();
    session.start_narrowing().unwrap();

    narrowing.set(true);
    assert!(matches!(session.narrow_step(), Err(Error::Protocol(_))));
}

#[test]
fn check_transport_error_aborts() {
    let params = toy_params(200);
    let oracle = FnOracle(|_: &BigUint| -> manger::Result<OracleResponse> {
        Err(Error::Protocol("unexpected status byte".into()))
    });

    let mut session = AttackSession::new(&params, oracle);
    assert!(matches!(session.run(), Err(Error::Protocol(_))));
    assert_eq!(session.phase(), Phase::Aborted("protocol"));
    assert_eq!(session.interactions(), 0);
}

#[test]
fn check_cancel_mid_attack() {
    let m = BigUint::parse_bytes(b"DEADBEEF", 16).unwrap();
    let params = ref_params(&m, None);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    let mut inner = ref_oracle();
    let mut queries = 0;
    let oracle = FnOracle(move |c: &BigUint| {
        queries += 1;
        if queries == 40 {
            trigger.cancel();
        }
        inner.query(c)
    });

    let mut session = AttackSession::new(&params, oracle).with_cancel(cancel);
    assert!(matches!(session.run(), Err(Error::Cancelled(_))));
    assert_eq!(session.interactions(), 40);
    assert_eq!(session.phase(), Phase::Aborted("cancelled"));
}

#[test]
fn check_oracle_reuse_through_reference() {
    let params = toy_params(77);
    let mut oracle = LocalOracle::new(BigUint::from(3233_u32), BigUint::from(2753_u32));

    let interactions = {
        let mut session = AttackSession::new(&params, &mut oracle);
        assert_eq!(session.run().unwrap(), BigUint::from(77_u8));
        session.interactions()
    };
    assert_eq!(oracle.queries(), interactions);
}
