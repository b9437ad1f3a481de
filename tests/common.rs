use num::bigint::BigUint;

use manger::{LocalOracle, Oracle, OracleResponse, PublicKeyParams};

// 512-bit reference key, e = 65537
const REF_N: &str = "BBC100D47327051D0F9F6895CEF53A33C709F9A3B0D0D06EA04CA7BFE449B5C41EFE2A8DEED9527F69B8C24BB45E4C358F14B24A37C8C60E61E9EEDB3B8FC4E3";
const REF_D: &str = "22D04ECF15EB0E4FAD2DE9BE9D796B295EA6C2DB4F55E8D01A791C41C09ACA5119D0FE8365860D2C104FC31AF01C7A1980FB679847DFCF8F07C68D4A59D59441";
const REF_E: u32 = 65537;

/// Modulus length of the reference key in bytes
#[allow(dead_code)]
pub const REF_K: usize = 64;

#[allow(dead_code)]
pub fn ref_n() -> BigUint {
    BigUint::parse_bytes(REF_N.as_bytes(), 16).unwrap()
}

#[allow(dead_code)]
pub fn ref_d() -> BigUint {
    BigUint::parse_bytes(REF_D.as_bytes(), 16).unwrap()
}

#[allow(dead_code)]
pub fn ref_e() -> BigUint {
    BigUint::from(REF_E)
}

/// Attack parameters for a known message under the reference key
#[allow(dead_code)]
pub fn ref_params(m: &BigUint, label: Option<Vec<u8>>) -> PublicKeyParams {
    let n = ref_n();
    let c = m.modpow(&ref_e(), &n);
    PublicKeyParams::new(n, ref_e(), c, label).unwrap()
}

/// Faithful oracle for the reference key
#[allow(dead_code)]
pub fn ref_oracle() -> LocalOracle {
    LocalOracle::new(ref_n(), ref_d())
}

/// Attack parameters for the toy key N = 3233 = 61 * 53, e = 17
#[allow(dead_code)]
pub fn toy_params(m: u32) -> PublicKeyParams {
    let n = BigUint::from(3233_u32);
    let e = BigUint::from(17_u32);
    let c = BigUint::from(m).modpow(&e, &n);
    PublicKeyParams::new(n, e, c, None).unwrap()
}

/// Oracle scripted by a closure over the submitted ciphertext
pub struct FnOracle<F>(pub F);

impl<F> Oracle for FnOracle<F>
where
    F: FnMut(&BigUint) -> manger::Result<OracleResponse>,
{
    fn query(&mut self, candidate: &BigUint) -> manger::Result<OracleResponse> {
        (self.0)(candidate)
    }
}

// write an executable shell script standing in for the target
#[cfg(unix)]
#[allow(dead_code)]
pub fn target_script(body: &str) -> tempfile::TempPath {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let mut file = tempfile::Builder::new()
        .prefix("target")
        .suffix(".sh")
        .tempfile()
        .unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();

    let path = file.into_temp_path();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
