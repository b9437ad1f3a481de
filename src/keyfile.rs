use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::params::PublicKeyParams;

/// Load attack parameters from a key file
///
/// One base-16 field per line, in order: N, E, an optional label L, and C
pub fn load<P: AsRef<Path>>(path: P) -> Result<PublicKeyParams> {
    let data = fs::read_to_string(&path).map_err(|e| {
        Error::Setup(format!(
            "failed to read key file '{}': {}",
            path.as_ref().display(),
            e
        ))
    })?;
    parse(&data)
}

/// Parse key file contents
///
/// K is N's byte length. An N field padded wider than that would put B at or above N, so it
/// is rejected.
///
/// errors: wrong number of fields, a field that is not base-16, or an over-wide N field
pub fn parse(data: &str) -> Result<PublicKeyParams> {
    let fields: Vec<&str> = data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let (n_field, e_field, label, c_field) = match fields.as_slice() {
        [n, e, c] => (*n, *e, None, *c),
        [n, e, l, c] => (*n, *e, Some(*l), *c),
        _ => {
            return Err(Error::Setup(format!(
                "expected 3 or 4 key fields (N, E, [L], C), got {}",
                fields.len()
            )))
        }
    };

    let params = PublicKeyParams::from_hex(n_field, e_field, c_field, label)?;

    let width = (n_field.len() + 1) / 2;
    if width > params.k() {
        return Err(Error::Setup(format!(
            "N field is {} bytes wide but N is only {} bytes",
            width,
            params.k()
        )));
    }

    Ok(params)
}
