use crate::error::{Error, Result};

/// Known conversions as (from, to, operators)
static CONVERSIONS: &[(&str, &str, &[&str])] = &[
    ("K", "degC", &["-subc,273.15"]),
    ("degC", "K", &["-addc,273.15"]),
    ("kg m-2 s-1", "mm/day", &["-mulc,86400"]),
    ("Pa", "hPa", &["-divc,100"]),
    ("hPa", "Pa", &["-mulc,100"]),
    ("1", "%", &["-mulc,100"]),
    ("%", "1", &["-divc,100"]),
];

/// CDO operators converting values from one unit to another
///
/// Operators are listed in the order they appear on the command line. Identical units need no
/// operators; a pair missing from the table is a configuration error.
pub fn conversion(from: &str, to: &str) -> Result<Vec<String>> {
    let (from, to) = (from.trim(), to.trim());
    if from == to {
        return Ok(Vec::new());
    }
    CONVERSIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, ops)| ops.iter().map(|op| op.to_string()).collect())
        .ok_or_else(|| Error::Config(format!("no conversion from '{from}' to '{to}'")))
}
