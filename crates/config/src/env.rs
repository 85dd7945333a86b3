//! Environment interpolation for config documents
//!
//! `${VAR}` references are replaced from the process environment before
//! parsing; `${VAR:fallback}` substitutes the fallback when the variable
//! is unset. A bare unset reference is an error, so missing secrets fail
//! loudly at load time.

use crate::error::{ConfigError, Result};

#[cfg(test)]
#[path = "env_test.rs"]
mod tests;

/// Replace `${VAR}` references in a raw config document.
pub fn interpolate_env(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference; leave it untouched.
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let reference = &after[..end];
        let (name, fallback) = match reference.split_once(':') {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (reference, None),
        };
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => match fallback {
                Some(fallback) => out.push_str(fallback),
                None => return Err(ConfigError::MissingEnvVar(name.to_string())),
            },
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
