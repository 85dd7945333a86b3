//! Tests for environment interpolation

use super::*;

#[test]
fn replaces_set_variables() {
    std::env::set_var("SLUICE_TEST_PORT", "4195");
    let out = interpolate_env("port = ${SLUICE_TEST_PORT}").unwrap();
    assert_eq!(out, "port = 4195");
}

#[test]
fn unset_variable_is_an_error() {
    std::env::remove_var("SLUICE_TEST_UNSET");
    let err = interpolate_env("key = \"${SLUICE_TEST_UNSET}\"").unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "SLUICE_TEST_UNSET"));
}

#[test]
fn fallback_applies_when_unset() {
    std::env::remove_var("SLUICE_TEST_FALLBACK");
    let out = interpolate_env("addr = \"${SLUICE_TEST_FALLBACK:0.0.0.0}\"").unwrap();
    assert_eq!(out, "addr = \"0.0.0.0\"");
}

#[test]
fn set_variable_beats_fallback() {
    std::env::set_var("SLUICE_TEST_SET", "real");
    let out = interpolate_env("v = \"${SLUICE_TEST_SET:fallback}\"").unwrap();
    assert_eq!(out, "v = \"real\"");
}

#[test]
fn text_without_references_is_unchanged() {
    let raw = "plain = \"text $ without refs\"";
    assert_eq!(interpolate_env(raw).unwrap(), raw);
}

#[test]
fn unterminated_reference_is_left_alone() {
    let raw = "v = \"${OOPS\"";
    assert_eq!(interpolate_env(raw).unwrap(), raw);
}
