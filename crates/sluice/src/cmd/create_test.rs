//! Tests for the create command's document builder

use super::*;

fn full_env() -> Environment {
    let mut env = Environment::new();
    sluice_components::register_all(&mut env);
    env
}

fn type_of(document: &Value, section: &str) -> String {
    document[section]["type"].as_str().unwrap().to_string()
}

#[test]
fn default_document_is_stdin_to_stdout() {
    let env = full_env();
    let document = build_document(&env, None, false).unwrap();

    assert_eq!(type_of(&document, "input"), "stdin");
    assert_eq!(type_of(&document, "output"), "stdout");
    assert!(document["pipeline"]["processors"]
        .as_array()
        .unwrap()
        .is_empty());
    assert!(document["resources"]["caches"].as_array().unwrap().is_empty());
}

#[test]
fn small_document_omits_scaffolding() {
    let env = full_env();
    let document = build_document(&env, None, true).unwrap();

    assert!(document.get("pipeline").is_none());
    assert!(document.get("resources").is_none());

    let rendered = toml::to_string_pretty(&document).unwrap();
    let parsed: sluice_config::EngineConfig = rendered.parse().unwrap();
    assert_eq!(parsed.input.unwrap().type_name, "stdin");
}

#[test]
fn expression_selects_components() {
    let env = full_env();
    let document =
        build_document(&env, Some("stdin/sync_response,compress/drop"), false).unwrap();

    assert_eq!(type_of(&document, "input"), "stdin");
    assert_eq!(type_of(&document, "output"), "drop");

    let processors = document["pipeline"]["processors"].as_array().unwrap();
    assert_eq!(processors.len(), 2);
    assert_eq!(processors[0]["type"].as_str(), Some("sync_response"));
    assert_eq!(processors[1]["type"].as_str(), Some("compress"));
}

#[test]
fn multiple_types_wrap_in_a_broker() {
    let env = full_env();
    let document = build_document(&env, Some("stdin,inproc//stdout,drop"), false).unwrap();

    assert_eq!(type_of(&document, "input"), "broker");
    let inputs = document["input"]["broker"]["inputs"].as_array().unwrap();
    assert_eq!(inputs.len(), 2);

    assert_eq!(type_of(&document, "output"), "broker");
    let outputs = document["output"]["broker"]["outputs"].as_array().unwrap();
    assert_eq!(outputs[1]["type"].as_str(), Some("drop"));
}

#[test]
fn unknown_types_are_rejected() {
    let env = full_env();

    let err = build_document(&env, Some("kafka"), false).unwrap_err();
    assert_eq!(err.to_string(), "unrecognised input type 'kafka'");

    let err = build_document(&env, Some("stdin/teleport/stdout"), false).unwrap_err();
    assert_eq!(err.to_string(), "unrecognised processor type 'teleport'");

    let err = build_document(&env, Some("stdin//warp"), false).unwrap_err();
    assert_eq!(err.to_string(), "unrecognised output type 'warp'");
}

#[test]
fn too_many_separators_are_rejected() {
    let env = full_env();
    let err = build_document(&env, Some("a/b/c/d"), false).unwrap_err();
    assert_eq!(err.to_string(), "more component separators than expected");
}

#[test]
fn rendered_document_parses_as_engine_config() {
    let env = full_env();
    let document = build_document(&env, Some("stdin/compress/stdout"), false).unwrap();
    let rendered = toml::to_string_pretty(&document).unwrap();

    let parsed: sluice_config::EngineConfig = rendered.parse().unwrap();
    assert_eq!(parsed.pipeline.processors.len(), 1);
    assert_eq!(parsed.pipeline.processors[0].type_name, "compress");
}
