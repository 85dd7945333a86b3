//! Create command - print a starter config document
//!
//! An optional expression `inputs/processors/outputs` seeds the document,
//! where each segment is a comma-separated list of component types. One
//! type yields a single component; several yield a broker wrapping the
//! list. Without an expression the default `stdin → stdout` document is
//! printed.

use anyhow::{bail, Result};
use clap::Args;
use toml::value::{Table, Value};

use sluice_manager::Environment;

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Component expression, e.g. `stdin/mapping,compress/stdout`
    pub expression: Option<String>,

    /// Print a minimal document without optional scaffolding
    #[arg(long)]
    pub small: bool,
}

pub fn run(args: CreateArgs) -> Result<()> {
    let mut env = Environment::new();
    sluice_components::register_all(&mut env);

    let document = build_document(&env, args.expression.as_deref(), args.small)?;
    print!("{}", toml::to_string_pretty(&document)?);
    Ok(())
}

/// Build the config document for the given expression.
pub fn build_document(
    env: &Environment,
    expression: Option<&str>,
    small: bool,
) -> Result<Value> {
    let mut input_types = vec!["stdin".to_string()];
    let mut processor_types = Vec::new();
    let mut output_types = vec!["stdout".to_string()];

    if let Some(expression) = expression {
        let mut segments = [Vec::new(), Vec::new(), Vec::new()];
        for (index, segment) in expression.split('/').enumerate() {
            if index >= segments.len() {
                bail!("more component separators than expected");
            }
            for component_type in segment.split(',') {
                let component_type = component_type.trim();
                if !component_type.is_empty() {
                    segments[index].push(component_type.to_string());
                }
            }
        }
        let [inputs, processors, outputs] = segments;
        if !inputs.is_empty() {
            input_types = inputs;
        }
        processor_types = processors;
        if !outputs.is_empty() {
            output_types = outputs;
        }
    }

    for input_type in &input_types {
        if !env.has_input(input_type) {
            bail!("unrecognised input type '{input_type}'");
        }
    }
    for processor_type in &processor_types {
        if !env.has_processor(processor_type) {
            bail!("unrecognised processor type '{processor_type}'");
        }
    }
    for output_type in &output_types {
        if !env.has_output(output_type) {
            bail!("unrecognised output type '{output_type}'");
        }
    }

    let mut document = Table::new();
    document.insert("input".to_string(), broker_or_single(&input_types, "inputs"));

    if !processor_types.is_empty() || !small {
        let mut pipeline = Table::new();
        pipeline.insert(
            "processors".to_string(),
            Value::Array(processor_types.iter().map(|t| typed_component(t)).collect()),
        );
        document.insert("pipeline".to_string(), Value::Table(pipeline));
    }

    document.insert(
        "output".to_string(),
        broker_or_single(&output_types, "outputs"),
    );

    if !small {
        let mut resources = Table::new();
        for kind in ["caches", "rate_limits", "processors", "inputs", "outputs"] {
            resources.insert(kind.to_string(), Value::Array(Vec::new()));
        }
        document.insert("resources".to_string(), Value::Table(resources));
    }

    Ok(Value::Table(document))
}

fn typed_component(component_type: &str) -> Value {
    let mut table = Table::new();
    table.insert(
        "type".to_string(),
        Value::String(component_type.to_string()),
    );
    Value::Table(table)
}

fn broker_or_single(types: &[String], list_key: &str) -> Value {
    if types.len() == 1 {
        return typed_component(&types[0]);
    }
    let mut broker = Table::new();
    broker.insert(
        list_key.to_string(),
        Value::Array(types.iter().map(|t| typed_component(t)).collect()),
    );
    let mut table = Table::new();
    table.insert("type".to_string(), Value::String("broker".to_string()));
    table.insert("broker".to_string(), Value::Table(broker));
    Value::Table(table)
}
