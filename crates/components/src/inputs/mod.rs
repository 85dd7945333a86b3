//! Built-in inputs

mod batched;
mod inproc;
mod stdin;

pub use batched::BatchedConfig;

use sluice_manager::Environment;

/// Register every built-in input.
pub fn register_all(env: &mut Environment) {
    env.register_input("stdin", Box::new(|_conf, _env, _resources| Ok(stdin::spawn())));

    env.register_input(
        "inproc",
        Box::new(|conf, _env, resources| {
            let name: String = conf.parse_options()?;
            Ok(inproc::spawn(name, resources))
        }),
    );

    env.register_input(
        "batched",
        Box::new(|conf, env, resources| {
            let config: BatchedConfig = conf.parse_options()?;
            batched::build(config, env, resources)
        }),
    );
}
