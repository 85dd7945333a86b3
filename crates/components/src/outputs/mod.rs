//! Built-in outputs

mod drop;
mod inproc;
mod stdout;

use sluice_manager::Environment;

/// Register every built-in output.
pub fn register_all(env: &mut Environment) {
    env.register_output("stdout", Box::new(|_conf, _env, _resources| Ok(stdout::spawn())));

    env.register_output("drop", Box::new(|_conf, _env, _resources| Ok(drop::spawn())));

    env.register_output(
        "inproc",
        Box::new(|conf, _env, resources| {
            let name: String = conf.parse_options()?;
            Ok(inproc::spawn(name, resources))
        }),
    );
}
