use std::process::ExitCode;

use keyweave_vm::MappingConfig;

pub fn run(source: &str, config: &MappingConfig) -> ExitCode {
    match keyweave_vm::compile(source, config) {
        Ok(instance) => {
            print!("{}", instance.tree().dump());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
