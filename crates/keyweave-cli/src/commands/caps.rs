use std::process::ExitCode;

use keyweave_vm::MappingConfig;

pub fn run(source: &str, config: &MappingConfig) -> ExitCode {
    match keyweave_vm::compile(source, config) {
        Ok(instance) => {
            match serde_json::to_string_pretty(&instance.capabilities()) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
