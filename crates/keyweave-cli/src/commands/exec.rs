use std::process::ExitCode;
use std::time::{Duration, Instant};

use keyweave_vm::MappingConfig;

/// Dry-run a macro against stdout. With `--hold-ms` the trigger is armed
/// before the run and released after the given time, so hold-sensitive
/// macros behave like a real key press of that length.
pub fn run(source: &str, config: &MappingConfig, hold_ms: Option<u64>) -> ExitCode {
    let instance = match keyweave_vm::compile(source, config) {
        Ok(instance) => instance,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        let start = Instant::now();
        let sink = move |ev_type: u16, code: u16, value: i32| {
            let at = start.elapsed().as_secs_f64() * 1000.0;
            println!("{at:>9.3} ms  type {ev_type} code {code} value {value}");
        };

        match hold_ms {
            Some(hold) => {
                instance.press_key();
                let release = async {
                    tokio::time::sleep(Duration::from_millis(hold)).await;
                    instance.release_key();
                };
                tokio::join!(instance.run(&sink), release);
            }
            None => instance.run(&sink).await,
        }
    });
    ExitCode::SUCCESS
}
