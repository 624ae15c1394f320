//! FocusField sensor-fusion core entry point.
//!
//! Parses `--config` (plus per-field overrides), loads and validates the
//! config, constructs one [`focusfield::Runtime`], and blocks until a
//! shutdown signal is observed. Mirrors the teacher's top-level binary
//! shape: parse config, init logging, run, map errors to the process exit
//! code (spec.md §7).

use focusfield::config::Cli;
use focusfield::error::ConfigError;
use focusfield::runtime::ReplaySource;
use focusfield::{telemetry, Runtime};
use std::process::ExitCode;

/// Kind 2 config errors (spec.md §7): fatal at startup, no component thread
/// is ever spawned.
const EXIT_CONFIG_ERROR: u8 = 1;
/// Kind 4 programming faults surfaced from `Runtime::run`.
const EXIT_RUNTIME_FAULT: u8 = 2;

fn main() -> ExitCode {
    let (cli, config) = match Cli::parse_and_load() {
        Ok(pair) => pair,
        Err(err) => {
            report_config_error(&err);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    telemetry::init_tracing(cli.logs);

    let replay = cli.replay.as_ref().map(|path| ReplaySource {
        path: path.clone(),
        speed: cli.replay_speed as f32,
    });

    let runtime = Runtime::new(config, replay);

    let state_dir = cli.state_dir.clone();
    match runtime.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(event = "fatal", detail = %err);
            let report = focusfield::error::CrashReport::new(runtime.clock().now_ns(), "runtime", err.to_string());
            let _ = report.write_to(&state_dir);
            ExitCode::from(EXIT_RUNTIME_FAULT)
        }
    }
}

fn report_config_error(err: &ConfigError) {
    eprintln!("focusfield-core: configuration error: {err}");
}
