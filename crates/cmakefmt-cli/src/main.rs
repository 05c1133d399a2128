// crates/cmakefmt-cli/src/main.rs - CLI Application Entry Point
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────────┐
// │   User Input    │───▶│   CLI Parser     │───▶│  InvocationRequest  │
// │ (clap args)     │    │ (cli.rs)         │    │  (context.rs)       │
// └─────────────────┘    └──────────────────┘    └─────────────────────┘
//                                                           │
//                                                           ▼
//                        ┌──────────────────┐    ┌─────────────────────┐
//                        │     Services     │◀───│    Orchestrator     │
//                        │ (source / sink)  │    │ (commands/format)   │
//                        └──────────────────┘    └─────────────────────┘
//
// Exit status is 0 on success and 1 on any failure, or when --check finds
// a file that would be reformatted. Diagnostics always go to stderr; stdout
// carries only formatted output or a configuration dump.
//
// EXAMPLE USAGE:
// ```bash
// cmake-format CMakeLists.txt > formatted.txt
// cmake-format -i CMakeLists.txt
// git show HEAD:CMakeLists.txt | cmake-format -
// cmake-format --input-encoding=latin1 --output-encoding=latin1 -o out.cmake in.cmake
// ```

use anyhow::Result;
use clap::Parser;
use cmakefmt_core::ListFileFormatter;
use std::io;
use std::process::ExitCode;
use tracing::debug;

mod cli; // Command-line interface definitions
mod commands; // Pipeline and dump-config handlers
mod context; // Invocation request built from arguments
mod services; // Stream source and sink
mod stdin; // Standard input reading

use cli::Cli;
use commands::format::Outcome;
use context::InvocationRequest;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cmake-format: error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatch to the dump-config handler or the formatting pipeline
fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(format) = cli.dump_config {
        commands::dump_config::handle(&cli, format, io::stdout().lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    let request = InvocationRequest::from_cli(&cli)?;
    let outcome = commands::format::run(
        &request,
        &ListFileFormatter,
        io::stdin().lock(),
        io::stdout().lock(),
    )?;

    match outcome {
        Outcome::CheckFailed => {
            eprintln!("cmake-format: {} would be reformatted", request.source);
            Ok(ExitCode::FAILURE)
        }
        Outcome::Written { bytes } => {
            debug!("Formatted {} into {} ({} bytes)", request.source, request.sink, bytes);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Unchanged | Outcome::CheckPassed => Ok(ExitCode::SUCCESS),
    }
}

/// Install the stderr log subscriber
fn init_logging(level: cli::LogLevel) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::from(level))
        .with_target(false)
        .without_time()
        .init();
}
