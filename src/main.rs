//! `threaded-sum <filename> <thread_count>`
//!
//! Prints the total and the reduction time on stdout. Any failure prints a
//! single `Error: ...` line on stderr and exits with status 255.

use std::process::ExitCode;

use threaded_sum::{cli, config::Config};

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn main() -> ExitCode {
    let status = cli::run(
        std::env::args_os(),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
        init_logging,
    );
    ExitCode::from(status)
}
