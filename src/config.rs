use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use tracing::Level;

use crate::error::{Result, SumError};

/// Sum a binary file of native-endian 32-bit integers using several threads.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "threaded-sum", version)]
pub struct Config {
    /// File holding the values, 4 bytes each, no header
    pub filename: PathBuf,

    /// Number of worker threads; must not exceed the number of values
    pub thread_count: usize,

    /// Print each worker's computation time (needs the `profiler` feature)
    #[arg(long)]
    pub per_worker: bool,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What the binary should do after looking at its arguments.
#[derive(Debug)]
pub enum Invocation {
    Run(Config),
    /// `--help` or `--version`; print and exit successfully.
    Info(clap::Error),
}

impl Config {
    /// Parses an explicit argument list (first item is the program name).
    ///
    /// Usage mistakes, including a non-numeric or zero thread count, become
    /// [`SumError::Config`]. The thread count is checked against the number of
    /// values later, once the input is loaded.
    pub fn parse_from_iter<I, T>(args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(config) => {
                config.validate()?;
                Ok(Invocation::Run(config))
            }
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Ok(Invocation::Info(err))
            }
            Err(err) => Err(SumError::config(summary(&err.to_string()))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(SumError::config("thread count must be greater than 0"));
        }
        Ok(())
    }

    /// Maximum level for the stderr log subscriber.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Folds clap's error text up to the blank line before `Usage:` into one line,
/// keeping continuation lines such as missing argument names.
fn summary(message: &str) -> String {
    message
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches("error: ")
        .to_string()
}
