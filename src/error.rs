//! Error taxonomy shared by the loader, the partitioner and the reducer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a summation can fail. Any variant aborts the whole run; no
/// partial total is ever produced alongside an error.
#[derive(Error, Debug)]
pub enum SumError {
    /// Invalid arguments, zero threads, more threads than values, empty input.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The input file is missing or unreadable.
    #[error("file error: {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A buffer for the input data or the per-worker bookkeeping could not
    /// be reserved.
    #[error("allocation error: cannot reserve {requested} entries for {what}")]
    Allocation { what: &'static str, requested: usize },

    /// A worker thread could not be started.
    #[error("dispatch error: cannot start worker {worker}: {source}")]
    Dispatch {
        worker: usize,
        #[source]
        source: io::Error,
    },

    /// A worker could not be awaited to completion. `worker` is `None` when
    /// the failure was only observed on the shared accumulator.
    #[error("join error: {}{message}", worker.map(|w| format!("worker {w}: ")).unwrap_or_default())]
    Join {
        worker: Option<usize>,
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SumError>;

impl SumError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn allocation(what: &'static str, requested: usize) -> Self {
        Self::Allocation { what, requested }
    }

    pub fn dispatch(worker: usize, source: io::Error) -> Self {
        Self::Dispatch { worker, source }
    }

    pub fn join(worker: usize, message: impl Into<String>) -> Self {
        Self::Join {
            worker: Some(worker),
            message: message.into(),
        }
    }

    pub fn poisoned(message: impl Into<String>) -> Self {
        Self::Join {
            worker: None,
            message: message.into(),
        }
    }

    /// Short name of the failure category, as printed in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "ConfigError",
            Self::File { .. } => "FileError",
            Self::Allocation { .. } => "AllocationError",
            Self::Dispatch { .. } => "DispatchError",
            Self::Join { .. } => "JoinError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_single_line() {
        let errors = [
            SumError::config("thread count 5 exceeds 4 values"),
            SumError::file("missing.bin", io::Error::from(io::ErrorKind::NotFound)),
            SumError::allocation("input values", 1 << 40),
            SumError::dispatch(2, io::Error::from(io::ErrorKind::WouldBlock)),
            SumError::join(1, "worker panicked"),
        ];

        for err in &errors {
            let text = err.to_string();
            assert!(!text.contains('\n'), "{} spans lines: {:?}", err.category(), text);
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(SumError::config("x").category(), "ConfigError");
        assert_eq!(SumError::join(0, "x").category(), "JoinError");
        assert_eq!(SumError::join(2, "panicked").to_string(), "join error: worker 2: panicked");
        assert_eq!(SumError::poisoned("lock poisoned").to_string(), "join error: lock poisoned");
        assert_eq!(
            SumError::allocation("partitions", 3).to_string(),
            "allocation error: cannot reserve 3 entries for partitions"
        );
    }
}
