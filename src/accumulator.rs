use std::sync::Mutex;

use crate::error::{Result, SumError};

/// The single shared total of a reduction.
///
/// Owned by the orchestrator and lent to every worker by reference. The
/// total and the fold counter live behind one mutex, so each fold is a
/// single exclusive update.
#[derive(Debug, Default)]
pub struct Accumulator {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    total: i64,
    folds: usize,
}

impl Accumulator {
    /// Creates an accumulator holding zero.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one worker's local sum to the total.
    ///
    /// Callers must finish their local accumulation before calling this; the
    /// lock is held only for the addition.
    ///
    /// A poisoned lock is reported as [`SumError::Join`] against `worker`.
    pub fn fold(&self, worker: usize, local_sum: i64) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SumError::join(worker, "accumulator lock poisoned by another worker"))?;
        state.total += local_sum;
        state.folds += 1;
        Ok(())
    }

    /// Number of folds applied so far.
    pub fn folds(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.folds,
            Err(poisoned) => poisoned.into_inner().folds,
        }
    }

    /// Consumes the accumulator and returns `(total, folds)`.
    ///
    /// Fails if a worker panicked while holding the lock, since the total may
    /// then be missing that worker's contribution.
    pub fn into_parts(self) -> Result<(i64, usize)> {
        let state = self
            .state
            .into_inner()
            .map_err(|_| SumError::poisoned("accumulator lock poisoned"))?;
        Ok((state.total, state.folds))
    }
}
