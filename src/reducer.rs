//! Parallel reduction: partition, dispatch one worker per partition, join
//! them all, read the shared total.

use std::{
    any::Any,
    io,
    thread::{self, ScopedJoinHandle},
    time::{Duration, Instant},
};

use tracing::{Span, debug, debug_span, info, info_span, warn};

use crate::{
    accumulator::Accumulator,
    error::{Result, SumError},
    partition::{Partition, partition},
    timer::{Timer, TimingStats},
};

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_NAME: &str = "sum-worker";

/// Sums `data` with `num_threads` workers.
///
/// Shorthand for `Reducer::new(num_threads).reduce(data)`.
///
/// ```rust
/// let total = threaded_sum::reduce(&[5, -3, 2], 1).unwrap();
/// assert_eq!(total, 4);
/// ```
pub fn reduce<T>(data: &[T], num_threads: usize) -> Result<i64>
where
    T: Copy + Sync + Into<i64>,
{
    Reducer::new(num_threads).reduce(data)
}

/// Sequential sum of `values` in the wide accumulator type.
#[inline]
pub fn local_sum<T>(values: &[T]) -> i64
where
    T: Copy + Into<i64>,
{
    values.iter().map(|&v| v.into()).sum()
}

/// Outcome of a timed reduction.
#[derive(Debug, Clone)]
pub struct ReduceReport {
    /// Sum of every input value.
    pub total: i64,
    /// Number of workers whose partial sum was folded into the total.
    pub workers: usize,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
    /// Per-worker timings.
    pub stats: TimingStats,
}

/// Configured parallel reducer.
///
/// A `Reducer` holds no state between calls; the same instance can run any
/// number of reductions, from any number of threads.
#[derive(Debug, Clone)]
pub struct Reducer {
    num_threads: usize,
    thread_name: String,
    stack_size: Option<usize>,
}

/// Everything one worker needs: its partition, the shared read-only input,
/// and handles to the accumulator and timer owned by the orchestrator.
struct WorkerTask<'a, T> {
    partition: Partition,
    data: &'a [T],
    accumulator: &'a Accumulator,
    timer: &'a Timer,
    span: Span,
}

impl<T> WorkerTask<'_, T>
where
    T: Copy + Into<i64>,
{
    /// Sums the partition outside the lock, then folds once.
    fn run(self) -> Result<i64> {
        let _enter = self.span.enter();
        let index = self.partition.index;

        self.timer.start_computation(index);
        let local = local_sum(self.partition.slice(self.data));
        self.timer.end_computation(index, self.partition.len());

        self.accumulator.fold(index, local)?;
        debug!(local_sum = local, "folded partial sum");
        Ok(local)
    }
}

impl Reducer {
    /// Creates a reducer that splits work across `num_threads` workers.
    ///
    /// The thread count is validated against the input length on each call
    /// to [`Reducer::reduce`].
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }

    /// Worker threads are named `<prefix>-<index>`.
    pub fn with_thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Stack size for worker threads, in bytes. Defaults to the platform default.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Sums `data` in parallel.
    ///
    /// # Errors
    ///
    /// - [`SumError::Config`] if the thread count is zero, the input is empty,
    ///   or there are more threads than values. No worker is started.
    /// - [`SumError::Allocation`] if the per-worker bookkeeping cannot be reserved.
    /// - [`SumError::Dispatch`] if a worker thread cannot be spawned. Workers
    ///   already running are joined before returning.
    /// - [`SumError::Join`] if a worker panics.
    pub fn reduce<T>(&self, data: &[T]) -> Result<i64>
    where
        T: Copy + Sync + Into<i64>,
    {
        self.reduce_timed(data).map(|report| report.total)
    }

    /// Like [`Reducer::reduce`], also returning per-worker timings.
    pub fn reduce_timed<T>(&self, data: &[T]) -> Result<ReduceReport>
    where
        T: Copy + Sync + Into<i64>,
    {
        self.run(data, |_| Ok(()))
    }

    /// Runs one reduction. `gate` is consulted before each spawn; an error from
    /// it is treated exactly like a failed spawn.
    pub(crate) fn run<T, G>(&self, data: &[T], gate: G) -> Result<ReduceReport>
    where
        T: Copy + Sync + Into<i64>,
        G: Fn(usize) -> io::Result<()>,
    {
        let span = info_span!("reduce", values = data.len(), threads = self.num_threads);
        let _enter = span.enter();

        let partitions = partition(data.len(), self.num_threads)?;
        let accumulator = Accumulator::new();
        let timer = Timer::try_new(partitions.len())?;
        let started = Instant::now();

        thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::new();
            handles
                .try_reserve_exact(partitions.len())
                .map_err(|_| SumError::allocation("worker handles", partitions.len()))?;

            let mut dispatch_error = None;
            for &partition in &partitions {
                let task = WorkerTask {
                    partition,
                    data,
                    accumulator: &accumulator,
                    timer: &timer,
                    span: debug_span!(
                        "worker",
                        index = partition.index,
                        start = partition.start,
                        end = partition.end
                    ),
                };

                let spawned = gate(partition.index).and_then(|()| {
                    self.builder(partition.index)
                        .spawn_scoped(scope, move || task.run())
                });
                match spawned {
                    Ok(handle) => handles.push((partition.index, handle)),
                    Err(source) => {
                        warn!(worker = partition.index, error = %source, "failed to start worker");
                        dispatch_error = Some(SumError::dispatch(partition.index, source));
                        break;
                    }
                }
            }

            let joined = join_all(handles);
            match dispatch_error {
                Some(err) => Err(err),
                None => joined,
            }
        })?;

        timer.finalize();
        let elapsed = started.elapsed();
        let (total, folds) = accumulator.into_parts()?;
        debug_assert_eq!(folds, partitions.len(), "every worker folds exactly once");

        info!(total, workers = folds, elapsed_ms = elapsed.as_secs_f64() * 1e3, "reduction complete");

        Ok(ReduceReport {
            total,
            workers: folds,
            elapsed,
            stats: timer.stats(),
        })
    }

    fn builder(&self, index: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("{}-{}", self.thread_name, index));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

/// Joins every handle, even after a failure, and returns the first error seen.
fn join_all(handles: Vec<(usize, ScopedJoinHandle<'_, Result<i64>>)>) -> Result<()> {
    let mut first_error = None;

    for (index, handle) in handles {
        let outcome = match handle.join() {
            Ok(result) => result.map(|_| ()),
            Err(payload) => Err(SumError::join(index, panic_message(payload.as_ref()))),
        };
        if let Err(err) = outcome {
            warn!(worker = index, error = %err, "worker failed");
            first_error.get_or_insert(err);
        }
    }

    first_error.map_or(Ok(()), Err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}
