use std::{
    cell::UnsafeCell,
    time::{Duration, Instant},
};

use crate::error::{Result, SumError};

/// A wrapper around UnsafeCell that implements Send and Sync for thread-safe access
/// where each worker writes to its own dedicated slot.
pub(crate) struct ThreadSafeUnsafeCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Send for ThreadSafeUnsafeCell<T> {}
unsafe impl<T: Send> Sync for ThreadSafeUnsafeCell<T> {}

impl<T> ThreadSafeUnsafeCell<T> {
    #[inline(always)]
    pub(crate) fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> *mut T {
        self.0.get()
    }
}

#[derive(Clone, Copy, Default)]
struct WorkerSlot {
    start: Option<Instant>,
    computation: Option<Duration>,
    elements: usize,
}

/// Per-worker timing for a single reduction.
///
/// Slot `i` is written only by worker `i`, and only while the reduction is
/// running. `finalize` and `stats` are called by the orchestrator after every
/// worker has been joined.
pub(crate) struct Timer {
    /// Reduction start.
    init_timestamp: Instant,

    /// Set by `finalize` once all workers are joined.
    completion_timestamp: ThreadSafeUnsafeCell<Instant>,

    /// One slot per worker, indexed by partition index.
    slots: Vec<ThreadSafeUnsafeCell<WorkerSlot>>,
}

// SAFETY: Timer is safe to share between workers because:
// 1. Each worker only writes to the slot matching its partition index
// 2. Slots are separate cells, so no two workers alias the same memory
// 3. The orchestrator only reads slots after joining every worker
unsafe impl Sync for Timer {}

impl Timer {
    /// Reserves one slot per worker. Fails with [`SumError::Allocation`] if the
    /// slots cannot be reserved.
    #[inline]
    pub(crate) fn try_new(num_workers: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(num_workers)
            .map_err(|_| SumError::allocation("worker timings", num_workers))?;
        slots.extend((0..num_workers).map(|_| ThreadSafeUnsafeCell::new(WorkerSlot::default())));

        let init_timestamp = Instant::now();
        Ok(Self {
            init_timestamp,
            completion_timestamp: ThreadSafeUnsafeCell::new(init_timestamp),
            slots,
        })
    }

    /// Record the moment worker `worker` starts summing its partition.
    #[inline]
    pub(crate) fn start_computation(&self, worker: usize) {
        assert!(worker < self.slots.len(), "Worker ID out of bounds");

        unsafe {
            (*self.slots[worker].get()).start = Some(Instant::now());
        }
    }

    /// Record the end of worker `worker`'s computation and how many elements it summed.
    #[inline]
    pub(crate) fn end_computation(&self, worker: usize, elements: usize) {
        assert!(worker < self.slots.len(), "Worker ID out of bounds");

        let end_time = Instant::now();

        unsafe {
            let slot = &mut *self.slots[worker].get();
            if let Some(start) = slot.start {
                slot.computation = Some(end_time.duration_since(start));
            }
            slot.elements = elements;
        }
    }

    /// Record the completion timestamp. Call after every worker is joined.
    #[inline]
    pub(crate) fn finalize(&self) {
        unsafe {
            *self.completion_timestamp.get() = Instant::now();
        }
    }

    /// Snapshot of the collected timings. Call after `finalize`.
    #[inline]
    pub(crate) fn stats(&self) -> TimingStats {
        unsafe {
            let slots: Vec<WorkerSlot> = self.slots.iter().map(|slot| *slot.get()).collect();

            TimingStats {
                init_timestamp: self.init_timestamp,
                completion_timestamp: *self.completion_timestamp.get(),
                computation_times_per_worker: slots.iter().map(|s| s.computation).collect(),
                elements_per_worker: slots.iter().map(|s| s.elements).collect(),
            }
        }
    }
}

/// Timing statistics collected during one reduction.
#[derive(Debug, Clone)]
pub struct TimingStats {
    /// Reduction start
    pub init_timestamp: Instant,
    /// Moment the last worker was joined
    pub completion_timestamp: Instant,
    /// Computation time of each worker, `None` if the worker never ran
    pub computation_times_per_worker: Vec<Option<Duration>>,
    /// Number of elements each worker summed
    pub elements_per_worker: Vec<usize>,
}

impl TimingStats {
    /// Total runtime from init to completion.
    #[inline]
    pub fn total_runtime(&self) -> Duration {
        self.completion_timestamp
            .duration_since(self.init_timestamp)
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.computation_times_per_worker.len()
    }

    /// Computation time of one worker.
    #[inline]
    pub fn worker_computation_time(&self, worker: usize) -> Option<Duration> {
        self.computation_times_per_worker.get(worker).copied().flatten()
    }

    /// Mean computation time across workers that ran.
    #[inline]
    pub fn average_computation_time(&self) -> Option<Duration> {
        let times: Vec<Duration> = self
            .computation_times_per_worker
            .iter()
            .flatten()
            .copied()
            .collect();
        if times.is_empty() {
            return None;
        }
        let total: Duration = times.iter().sum();
        Some(total / times.len() as u32)
    }

    /// Slowest worker time divided by the mean. 1.0 means perfectly balanced.
    pub fn imbalance(&self) -> Option<f64> {
        let average = self.average_computation_time()?;
        let slowest = self
            .computation_times_per_worker
            .iter()
            .flatten()
            .max()?;
        if average.is_zero() {
            return Some(1.0);
        }
        Some(slowest.as_secs_f64() / average.as_secs_f64())
    }

    /// Prints a formatted table of per-worker computation times.
    ///
    /// Table format:
    /// - Rows: Worker IDs (0, 1, 2, ...)
    /// - Columns: element count, computation time in milliseconds, share of total runtime
    ///
    /// The last row shows the total runtime and the imbalance ratio.
    pub fn plot(&self) {
        let num_workers = self.num_workers();

        if num_workers == 0 {
            println!("No timing data available to plot.");
            return;
        }

        let total_runtime = self.total_runtime();

        println!("\nWORKER COMPUTATION TIME TABLE");
        println!("Time format: milliseconds (ms) with microsecond precision");
        println!("Total Runtime: {:.3} ms", duration_to_ms(total_runtime));
        println!("{}", "=".repeat(52));

        println!("{:<12} {:<12} {:<12} {:<12}", "Worker", "Elements", "Comp (ms)", "Comp Ratio%");
        println!("{} {} {} {}", "-".repeat(12), "-".repeat(12), "-".repeat(12), "-".repeat(12));

        for worker in 0..num_workers {
            print!("{:<12} {:<12}", worker, self.elements_per_worker[worker]);
            match self.worker_computation_time(worker) {
                Some(comp_time) => {
                    print!(" {:<12.3}", duration_to_ms(comp_time));
                    if total_runtime.as_nanos() > 0 {
                        let ratio = comp_time.as_nanos() as f64 / total_runtime.as_nanos() as f64;
                        print!(" {:<12.1}", ratio * 100.0);
                    } else {
                        print!(" {:<12}", "0.0");
                    }
                }
                None => print!(" {:<12} {:<12}", "—", "—"),
            }
            println!();
        }

        println!("{}", "=".repeat(52));
        if let Some(imbalance) = self.imbalance() {
            println!("Imbalance (slowest / mean): {:.2}", imbalance);
        }
    }
}

/// Convert Duration to milliseconds as f64
#[inline]
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}
