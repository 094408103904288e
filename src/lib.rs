//! # threaded-sum - Parallel Summation over a Shared Accumulator
//!
//! Sums a fixed sequence of integers by splitting it into contiguous
//! partitions, summing each partition on its own thread, and folding every
//! partial sum into one mutex-guarded total.
//!
//! ## Key Features
//!
//! - **Contiguous Partitions**: Each worker owns one gap-free, non-overlapping range
//! - **Local Accumulation**: Workers sum outside the lock and fold exactly once
//! - **Scoped Workers**: All threads are joined before the total is read, on every exit path
//! - **Wide Total**: Partial sums and the total are `i64`
//!
//! ## Usage Pattern
//!
//! ```rust
//! use threaded_sum::Reducer;
//!
//! let data: Vec<i32> = (1..=100).collect();
//!
//! let total = Reducer::new(4).reduce(&data).unwrap();
//! assert_eq!(total, 5050);
//!
//! // More threads than values is rejected before anything is spawned.
//! assert!(Reducer::new(200).reduce(&data).is_err());
//! ```
//!
//! ## Thread Safety
//!
//! - The input is shared as `&[T]`; no worker can mutate it
//! - The accumulator is the only shared mutable state, behind a `Mutex`
//! - Workers run in a `std::thread::scope`, so none can outlive the call

#[cfg(test)]
mod tests;

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod partition;
pub mod reducer;
pub mod timer;

pub use accumulator::Accumulator;
pub use error::{Result, SumError};
pub use partition::{Partition, partition};
pub use reducer::{ReduceReport, Reducer, local_sum, reduce};
pub use timer::TimingStats;
