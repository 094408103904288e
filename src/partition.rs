use std::ops::RangeInclusive;

use crate::error::{Result, SumError};

/// One worker's contiguous share of the input.
///
/// Bounds are inclusive on both ends: a partition always owns at least one
/// element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Worker index this partition is assigned to (0-based).
    pub index: usize,
    /// First owned element.
    pub start: usize,
    /// Last owned element.
    pub end: usize,
}

impl Partition {
    /// Number of elements owned by this partition.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Partitions are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Borrows the owned elements out of the full input.
    ///
    /// # Panics
    ///
    /// Panics if `data` is shorter than `end + 1`.
    #[inline]
    pub fn slice<'a, T>(&self, data: &'a [T]) -> &'a [T] {
        &data[self.range()]
    }
}

/// Splits `len` elements among `num_threads` workers.
///
/// Every worker gets `len / num_threads` elements; the last worker also takes
/// the `len % num_threads` leftover elements. The returned partitions are in
/// index order and cover `[0, len - 1]` exactly once.
///
/// Fails with [`SumError::Config`] when `num_threads` is zero, when the input
/// is empty, or when there are more workers than elements.
///
/// ```rust
/// use threaded_sum::partition::partition;
///
/// let parts = partition(10, 3).unwrap();
/// let bounds: Vec<_> = parts.iter().map(|p| (p.start, p.end)).collect();
/// assert_eq!(bounds, [(0, 2), (3, 5), (6, 9)]);
/// ```
pub fn partition(len: usize, num_threads: usize) -> Result<Vec<Partition>> {
    if num_threads == 0 {
        return Err(SumError::config("thread count must be greater than 0"));
    }
    if len == 0 {
        return Err(SumError::config("input contains no values"));
    }
    if num_threads > len {
        return Err(SumError::config(format!(
            "too many threads requested: {num_threads} threads for {len} values"
        )));
    }

    let mut partitions = Vec::new();
    partitions
        .try_reserve_exact(num_threads)
        .map_err(|_| SumError::allocation("partitions", num_threads))?;

    let slice = len / num_threads;
    for index in 0..num_threads {
        let start = index * slice;
        let end = if index == num_threads - 1 {
            len - 1
        } else {
            (index + 1) * slice - 1
        };
        partitions.push(Partition { index, start, end });
    }

    Ok(partitions)
}
