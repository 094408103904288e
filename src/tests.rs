use super::*;
use proptest::prelude::*;
use rand::{Rng, thread_rng};
use rayon::prelude::*;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

fn sequential_sum(data: &[i32]) -> i64 {
    data.iter().map(|&v| v as i64).sum()
}

fn random_values(len: usize) -> Vec<i32> {
    let mut rng = thread_rng();
    (0..len).map(|_| rng.r#gen::<i32>()).collect()
}

/// Element type whose conversion panics on a marker value, used to kill a worker.
#[derive(Clone, Copy)]
struct Fragile(i32);

const POISON: i32 = i32::MIN;

impl From<Fragile> for i64 {
    fn from(value: Fragile) -> i64 {
        if value.0 == POISON {
            panic!("poisoned element");
        }
        value.0 as i64
    }
}

#[test]
fn test_single_thread_sums_everything() {
    assert_eq!(reduce(&[5, -3, 2], 1).unwrap(), 4);
}

#[test]
fn test_one_value_per_thread() {
    let data = [7, -11, 13, 1_000_000];
    let report = Reducer::new(4).reduce_timed(&data).unwrap();

    assert_eq!(report.total, 1_000_009);
    assert_eq!(report.workers, 4);
    assert_eq!(report.stats.elements_per_worker, [1, 1, 1, 1]);
}

#[test]
fn test_remainder_worker_sums_its_extra_values() {
    let data: Vec<i32> = (1..=10).collect();
    let report = Reducer::new(3).reduce_timed(&data).unwrap();

    assert_eq!(report.total, 55);
    assert_eq!(report.stats.elements_per_worker, [3, 3, 4]);
}

#[test]
fn test_matches_sequential_sum_on_random_data() {
    let mut rng = thread_rng();

    for round in 0..50 {
        let len = rng.gen_range(1..5_000);
        let threads = rng.gen_range(1..=len.min(32));
        let data = random_values(len);

        let expected = sequential_sum(&data);
        let oracle: i64 = data.par_iter().map(|&v| v as i64).sum();
        assert_eq!(expected, oracle);

        let total = reduce(&data, threads).unwrap();
        assert_eq!(
            total, expected,
            "round {}: {} values on {} threads",
            round, len, threads
        );
    }
}

#[test]
fn test_thread_count_invariance() {
    let data = random_values(97);
    let baseline = reduce(&data, 1).unwrap();

    for threads in 1..=data.len() {
        assert_eq!(
            reduce(&data, threads).unwrap(),
            baseline,
            "{} threads disagree with 1 thread",
            threads
        );
    }
}

#[test]
fn test_repeated_reductions_agree() {
    let data = random_values(10_000);
    let reducer = Reducer::new(6);
    let first = reducer.reduce(&data).unwrap();

    for _ in 0..20 {
        assert_eq!(reducer.reduce(&data).unwrap(), first);
    }
}

#[test]
fn test_concurrent_callers_share_input() {
    let data = random_values(50_000);
    let expected = sequential_sum(&data);

    let totals: Vec<i64> = (1..=16usize)
        .into_par_iter()
        .map(|threads| reduce(&data, threads).unwrap())
        .collect();

    assert!(totals.iter().all(|&t| t == expected));
}

#[test]
fn test_extreme_values_do_not_overflow() {
    let high = vec![i32::MAX; 4_096];
    assert_eq!(reduce(&high, 8).unwrap(), 4_096 * i32::MAX as i64);

    let low = vec![i32::MIN; 4_096];
    assert_eq!(reduce(&low, 3).unwrap(), 4_096 * i32::MIN as i64);

    let mixed: Vec<i32> = (0..1_000).map(|i| if i % 2 == 0 { i32::MAX } else { i32::MIN }).collect();
    assert_eq!(reduce(&mixed, 7).unwrap(), -500);
}

#[test]
fn test_other_integer_widths() {
    let bytes: Vec<i8> = vec![-128, 127, -1, 1, 100];
    assert_eq!(reduce(&bytes, 2).unwrap(), 99);

    let unsigned: Vec<u32> = vec![u32::MAX; 3];
    assert_eq!(reduce(&unsigned, 3).unwrap(), 3 * u32::MAX as i64);
}

#[test]
fn test_more_threads_than_values_dispatches_nothing() {
    let spawned = AtomicUsize::new(0);
    let gate = |_: usize| -> io::Result<()> {
        spawned.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    let err = Reducer::new(5).run(&[1, 2, 3, 4], gate).unwrap_err();

    assert!(matches!(err, SumError::Config { .. }));
    assert_eq!(spawned.load(Ordering::SeqCst), 0);
}

#[test]
fn test_zero_threads_and_empty_input_are_rejected() {
    assert_eq!(reduce(&[1, 2], 0).unwrap_err().category(), "ConfigError");
    assert_eq!(reduce::<i32>(&[], 1).unwrap_err().category(), "ConfigError");
}

#[test]
fn test_dispatch_failure_stops_and_joins_started_workers() {
    let data = random_values(1_000);
    let attempts = AtomicUsize::new(0);
    let gate = |worker: usize| -> io::Result<()> {
        attempts.fetch_add(1, Ordering::SeqCst);
        if worker == 2 {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "out of threads"))
        } else {
            Ok(())
        }
    };

    let err = Reducer::new(4).run(&data, gate).unwrap_err();

    match err {
        SumError::Dispatch { worker, ref source } => {
            assert_eq!(worker, 2);
            assert_eq!(source.kind(), io::ErrorKind::WouldBlock);
        }
        other => panic!("expected a dispatch error, got {other:?}"),
    }
    // Worker 3 is never attempted once worker 2 fails.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_panicking_worker_is_a_join_error() {
    let mut data: Vec<Fragile> = (0..100).map(Fragile).collect();
    data[75] = Fragile(POISON);

    // 100 values on 4 threads: index 75 belongs to worker 3.
    let err = reduce(&data, 4).unwrap_err();
    match err {
        SumError::Join { worker, ref message } => {
            assert_eq!(worker, Some(3));
            assert!(message.contains("poisoned element"), "{message}");
        }
        other => panic!("expected a join error, got {other:?}"),
    }

    // The same input without the marker still sums.
    data[75] = Fragile(75);
    assert_eq!(reduce(&data, 4).unwrap(), 4_950);
}

#[test]
fn test_named_workers_with_small_stacks() {
    let data = random_values(2_048);
    let reducer = Reducer::new(8)
        .with_thread_name("test-sum")
        .with_stack_size(64 * 1024);

    assert_eq!(reducer.num_threads(), 8);
    assert_eq!(reducer.reduce(&data).unwrap(), sequential_sum(&data));
}

#[test]
fn test_report_timings_cover_every_worker() {
    const NUM_THREADS: usize = 4;

    let data = random_values(200_000);
    let start_time = Instant::now();
    let report = Reducer::new(NUM_THREADS).reduce_timed(&data).unwrap();
    let wall = start_time.elapsed();

    assert_eq!(report.total, sequential_sum(&data));
    assert_eq!(report.stats.num_workers(), NUM_THREADS);
    assert_eq!(report.stats.elements_per_worker.iter().sum::<usize>(), data.len());
    for worker in 0..NUM_THREADS {
        let time = report.stats.worker_computation_time(worker).unwrap();
        assert!(time <= report.stats.total_runtime());
    }
    assert!(report.elapsed <= wall);

    println!("Reduction of {} values:", data.len());
    println!("  Total time: {:?}", report.elapsed);
    println!("  Imbalance: {:?}", report.stats.imbalance());

    #[cfg(feature = "profiler")]
    report.stats.plot();
}

#[test]
fn test_loaded_file_reduces_to_its_sum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.bin");
    let data = random_values(loader::CHUNK_VALUES * 3 + 5);

    loader::write_values(&path, &data).unwrap();
    let loaded = loader::load_values(&path).unwrap();

    assert_eq!(loaded.len(), data.len());
    assert_eq!(reduce(&loaded, 10).unwrap(), sequential_sum(&data));
}

proptest! {
    #[test]
    fn test_reduce_equals_sequential_sum(
        (data, threads) in prop::collection::vec(any::<i32>(), 1..400)
            .prop_flat_map(|data| {
                let len = data.len();
                (Just(data), 1..=len)
            })
    ) {
        prop_assert_eq!(reduce(&data, threads).unwrap(), sequential_sum(&data));
    }

    #[test]
    fn test_too_many_threads_always_rejected(len in 0usize..64, extra in 1usize..8) {
        let data = vec![1i32; len];
        let err = reduce(&data, len + extra).unwrap_err();
        prop_assert_eq!(err.category(), "ConfigError");
    }
}
