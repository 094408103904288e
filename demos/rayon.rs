use rayon::prelude::*;
use std::time::Instant;
use threaded_sum::{Reducer, loader};

fn main() {
    println!("Threaded Sum vs Rayon");
    println!("=====================\n");

    // Configuration
    const NUM_VALUES: usize = 5_000_000;
    const NUM_THREADS: usize = 4;

    // Write a demo input file in the on-disk format, then load it back
    let dir = tempfile::tempdir().expect("create demo directory");
    let path = dir.path().join("values.bin");

    let values: Vec<i32> = (0..NUM_VALUES as i32)
        .map(|i| if i % 3 == 0 { -i } else { i })
        .collect();
    loader::write_values(&path, &values).expect("write demo input");
    let data = loader::load_values(&path).expect("load demo input");

    println!("Configuration:");
    println!("  Input: {}", path.display());
    println!("  Values: {}", data.len());
    println!("  Threads: {}\n", NUM_THREADS);

    // Reducer: one scoped thread per partition, one mutex fold per thread
    let report = Reducer::new(NUM_THREADS)
        .reduce_timed(&data)
        .expect("reduction failed");
    println!("Reducer total: {} in {:?}", report.total, report.elapsed);

    for worker in 0..report.stats.num_workers() {
        if let Some(time) = report.stats.worker_computation_time(worker) {
            println!(
                "  Worker {}: {} values in {:?}",
                worker, report.stats.elements_per_worker[worker], time
            );
        }
    }

    // Rayon: work-stealing reduction on a pool of the same size
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(NUM_THREADS)
        .build()
        .expect("build rayon pool");
    let start = Instant::now();
    let rayon_total: i64 = pool.install(|| data.par_iter().map(|&v| v as i64).sum());
    println!("\nRayon total:   {} in {:?}", rayon_total, start.elapsed());

    assert_eq!(report.total, rayon_total);

    #[cfg(feature = "profiler")]
    report.stats.plot();

    #[cfg(not(feature = "profiler"))]
    {
        println!("\nTip: Enable the 'profiler' feature for the per-worker timing table!");
    }

    println!("\nBoth reductions agree.");
}
