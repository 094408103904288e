//! Body of the `threaded-sum` binary, with arguments and output streams
//! passed in.

use std::{ffi::OsString, io::Write};

use anyhow::Context;
use tracing::info;

use crate::{
    config::{Config, Invocation},
    loader,
    reducer::Reducer,
    timer::duration_to_ms,
};

/// Exit status for any failure.
pub const FAILURE_STATUS: u8 = 255;

/// Runs the command line and returns the process exit status.
///
/// Results go to `out`. A failure writes exactly one `Error: ...` line to
/// `err`. `init_logging` is called once the arguments are parsed, before any
/// work starts.
pub fn run<I, T>(
    args: I,
    out: &mut impl Write,
    err: &mut impl Write,
    init_logging: impl FnOnce(&Config),
) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match execute(args, out, init_logging) {
        Ok(()) => 0,
        Err(error) => {
            // Nothing useful is left to do if stderr is gone.
            let _ = writeln!(err, "Error: {error}");
            FAILURE_STATUS
        }
    }
}

fn execute<I, T>(args: I, out: &mut impl Write, init_logging: impl FnOnce(&Config)) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match Config::parse_from_iter(args)? {
        Invocation::Run(config) => config,
        Invocation::Info(output) => {
            write!(out, "{output}").context("writing usage")?;
            return Ok(());
        }
    };
    init_logging(&config);

    let data = loader::load_values(&config.filename)?;
    info!(values = data.len(), threads = config.thread_count, "input loaded");

    let report = Reducer::new(config.thread_count).reduce_timed(&data)?;

    writeln!(out, "Total sum: {}", report.total).context("writing result")?;
    writeln!(out, "Total execution time: {:.2} ms", duration_to_ms(report.elapsed))
        .context("writing result")?;

    if config.per_worker {
        #[cfg(feature = "profiler")]
        report.stats.plot();

        #[cfg(not(feature = "profiler"))]
        writeln!(out, "Per-worker timings need the 'profiler' feature; rebuild with --features profiler")
            .context("writing result")?;
    }

    Ok(())
}
