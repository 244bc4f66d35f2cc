//! chainlint driver.
//!
//! Expands command-line patterns into script paths, fans the per-file work
//! out to the pool, and turns the outcome into a process exit code. The
//! linting itself lives in `chainlint-core`; this crate only moves files
//! through it.

pub mod pool;

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::Result;

/// Command-line options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Report every test, even ones with no findings.
    pub emit_all: bool,
    /// Requested worker count; anything below 1 auto-detects.
    pub jobs: i64,
    /// Print per-worker and total counts to stderr when done.
    pub stats: bool,
}

/// Resolve the requested worker count: values below 1 auto-detect the CPU
/// count, and there is never a reason to run more workers than files.
pub fn resolve_jobs(requested: i64, files: usize) -> usize {
    let jobs = if requested < 1 {
        thread::available_parallelism().map_or(1, |n| n.get())
    } else {
        requested as usize
    };
    jobs.clamp(1, files.max(1))
}

/// Expand every pattern and lint the resulting scripts.
pub fn run(options: &Options, patterns: &[String]) -> Result<ExitCode> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        match chainlint_glob::expand(pattern) {
            Ok(found) => {
                if found.is_empty() {
                    tracing::debug!(%pattern, "pattern matched nothing");
                }
                paths.extend(found);
            }
            Err(e) => eprintln!("chainlint: {pattern}: {e}"),
        }
    }
    if paths.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let jobs = resolve_jobs(options.jobs, paths.len());
    tracing::debug!(files = paths.len(), jobs, "starting lint run");

    let outcome = pool::run_pool(paths, jobs, options.emit_all)?;
    if options.stats {
        eprint!("{}", outcome.stats_table());
    }
    Ok(if outcome.problems_found {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
