//! Worker pool.
//!
//! A fixed set of worker tasks pulls script paths from a shared queue, lints
//! each file, and hands the finished report block to a monitor task that owns
//! stdout. Blocks are printed whole, so a file's reports never interleave
//! with another file's; ordering across files is whatever the pool produces.
//! Each worker keeps its own counters for the stats table.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpu_time::ProcessTime;
use tokio::sync::{mpsc, Mutex};

use chainlint_core::token::ANNOTATION;

/// Per-worker counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerStats {
    pub files: usize,
    pub tests: usize,
    pub reports: usize,
}

/// What a full pool run produced.
#[derive(Debug)]
pub struct PoolOutcome {
    /// True when any emitted block carried a `?!…?!` annotation.
    pub problems_found: bool,
    pub workers: Vec<WorkerStats>,
    pub wall: Duration,
    /// CPU time charged to the process, where the platform reports it.
    pub user: Option<Duration>,
}

impl PoolOutcome {
    /// Format the `--stats` table.
    pub fn stats_table(&self) -> String {
        let mut out = String::new();
        let mut totals = WorkerStats::default();
        for (i, w) in self.workers.iter().enumerate() {
            totals.files += w.files;
            totals.tests += w.tests;
            totals.reports += w.reports;
            let _ = writeln!(
                out,
                "worker {i}: {} files, {} tests, {} reports",
                w.files, w.tests, w.reports
            );
        }
        let _ = writeln!(
            out,
            "total: {} files, {} tests, {} reports",
            totals.files, totals.tests, totals.reports
        );
        let _ = write!(out, "elapsed: {:.2}s wall", self.wall.as_secs_f64());
        if let Some(user) = self.user {
            let _ = write!(out, ", {:.2}s user", user.as_secs_f64());
        }
        out.push('\n');
        out
    }
}

/// Lint one script's contents into a printable report block, or `None` when
/// the file is clean.
pub fn lint_source(path: &Path, source: &str, emit_all: bool) -> (Option<String>, usize) {
    let report = chainlint_core::check_script(source, emit_all);
    if report.reports.is_empty() {
        return (None, report.checked);
    }
    let mut block = format!("# chainlint: {}\n", path.display());
    for r in &report.reports {
        block.push_str(r);
    }
    (Some(block), report.checked)
}

/// Report block for a script that could not be read.
pub fn read_error(path: &Path, error: &std::io::Error) -> String {
    format!("?!ERR?! {}: {}\n", path.display(), error)
}

/// Run `jobs` workers over `paths`, printing report blocks to stdout.
pub fn run_pool(paths: Vec<PathBuf>, jobs: usize, emit_all: bool) -> Result<PoolOutcome> {
    let started = Instant::now();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(jobs.max(1))
        .build()
        .context("failed to build worker runtime")?;

    let (problems_found, workers) = runtime.block_on(async move {
        let queue = Arc::new(Mutex::new(VecDeque::from(paths)));
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // The monitor owns stdout; one recv per finished file keeps blocks
        // atomic.
        let monitor = tokio::spawn(async move {
            let mut problems = false;
            while let Some(block) = rx.recv().await {
                if ANNOTATION.is_match(&block) {
                    problems = true;
                }
                print!("{block}");
            }
            problems
        });

        let mut handles = Vec::with_capacity(jobs);
        for _ in 0..jobs {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let mut stats = WorkerStats::default();
                loop {
                    let Some(path) = queue.lock().await.pop_front() else {
                        break;
                    };
                    stats.files += 1;
                    let block = match tokio::fs::read_to_string(&path).await {
                        Ok(source) => {
                            let (block, checked) = lint_source(&path, &source, emit_all);
                            stats.tests += checked;
                            block
                        }
                        Err(e) => Some(read_error(&path, &e)),
                    };
                    if let Some(block) = block {
                        stats.reports += 1;
                        if tx.send(block).is_err() {
                            break;
                        }
                    }
                }
                stats
            }));
        }
        drop(tx);

        let mut workers = Vec::with_capacity(handles.len());
        for handle in handles {
            workers.push(handle.await.context("worker task panicked")?);
        }
        let problems = monitor.await.context("monitor task panicked")?;
        Ok::<_, anyhow::Error>((problems, workers))
    })?;

    Ok(PoolOutcome {
        problems_found,
        workers,
        wall: started.elapsed(),
        user: user_time(),
    })
}

/// CPU time charged to this process so far.
fn user_time() -> Option<Duration> {
    ProcessTime::try_now().ok().map(|t| t.as_duration())
}
