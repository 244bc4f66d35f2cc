//! chainlint CLI entry point.
//!
//! Usage:
//!   chainlint [OPTIONS] <pattern>...   # lint scripts named by paths/globs

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chainlint_cli::{run, Options};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var); diagnostics go to
    // stderr so report output stays clean.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match parse_args() {
        Ok(Parsed::Exit(code)) => code,
        Ok(Parsed::Run(options, patterns)) => match run(&options, &patterns) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("chainlint: {e:?}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("chainlint: {e}");
            eprintln!("Run 'chainlint --help' for usage.");
            ExitCode::FAILURE
        }
    }
}

enum Parsed {
    Run(Options, Vec<String>),
    Exit(ExitCode),
}

fn parse_args() -> Result<Parsed> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut options = Options::default();
    let mut patterns = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "--version" | "-V" => {
                println!("chainlint {}", env!("CARGO_PKG_VERSION"));
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "--emit-all" => options.emit_all = true,
            "--stats" | "--show-stats" => options.stats = true,
            "--jobs" | "-j" => {
                let count = iter.next().context("--jobs requires a worker count")?;
                options.jobs = count
                    .parse()
                    .with_context(|| format!("invalid worker count '{count}'"))?;
            }
            _ => {
                if let Some(count) = arg.strip_prefix("--jobs=") {
                    options.jobs = count
                        .parse()
                        .with_context(|| format!("invalid worker count '{count}'"))?;
                } else if arg.starts_with('-') && arg != "-" {
                    anyhow::bail!("unknown option: {arg}");
                } else {
                    patterns.push(arg);
                }
            }
        }
    }

    Ok(Parsed::Run(options, patterns))
}

fn print_help() {
    println!(
        r#"chainlint v{} — lint shell test scripts for broken &&-chains

Usage:
  chainlint [OPTIONS] <pattern>...

Arguments:
  <pattern>...        Script paths or glob patterns (*, ?, [...])

Options:
  --emit-all          Report every test, even ones with no problems
  -j, --jobs <N>      Worker count; N < 1 auto-detects the CPU count
  --stats             Print per-worker and total counts to stderr
  -h, --help          Show this help
  -V, --version       Show version

Output lines carry ?!AMP?! where a command is missing its trailing `&&`
(or `||` / `|`) and ?!ERR?! for structural problems. The exit status is
non-zero when any annotation fired.

Examples:
  chainlint t/t[0-9]*.sh       # lint a test suite
  chainlint --emit-all one.sh  # show every parsed test body
  chainlint -j 1 --stats t/*.sh
"#,
        env!("CARGO_PKG_VERSION")
    );
}
