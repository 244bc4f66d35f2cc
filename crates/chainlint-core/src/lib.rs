//! chainlint-core: find broken `&&`-chains in shell test scripts.
//!
//! This crate provides:
//!
//! - **Lexer**: character-cursor tokenizer for POSIX shell with quoted
//!   strings, `$(...)` recursion, and deferred here-doc consumption
//! - **ShellParser**: recursive-descent parser producing flat per-command
//!   token streams, with in-band `?!ERR?!` recovery
//! - **Checker**: the `ChainCheck`/`TestScan` parser specializations that
//!   discover `test_expect_{success,failure}` definitions and annotate
//!   unchained commands with `?!AMP?!`
//!
//! The single top-level operation is [`check_script`]: given the textual
//! contents of a shell script, produce the list of annotated test reports.
//! It is strictly synchronous and does no I/O; everything that can go wrong
//! surfaces as an in-band annotation rather than an error value.

pub mod checker;
pub mod lexer;
pub mod parser;
pub mod token;

pub use checker::{check_body, check_script, ChainCheck, ScriptReport, TestScan};
pub use lexer::{Lexer, SubstitutionParser};
pub use parser::{BaseHooks, Hooks, ShellParser};
pub use token::{unquote, Token};
