//! chainlint-glob: BSD-style glob matching and pathname expansion.
//!
//! Provides:
//! - **Pattern**: a compiled single-component glob (`*`, `?`, `[...]` with
//!   ranges and `!`/`^` negation, backslash escapes)
//! - **expand**: pathname expansion of a whole pattern against the
//!   filesystem, one component at a time
//!
//! Matching follows `glob(3)` conventions rather than Bash extensions: no
//! brace expansion, no globstar, and names starting with `.` only match
//! patterns that name the dot explicitly.

mod expand;
mod matcher;

pub use expand::expand;
pub use matcher::{has_magic, Pattern};

use thiserror::Error;

/// Errors raised while compiling a pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unclosed character class in pattern '{0}'")]
    UnclosedClass(String),
    #[error("trailing backslash in pattern '{0}'")]
    TrailingEscape(String),
}
