//! Test discovery and `&&`-chain checking.
//!
//! Two parser specializations live here. [`ChainCheck`] accumulates a test
//! body's commands and splices a `?!AMP?!` annotation after any command whose
//! successor is not chained with `&&`, `||`, or `|`. [`TestScan`] watches a
//! whole script for `test_expect_success` / `test_expect_failure` commands at
//! any nesting depth, runs each body through a chain-checking parse, and
//! formats the annotated reports.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexer::Lexer;
use crate::parser::{Hooks, ShellParser};
use crate::token::{self, is_terminator, unquote, Token};

static TEST_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^test_expect_(?:success|failure)$").expect("constant regex pattern is valid")
});

// A command is chained when its predecessor ends with one of these; an
// existing ?!AMP?! counts so re-checking annotated output never double-flags.
static CHAINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:&&|\|\||\||\?!AMP\?!)$").expect("constant regex pattern is valid")
});

/// A needle for [`ends_with`]: a literal newline run or a token pattern.
enum Needle {
    Newlines,
    Pattern(&'static Regex),
}

/// Walk backward over `stream`, consuming needles in reverse: a `Newlines`
/// needle skips any run of `\n` tokens, a `Pattern` needle must match the
/// token it lands on.
fn ends_with(stream: &[Token], needles: &[Needle]) -> bool {
    let mut idx = stream.len();
    for needle in needles.iter().rev() {
        match needle {
            Needle::Newlines => {
                while idx > 0 && stream[idx - 1] == "\n" {
                    idx -= 1;
                }
            }
            Needle::Pattern(pattern) => {
                if idx == 0 || !pattern.is_match(&stream[idx - 1]) {
                    return false;
                }
                idx -= 1;
            }
        }
    }
    true
}

/// Hooks that flag commands whose predecessor fails to chain.
#[derive(Debug, Default)]
pub struct ChainCheck;

impl Hooks for ChainCheck {
    fn accumulate(&mut self, stream: &mut Vec<Token>, cmd: Vec<Token>) {
        let lone_newline = cmd.len() == 1 && cmd[0] == "\n";
        if !stream.is_empty()
            && !lone_newline
            && !ends_with(stream, &[Needle::Pattern(&*CHAINED), Needle::Newlines])
        {
            if let Some(last) = stream.iter().rposition(|t| t != "\n") {
                stream.insert(last + 1, token::AMP.to_string());
            }
        }
        stream.extend(cmd);
    }
}

/// Parse one test body with chain checking. Returns the annotated token
/// stream and any structural-error annotations the parse recorded.
pub fn check_body(body: &str) -> (Vec<Token>, Vec<String>) {
    let mut lexer = Lexer::new(body);
    let mut parser = ShellParser::new(ChainCheck);
    let tokens = parser.parse_all(&mut lexer);
    let errors = parser.take_output();
    (tokens, errors)
}

/// Hooks that recognize test definitions and check their bodies.
#[derive(Debug)]
pub struct TestScan {
    emit_all: bool,
    checked: usize,
}

impl TestScan {
    pub fn new(emit_all: bool) -> Self {
        Self {
            emit_all,
            checked: 0,
        }
    }

    /// Number of test definitions inspected so far.
    pub fn checked(&self) -> usize {
        self.checked
    }

    fn check_test(&mut self, title: &str, body: &str, output: &mut Vec<String>) {
        self.checked += 1;
        let title = unquote(title);
        let body = unquote(body);
        tracing::debug!(title = %title, "checking test body");

        let (tokens, errors) = check_body(&body);
        let flagged = tokens.iter().any(|t| token::ANNOTATION.is_match(t));
        if !self.emit_all && !flagged && errors.is_empty() {
            return;
        }

        let joined = tokens.join(" ");
        let joined = joined.strip_prefix('\n').unwrap_or(&joined);
        let body_text = joined
            .split('\n')
            .map(|line| {
                let line = line.strip_prefix(' ').unwrap_or(line);
                line.strip_suffix(' ').unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut report = format!("# chainlint: {title}\n{body_text}");
        if !report.ends_with('\n') {
            report.push('\n');
        }
        for error in errors {
            report.push_str(&error);
        }
        output.push(report);
    }
}

impl Hooks for TestScan {
    fn command_parsed(&mut self, cmd: &[Token], output: &mut Vec<String>) {
        if cmd.is_empty() || !TEST_COMMAND.is_match(&cmd[0]) {
            return;
        }
        // ignore trailing terminators when counting arguments
        let mut len = cmd.len();
        while len > 0 && is_terminator(&cmd[len - 1]) {
            len -= 1;
        }
        match len {
            // test_expect_X TITLE BODY
            3 => self.check_test(&cmd[1], &cmd[2], output),
            // test_expect_X PREREQ TITLE BODY
            n if n > 3 => self.check_test(&cmd[2], &cmd[3], output),
            _ => {}
        }
    }
}

/// Result of linting one script.
#[derive(Debug, Default)]
pub struct ScriptReport {
    /// One formatted report per problematic test (every test with emit-all),
    /// plus any script-level error annotations, in source order.
    pub reports: Vec<String>,
    /// Number of test definitions inspected.
    pub checked: usize,
}

impl ScriptReport {
    /// True when any report carries a `?!…?!` annotation.
    pub fn has_problems(&self) -> bool {
        self.reports.iter().any(|r| token::ANNOTATION.is_match(r))
    }
}

/// Lint the contents of one shell script: find every
/// `test_expect_{success,failure}` invocation, check each body for broken
/// `&&`-chains, and return the annotated reports.
pub fn check_script(source: &str, emit_all: bool) -> ScriptReport {
    let mut lexer = Lexer::new(source);
    let mut parser = ShellParser::new(TestScan::new(emit_all));
    parser.parse_all(&mut lexer);
    let checked = parser.hooks().checked();
    ScriptReport {
        reports: parser.take_output(),
        checked,
    }
}
