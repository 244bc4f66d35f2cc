//! Recursive-descent shell parser.
//!
//! [`ShellParser`] reads the lexer's token stream into flat per-command token
//! lists, recognizing compound commands (groups, subshells, `if`, `case`,
//! loops), function definitions, and Bash array assignment. It recovers from
//! structural errors by recording an in-band `?!ERR?!` annotation and pushing
//! the offending token back, so a malformed script still yields a usable
//! stream.
//!
//! Specialization happens through the [`Hooks`] trait: how parsed commands
//! are merged into the accumulated stream, and what post-processing runs on
//! each completed command. The checker layer builds its test-body and
//! whole-script parsers on those two seams.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexer::{Lexer, SubstitutionParser};
use crate::token::{is_terminator, Token, ERR};

static STOP_RPAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\)$").expect("constant regex pattern is valid"));
static STOP_RBRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\}$").expect("constant regex pattern is valid"));
static STOP_THEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^then$").expect("constant regex pattern is valid"));
static STOP_IF_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:elif|else|fi)$").expect("constant regex pattern is valid"));
static STOP_FI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fi$").expect("constant regex pattern is valid"));
static STOP_DO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^do$").expect("constant regex pattern is valid"));
static STOP_DONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^done$").expect("constant regex pattern is valid"));
static STOP_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^in$").expect("constant regex pattern is valid"));
static STOP_CASE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:;;|esac)$").expect("constant regex pattern is valid"));

/// Behavior seams that specialize the base parser.
pub trait Hooks {
    /// Merge a fully parsed command into the growing token stream.
    fn accumulate(&mut self, stream: &mut Vec<Token>, cmd: Vec<Token>) {
        stream.extend(cmd);
    }

    /// Observe each fully parsed command, at any nesting depth. May append
    /// formatted findings to `output`.
    fn command_parsed(&mut self, cmd: &[Token], output: &mut Vec<String>) {
        let _ = (cmd, output);
    }
}

/// Hook implementation with no specialization: plain shell parsing.
#[derive(Debug, Default)]
pub struct BaseHooks;

impl Hooks for BaseHooks {}

/// Recursive-descent parser over one lexer's token stream.
///
/// The lexer is not owned; parser methods take it by mutable reference so
/// that the lexer can call back into the parser for `$(...)` without either
/// side aliasing the other.
pub struct ShellParser<H: Hooks> {
    pushback: Vec<Token>,
    stops: Vec<Option<&'static Regex>>,
    output: Vec<String>,
    hooks: H,
}

impl<H: Hooks> SubstitutionParser for ShellParser<H> {
    fn parse_substitution(&mut self, lexer: &mut Lexer) -> String {
        let tokens = self.parse(lexer, Some(&*STOP_RPAREN));
        // closing ")"
        self.next_token(lexer);
        tokens.join(" ")
    }
}

impl<H: Hooks> ShellParser<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            pushback: Vec::new(),
            stops: Vec::new(),
            output: Vec::new(),
            hooks,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Error annotations and hook findings recorded so far, in the order
    /// they were produced.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Current depth of the stop-pattern stack. Zero between top-level
    /// parses.
    pub fn stop_depth(&self) -> usize {
        self.stops.len()
    }

    /// Next token from pushback or the lexer, or `None` at end of input.
    pub fn next_token(&mut self, lexer: &mut Lexer) -> Option<Token> {
        if let Some(token) = self.pushback.pop() {
            return Some(token);
        }
        lexer.scan_token(self)
    }

    /// Return a token to the front of the stream.
    pub fn untoken(&mut self, token: Token) {
        self.pushback.push(token);
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self, lexer: &mut Lexer) -> Option<Token> {
        if self.pushback.is_empty() {
            let token = lexer.scan_token(self)?;
            self.pushback.push(token);
        }
        self.pushback.last().cloned()
    }

    fn stop_at(&mut self, lexer: &mut Lexer) -> bool {
        let Some(token) = self.peek(lexer) else {
            return true;
        };
        matches!(self.stops.last(), Some(Some(stop)) if stop.is_match(&token))
    }

    /// Parse the whole input.
    pub fn parse_all(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        self.parse(lexer, None)
    }

    /// Parse commands until `peek()` matches `stop` (or input ends). The
    /// stop token itself is left unconsumed for the caller.
    pub fn parse(&mut self, lexer: &mut Lexer, stop: Option<&'static Regex>) -> Vec<Token> {
        self.stops.push(stop);
        let mut stream = Vec::new();
        loop {
            if self.stop_at(lexer) {
                break;
            }
            let cmd = self.parse_cmd(lexer);
            if cmd.is_empty() {
                break;
            }
            self.hooks.accumulate(&mut stream, cmd);
        }
        self.stops.pop();
        stream
    }

    /// Parse exactly one command, terminator included.
    pub fn parse_cmd(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let tokens = self.parse_cmd_inner(lexer);
        if !tokens.is_empty() {
            self.hooks.command_parsed(&tokens, &mut self.output);
        }
        tokens
    }

    fn parse_cmd_inner(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let Some(first) = self.next_token(lexer) else {
            return Vec::new();
        };
        if first == "\n" {
            return vec![first];
        }

        let mut tokens = Vec::new();
        match first.as_str() {
            "!" => {
                tokens.push(first);
                let negated = self.parse_cmd(lexer);
                tokens.extend(negated);
                // the negated command consumed its own terminator
                return tokens;
            }
            "{" => {
                tokens.push(first);
                tokens.extend(self.parse(lexer, Some(&*STOP_RBRACE)));
                tokens.extend(self.expect(lexer, "}"));
            }
            "(" => {
                tokens.push(first);
                tokens.extend(self.parse(lexer, Some(&*STOP_RPAREN)));
                tokens.extend(self.expect(lexer, ")"));
            }
            "case" => {
                tokens.push(first);
                tokens.extend(self.parse_case(lexer));
            }
            "if" => {
                tokens.push(first);
                tokens.extend(self.parse_if(lexer));
            }
            "for" | "until" | "while" => {
                tokens.push(first);
                tokens.extend(self.parse_loop(lexer));
            }
            _ => match self.next_token(lexer) {
                Some(token) if token == "(" && !first.ends_with('=') => {
                    // function definition: NAME ( ) [newlines] body
                    tokens.push(first);
                    tokens.push(token);
                    tokens.extend(self.expect(lexer, ")"));
                    tokens.extend(self.swallow_newlines(lexer));
                    tokens.extend(self.parse_cmd(lexer));
                    // the body consumed its own terminator
                    return tokens;
                }
                Some(token) if token == "(" => {
                    // Bash array assignment folds into the first token:
                    // name=(a b c)
                    let mut text = first;
                    text.push('(');
                    let mut sep = false;
                    while let Some(word) = self.next_token(lexer) {
                        if word == ")" {
                            text.push(')');
                            break;
                        }
                        if sep {
                            text.push(' ');
                        }
                        text.push_str(&word);
                        sep = true;
                    }
                    tokens.push(text);
                }
                Some(token) => {
                    tokens.push(first);
                    self.untoken(token);
                }
                None => {
                    tokens.push(first);
                    return tokens;
                }
            },
        }

        // remainder of the command, up to and including its terminator
        while let Some(token) = self.next_token(lexer) {
            if let Some(Some(stop)) = self.stops.last() {
                if stop.is_match(&token) {
                    self.untoken(token);
                    break;
                }
            }
            let done = is_terminator(&token);
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn parse_if(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            tokens.extend(self.parse(lexer, Some(&*STOP_THEN)));
            tokens.extend(self.expect(lexer, "then"));
            tokens.extend(self.parse(lexer, Some(&*STOP_IF_BODY)));
            match self.next_token(lexer) {
                Some(token) if token == "elif" => tokens.push(token),
                Some(token) if token == "else" => {
                    tokens.push(token);
                    tokens.extend(self.parse(lexer, Some(&*STOP_FI)));
                    tokens.extend(self.expect(lexer, "fi"));
                    break;
                }
                Some(token) if token == "fi" => {
                    tokens.push(token);
                    break;
                }
                Some(token) => {
                    self.error_expected("fi", &token);
                    self.untoken(token);
                    break;
                }
                None => {
                    self.error_expected("fi", "<end-of-input>");
                    break;
                }
            }
        }
        tokens
    }

    fn parse_loop(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let mut tokens = Vec::new();
        tokens.extend(self.parse(lexer, Some(&*STOP_DO)));
        tokens.extend(self.expect(lexer, "do"));
        tokens.extend(self.parse(lexer, Some(&*STOP_DONE)));
        tokens.extend(self.expect(lexer, "done"));
        tokens
    }

    fn parse_case(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let mut tokens = Vec::new();
        tokens.extend(self.parse(lexer, Some(&*STOP_IN)));
        tokens.extend(self.expect(lexer, "in"));
        tokens.extend(self.swallow_newlines(lexer));
        loop {
            match self.peek(lexer) {
                None => break,
                Some(token) if token == "esac" => break,
                Some(_) => {}
            }
            // pattern, through its closing ")"
            while let Some(token) = self.next_token(lexer) {
                let close = token == ")";
                tokens.push(token);
                if close {
                    break;
                }
            }
            tokens.extend(self.swallow_newlines(lexer));
            tokens.extend(self.parse(lexer, Some(&*STOP_CASE_ITEM)));
            match self.peek(lexer) {
                None => break,
                Some(token) if token == "esac" => break,
                Some(_) => {
                    tokens.extend(self.expect(lexer, ";;"));
                    tokens.extend(self.swallow_newlines(lexer));
                }
            }
        }
        tokens.extend(self.expect(lexer, "esac"));
        tokens
    }

    fn swallow_newlines(&mut self, lexer: &mut Lexer) -> Vec<Token> {
        let mut newlines = Vec::new();
        while let Some(token) = self.peek(lexer) {
            if token != "\n" {
                break;
            }
            if let Some(newline) = self.next_token(lexer) {
                newlines.push(newline);
            }
        }
        newlines
    }

    /// Consume `want`, or record an error annotation and push the offending
    /// token back so parsing can continue.
    fn expect(&mut self, lexer: &mut Lexer, want: &str) -> Option<Token> {
        match self.next_token(lexer) {
            Some(token) if token == want => Some(token),
            Some(token) => {
                self.error_expected(want, &token);
                self.untoken(token);
                None
            }
            None => {
                self.error_expected(want, "<end-of-input>");
                None
            }
        }
    }

    fn error_expected(&mut self, want: &str, found: &str) {
        self.output
            .push(format!("{ERR} expected '{want}' but found '{found}'\n"));
    }
}
