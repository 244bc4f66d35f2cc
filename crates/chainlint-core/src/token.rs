//! Token model and token-level helpers.
//!
//! Tokens are plain strings: the token's text *is* its identity. The lexer
//! reconstructs source text rather than interpreting it; comparisons and
//! classifications happen on the text itself.

use std::sync::LazyLock;

use regex::Regex;

/// A single lexed token. Quoted regions, expansions, and here-doc
/// introducers all collapse into one token apiece.
pub type Token = String;

/// Annotation spliced in after a command whose successor is not chained
/// with `&&`, `||`, or `|`.
pub const AMP: &str = "?!AMP?!";

/// Prefix for structural parse-error annotations.
pub const ERR: &str = "?!ERR?!";

/// Matches any `?!TAG?!` annotation embedded in a token or a report.
pub static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?![^?]+\?!").expect("constant regex pattern is valid"));

/// True for the tokens that terminate a simple command: `;`, `&`, newline,
/// `|`, `&&`, and `||`.
pub fn is_terminator(token: &str) -> bool {
    matches!(token, ";" | "&" | "\n" | "|" | "&&" | "||")
}

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Reduce a token's surface syntax to its shell-visible content.
///
/// `'x'` becomes `x`, `"x"` becomes `x`, and composite tokens like
/// `word"a b"42'c d'` become `worda b42c d`. Inside either quote style the
/// alternate quote character is literal. Backslash outside single quotes
/// escapes the following character; a backslash-newline keeps the backslash
/// as a line-splice marker and drops the newline. Single quotes process
/// nothing.
pub fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    let mut quote = Quote::None;
    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    out.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some('\n') => out.push('\\'),
                    Some(escaped) => out.push(escaped),
                    None => out.push('\\'),
                },
                _ => out.push(c),
            },
            Quote::None => match c {
                '\'' => quote = Quote::Single,
                '"' => quote = Quote::Double,
                '\\' => match chars.next() {
                    Some('\n') => out.push('\\'),
                    Some(escaped) => out.push(escaped),
                    None => out.push('\\'),
                },
                _ => out.push(c),
            },
        }
    }
    out
}
