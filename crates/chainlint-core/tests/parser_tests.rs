//! Parser tests: compound commands, error recovery, stop discipline.

use chainlint_core::{BaseHooks, Lexer, ShellParser};
use rstest::rstest;

/// Parse the whole input with no specialization and return the flat stream.
fn parse(input: &str) -> Vec<String> {
    let mut lexer = Lexer::new(input);
    let mut parser = ShellParser::new(BaseHooks);
    let stream = parser.parse_all(&mut lexer);
    assert_eq!(parser.stop_depth(), 0, "stop stack must unwind");
    stream
}

/// Parse and return (stream, recorded error annotations).
fn parse_with_errors(input: &str) -> (Vec<String>, Vec<String>) {
    let mut lexer = Lexer::new(input);
    let mut parser = ShellParser::new(BaseHooks);
    let stream = parser.parse_all(&mut lexer);
    let errors = parser.take_output();
    (stream, errors)
}

fn assert_stream(input: &str, expected: &[&str]) {
    let actual = parse(input);
    let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(actual, expected, "input: {input:?}");
}

// =============================================================================
// Simple commands
// =============================================================================

#[rstest]
#[case::bare("foo bar\n", &["foo", "bar", "\n"])]
#[case::two_commands("foo\nbar\n", &["foo", "\n", "bar", "\n"])]
#[case::semicolons("foo; bar;\n", &["foo", ";", "bar", ";", "\n"])]
#[case::chained("foo && bar || baz\n", &["foo", "&&", "bar", "||", "baz", "\n"])]
#[case::background("sleep 1 &\n", &["sleep", "1", "&", "\n"])]
#[case::negated("! foo && bar\n", &["!", "foo", "&&", "bar", "\n"])]
fn parser_simple(#[case] input: &str, #[case] expected: &[&str]) {
    assert_stream(input, expected);
}

// =============================================================================
// Compound commands
// =============================================================================

#[rstest]
#[case::subshell(
    "(foo; bar) && baz\n",
    &["(", "foo", ";", "bar", ")", "&&", "baz", "\n"]
)]
#[case::group(
    "{ foo; bar; }\n",
    &["{", "foo", ";", "bar", ";", "}", "\n"]
)]
#[case::if_fi(
    "if foo\nthen bar\nfi\n",
    &["if", "foo", "\n", "then", "bar", "\n", "fi", "\n"]
)]
#[case::if_else(
    "if a; then b; else c; fi\n",
    &["if", "a", ";", "then", "b", ";", "else", "c", ";", "fi", "\n"]
)]
#[case::if_elif(
    "if a; then b; elif c; then d; fi\n",
    &["if", "a", ";", "then", "b", ";", "elif", "c", ";", "then", "d", ";", "fi", "\n"]
)]
#[case::while_loop(
    "while foo\ndo bar\ndone\n",
    &["while", "foo", "\n", "do", "bar", "\n", "done", "\n"]
)]
#[case::until_loop(
    "until foo; do bar; done\n",
    &["until", "foo", ";", "do", "bar", ";", "done", "\n"]
)]
#[case::for_loop(
    "for i in a b c\ndo\nbar\ndone\n",
    &["for", "i", "in", "a", "b", "c", "\n", "do", "\n", "bar", "\n", "done", "\n"]
)]
#[case::subshell_redirect(
    "(foo) >out\n",
    &["(", "foo", ")", ">", "out", "\n"]
)]
fn parser_compound(#[case] input: &str, #[case] expected: &[&str]) {
    assert_stream(input, expected);
}

#[test]
fn parser_case_items() {
    assert_stream(
        "case $x in\na) foo ;;\n*) bar ;;\nesac\n",
        &[
            "case", "$x", "in", "\n", "a", ")", "foo", ";;", "\n", "*", ")", "bar", ";;", "\n",
            "esac", "\n",
        ],
    );
}

#[test]
fn parser_case_last_item_without_dsemi() {
    assert_stream(
        "case $x in\na) foo\nesac\n",
        &["case", "$x", "in", "\n", "a", ")", "foo", "\n", "esac", "\n"],
    );
}

#[test]
fn parser_nested_compounds() {
    assert_stream(
        "if a; then (b; c); fi\n",
        &["if", "a", ";", "then", "(", "b", ";", "c", ")", ";", "fi", "\n"],
    );
}

// =============================================================================
// Functions and array assignment
// =============================================================================

#[test]
fn parser_function_definition() {
    assert_stream(
        "f() {\nfoo\n}\n",
        &["f", "(", ")", "{", "\n", "foo", "\n", "}", "\n"],
    );
}

#[test]
fn parser_function_body_on_next_line() {
    assert_stream(
        "f()\n{\nfoo\n}\n",
        &["f", "(", ")", "\n", "{", "\n", "foo", "\n", "}", "\n"],
    );
}

#[test]
fn parser_array_assignment_folds_into_one_token() {
    assert_stream("arr=(a b c)\n", &["arr=(a b c)", "\n"]);
}

#[test]
fn parser_empty_array_assignment() {
    assert_stream("arr=()\n", &["arr=()", "\n"]);
}

// =============================================================================
// Error recovery
// =============================================================================

#[rstest]
#[case::unclosed_subshell("(foo\n", "expected ')' but found '<end-of-input>'")]
#[case::unclosed_group("{ foo\n", "expected '}' but found '<end-of-input>'")]
#[case::missing_fi("if a; then b\n", "expected 'fi' but found '<end-of-input>'")]
#[case::missing_done("while a; do b\n", "expected 'done' but found '<end-of-input>'")]
#[case::missing_esac("case x in\na) foo\n", "expected 'esac' but found '<end-of-input>'")]
fn parser_reports_missing_closers(#[case] input: &str, #[case] message: &str) {
    let (_, errors) = parse_with_errors(input);
    assert!(
        errors.iter().any(|e| e.contains(message)),
        "expected {message:?} among {errors:?}"
    );
    assert!(errors.iter().all(|e| e.starts_with("?!ERR?!")));
}

#[test]
fn parser_recovers_after_error() {
    // the bad token is pushed back and parsing continues past it
    let (stream, errors) = parse_with_errors("if a; then b; }\nfoo\n");
    assert!(!errors.is_empty());
    assert!(stream.contains(&"foo".to_string()));
}

#[test]
fn parser_clean_input_has_no_errors() {
    let (_, errors) = parse_with_errors("if a; then b; fi\nfoo\n");
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}
