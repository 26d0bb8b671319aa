//! Regular expressions to NFAs via Thompson's construction.

mod fragment;
mod parser;

use crate::automaton::{Nfa, Symbol};
use log::debug;
use parser::Parser;
use std::fmt;

/// Symbols matched by `.` unless configured otherwise.
pub const DEFAULT_WILDCARD_ALPHABET: &[Symbol] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexErrorKind {
    UnexpectedEnd,
    MissingCloseParen,
    UnmatchedCloseParen,
    ExpectedNumber,
    InvalidNumber,
    MissingCloseBrace,
    NothingToRepeat,
    DanglingEscape,
}

impl fmt::Display for RegexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RegexErrorKind::UnexpectedEnd => "unexpected end of expression",
            RegexErrorKind::MissingCloseParen => "missing closing parenthesis",
            RegexErrorKind::UnmatchedCloseParen => "unmatched closing parenthesis",
            RegexErrorKind::ExpectedNumber => "expected number in quantifier",
            RegexErrorKind::InvalidNumber => "invalid number in quantifier",
            RegexErrorKind::MissingCloseBrace => "missing closing brace",
            RegexErrorKind::NothingToRepeat => "quantifier has nothing to repeat",
            RegexErrorKind::DanglingEscape => "pattern ends with an escape",
        };
        f.write_str(message)
    }
}

/// A pattern that could not be compiled. `offset` is a byte offset into the
/// pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexError {
    pub kind: RegexErrorKind,
    pub offset: usize,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for RegexError {}

/// Largest count accepted by `{n}` and `^n` unless configured otherwise.
pub const MAX_REPETITION: usize = 1000;

/// Compiles patterns into NFAs.
#[derive(Debug, Clone)]
pub struct RegexCompiler {
    wildcard_alphabet: Vec<Symbol>,
    state_prefix: String,
    max_repetition: usize,
}

impl Default for RegexCompiler {
    fn default() -> Self {
        Self {
            wildcard_alphabet: DEFAULT_WILDCARD_ALPHABET.to_vec(),
            state_prefix: "q".to_string(),
            max_repetition: MAX_REPETITION,
        }
    }
}

impl RegexCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols matched by `.`.
    pub fn with_wildcard_alphabet(mut self, alphabet: impl Into<Vec<Symbol>>) -> Self {
        self.wildcard_alphabet = alphabet.into();
        self
    }

    /// Prefix of generated state names (`q0`, `q1`, ...).
    pub fn with_state_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_prefix = prefix.into();
        self
    }

    /// Larger `{n}` or `^n` counts fail with [`RegexErrorKind::InvalidNumber`].
    pub fn with_max_repetition(mut self, max: usize) -> Self {
        self.max_repetition = max;
        self
    }

    pub fn wildcard_alphabet(&self) -> &[Symbol] {
        &self.wildcard_alphabet
    }

    /// Compile `pattern`. On error no automaton is produced.
    pub fn compile(&self, pattern: &str) -> Result<Nfa, RegexError> {
        let fragment = Parser::new(pattern, &self.wildcard_alphabet, self.max_repetition).parse()?;
        debug!("compiled {pattern:?} into {} states", fragment.num_states());
        Ok(fragment.into_nfa(&self.state_prefix))
    }
}

/// Compile `pattern` with the default wildcard alphabet.
pub fn create_nfa_from_regex(pattern: &str) -> Result<Nfa, RegexError> {
    RegexCompiler::new().compile(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternation_and_quantifiers() {
        let nfa = create_nfa_from_regex("(a|b)(c|d)e+g?").unwrap();
        for word in ["ace", "bdeeg", "ade", "bceeeeg"] {
            assert!(nfa.accept(word), "{word} should be accepted");
        }
        for word in ["ab", "aceg g", "", "ac", "aceggg", "abe"] {
            assert!(!nfa.accept(word), "{word} should be rejected");
        }
    }

    #[test]
    fn test_exact_repetition() {
        let nfa = create_nfa_from_regex("1(0|1)*2(3|4){5}36").unwrap();
        assert!(nfa.accept("123333336"));
        assert!(nfa.accept("101023434436"));
        assert!(!nfa.accept("12333336"));
        assert!(!nfa.accept("1233333336"));

        let power = create_nfa_from_regex("(ab)^3").unwrap();
        assert!(power.accept("ababab"));
        assert!(!power.accept("abab"));
    }

    #[test]
    fn test_wildcard() {
        let nfa = create_nfa_from_regex("a.c").unwrap();
        assert!(nfa.accept("abc"));
        assert!(nfa.accept("aZc"));
        assert!(nfa.accept("a7c"));
        assert!(!nfa.accept("a-c"));
        assert_eq!(nfa.alphabet().len(), DEFAULT_WILDCARD_ALPHABET.len());

        let narrow = RegexCompiler::new()
            .with_wildcard_alphabet(b"xy".to_vec())
            .compile("a.c")
            .unwrap();
        assert!(narrow.accept("axc"));
        assert!(!narrow.accept("abc"));
    }

    #[test]
    fn test_escape_and_empty_alternative() {
        let nfa = create_nfa_from_regex("a\\*(b|)").unwrap();
        assert!(nfa.accept("a*"));
        assert!(nfa.accept("a*b"));
        assert!(!nfa.accept("a"));
    }

    #[test]
    fn test_state_names() {
        let nfa = RegexCompiler::new().with_state_prefix("s").compile("ab").unwrap();
        assert_eq!(nfa.num_states(), 4);
        assert!(nfa.states().all(|name| name.starts_with('s')));
        assert_eq!(nfa.start_states().collect::<Vec<_>>(), vec!["s0"]);
        assert_eq!(nfa.final_states().collect::<Vec<_>>(), vec!["s3"]);
    }

    #[test]
    fn test_errors_are_reported() {
        let err = create_nfa_from_regex("(a|b").unwrap_err();
        assert_eq!(err.kind, RegexErrorKind::MissingCloseParen);
        assert_eq!(err.to_string(), "missing closing parenthesis at offset 0");

        let err = create_nfa_from_regex("a{2").unwrap_err();
        assert_eq!(err.kind, RegexErrorKind::MissingCloseBrace);

        let err = create_nfa_from_regex("a^").unwrap_err();
        assert_eq!(err.to_string(), "unexpected end of expression at offset 2");
    }

    #[test]
    fn test_repetition_limit() {
        let err = create_nfa_from_regex("(ab|c){3000000}").unwrap_err();
        assert_eq!(err, RegexError { kind: RegexErrorKind::InvalidNumber, offset: 7 });
        assert!(create_nfa_from_regex("a{1000}").is_ok());

        let strict = RegexCompiler::new().with_max_repetition(2);
        assert!(strict.compile("a{2}").unwrap().accept("aa"));
        assert_eq!(strict.compile("a^3").unwrap_err().kind, RegexErrorKind::InvalidNumber);
    }
}
