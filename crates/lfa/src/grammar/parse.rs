//! Textual grammar form.
//!
//! ```text
//! # comment
//! S -> aB | b
//! B → <tail> | ε
//! <tail> -> \| S
//! ```
//!
//! A single uppercase letter is a nonterminal, `<name>` is a nonterminal with
//! any other name (`\>` and `\\` inside the brackets), `\x` is the terminal
//! `x`, `\{HH}` is the terminal byte `0xHH` and every other ASCII character
//! is a terminal. Unescaped whitespace is insignificant and an empty
//! alternative is ε. The first rule's left-hand side is the start symbol.

use super::{Grammar, GrammarSymbol};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarParseErrorKind {
    MissingArrow,
    UnexpectedArrow,
    EmptyLhs,
    BarInLhs,
    UnterminatedName,
    EmptyName,
    DanglingEscape,
    InvalidByteEscape,
    NonAscii(char),
    NoRules,
    StartNotNonTerminal,
}

impl fmt::Display for GrammarParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarParseErrorKind::MissingArrow => f.write_str("missing `->`"),
            GrammarParseErrorKind::UnexpectedArrow => f.write_str("more than one `->`"),
            GrammarParseErrorKind::EmptyLhs => f.write_str("empty left-hand side"),
            GrammarParseErrorKind::BarInLhs => f.write_str("`|` in left-hand side"),
            GrammarParseErrorKind::UnterminatedName => f.write_str("unterminated `<name>`"),
            GrammarParseErrorKind::EmptyName => f.write_str("empty `<>` name"),
            GrammarParseErrorKind::DanglingEscape => f.write_str("line ends with `\\`"),
            GrammarParseErrorKind::InvalidByteEscape => f.write_str("malformed `\\{HH}` byte escape"),
            GrammarParseErrorKind::NonAscii(c) => write!(f, "non-ASCII terminal {c:?}"),
            GrammarParseErrorKind::NoRules => f.write_str("no rules"),
            GrammarParseErrorKind::StartNotNonTerminal => {
                f.write_str("first left-hand side is not a single nonterminal")
            }
        }
    }
}

/// `line` is 1-based; it is 0 for [`GrammarParseErrorKind::NoRules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarParseError {
    pub line: usize,
    pub kind: GrammarParseErrorKind,
}

impl fmt::Display for GrammarParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for GrammarParseError {}

/// Printable terminals that have to be written as `\x`. Everything that is
/// not printable ASCII is written as `\{HH}`.
pub(crate) fn needs_escape(c: char) -> bool {
    c.is_ascii_uppercase() || matches!(c, '<' | '|' | '\\' | '#' | '-')
}

enum Token {
    Symbol(GrammarSymbol),
    Bar,
    Arrow,
    Epsilon,
}

fn terminal(c: char) -> Result<GrammarSymbol, GrammarParseErrorKind> {
    if c.is_ascii() {
        Ok(GrammarSymbol::Terminal(c as u8))
    } else {
        Err(GrammarParseErrorKind::NonAscii(c))
    }
}

/// One or two hex digits and the closing `}` of a `\{HH}` escape.
fn byte_escape(chars: &mut impl Iterator<Item = char>) -> Result<GrammarSymbol, GrammarParseErrorKind> {
    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        match chars.next() {
            Some('}') if digits > 0 => break,
            Some(c) if digits < 2 => {
                let digit = c.to_digit(16).ok_or(GrammarParseErrorKind::InvalidByteEscape)?;
                value = value * 16 + digit;
                digits += 1;
            }
            _ => return Err(GrammarParseErrorKind::InvalidByteEscape),
        }
    }
    u8::try_from(value)
        .map(GrammarSymbol::Terminal)
        .map_err(|_| GrammarParseErrorKind::InvalidByteEscape)
}

fn tokenize(line: &str) -> Result<Vec<Token>, GrammarParseErrorKind> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '|' => Token::Bar,
            '→' => Token::Arrow,
            '-' if chars.peek() == Some(&'>') => {
                chars.next();
                Token::Arrow
            }
            'ε' => Token::Epsilon,
            '<' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => name.push(c),
                            None => return Err(GrammarParseErrorKind::UnterminatedName),
                        },
                        Some(c) => name.push(c),
                        None => return Err(GrammarParseErrorKind::UnterminatedName),
                    }
                }
                if name.is_empty() {
                    return Err(GrammarParseErrorKind::EmptyName);
                }
                Token::Symbol(GrammarSymbol::NonTerminal(name))
            }
            '\\' => match chars.next() {
                Some('{') => Token::Symbol(byte_escape(&mut chars)?),
                Some(escaped) => Token::Symbol(terminal(escaped)?),
                None => return Err(GrammarParseErrorKind::DanglingEscape),
            },
            c if c.is_ascii_uppercase() => Token::Symbol(GrammarSymbol::NonTerminal(c.to_string())),
            c => Token::Symbol(terminal(c)?),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Split one rule into its left-hand side and alternatives.
fn parse_rule(line: &str) -> Result<(Vec<GrammarSymbol>, Vec<Vec<GrammarSymbol>>), GrammarParseErrorKind> {
    let mut tokens = tokenize(line)?;
    let arrow = tokens
        .iter()
        .position(|token| matches!(token, Token::Arrow))
        .ok_or(GrammarParseErrorKind::MissingArrow)?;
    let rhs_tokens = tokens.split_off(arrow + 1);
    tokens.truncate(arrow);

    let mut lhs = Vec::new();
    for token in tokens {
        match token {
            Token::Symbol(symbol) => lhs.push(symbol),
            Token::Bar => return Err(GrammarParseErrorKind::BarInLhs),
            Token::Epsilon | Token::Arrow => {}
        }
    }
    if lhs.is_empty() {
        return Err(GrammarParseErrorKind::EmptyLhs);
    }

    let mut alternatives = vec![Vec::new()];
    for token in rhs_tokens {
        match token {
            Token::Symbol(symbol) => {
                if let Some(alternative) = alternatives.last_mut() {
                    alternative.push(symbol);
                }
            }
            Token::Bar => alternatives.push(Vec::new()),
            Token::Epsilon => {}
            Token::Arrow => return Err(GrammarParseErrorKind::UnexpectedArrow),
        }
    }

    Ok((lhs, alternatives))
}

impl FromStr for Grammar {
    type Err = GrammarParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut grammar: Option<Grammar> = None;

        for (idx, line) in text.lines().enumerate() {
            // an escaped space may end the line, so only the check is trimmed
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let error = |kind| GrammarParseError { line: idx + 1, kind };

            let (lhs, alternatives) = parse_rule(line).map_err(error)?;
            if grammar.is_none() {
                let start = match lhs.as_slice() {
                    [GrammarSymbol::NonTerminal(name)] => name.as_str(),
                    _ => return Err(error(GrammarParseErrorKind::StartNotNonTerminal)),
                };
                grammar = Some(Grammar::new(start));
            }
            if let Some(grammar) = grammar.as_mut() {
                for rhs in alternatives {
                    grammar.add_production(lhs.clone(), rhs);
                }
            }
        }

        grammar.ok_or(GrammarParseError {
            line: 0,
            kind: GrammarParseErrorKind::NoRules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_at(text: &str) -> (usize, GrammarParseErrorKind) {
        let err = Grammar::parse(text).unwrap_err();
        (err.line, err.kind)
    }

    #[test]
    fn test_parse_rules() {
        let grammar = Grammar::parse(
            "# balanced
             S → aSb | ε

             <long name> -> \\A-x |",
        )
        .unwrap();

        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.nonterminals().iter().collect::<Vec<_>>(), vec!["S", "long name"]);
        assert_eq!(grammar.rules_for("S").count(), 2);

        let long: Vec<_> = grammar.rules_for("long name").collect();
        assert_eq!(
            long,
            vec![
                &[
                    GrammarSymbol::Terminal(b'A'),
                    GrammarSymbol::Terminal(b'-'),
                    GrammarSymbol::Terminal(b'x'),
                ][..],
                &[][..],
            ]
        );
    }

    #[test]
    fn test_general_lhs() {
        let grammar = Grammar::parse("S -> aSBc | abc\ncB -> Bc\nbB -> bb").unwrap();
        assert_eq!(grammar.productions().len(), 4);
        assert_eq!(
            grammar.productions()[2].lhs,
            vec![GrammarSymbol::Terminal(b'c'), GrammarSymbol::nonterminal("B")]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(kind_at(""), (0, GrammarParseErrorKind::NoRules));
        assert_eq!(kind_at("# only a comment"), (0, GrammarParseErrorKind::NoRules));
        assert_eq!(kind_at("S -> a\nA b"), (2, GrammarParseErrorKind::MissingArrow));
        assert_eq!(kind_at("-> a"), (1, GrammarParseErrorKind::EmptyLhs));
        assert_eq!(kind_at("S -> a -> b"), (1, GrammarParseErrorKind::UnexpectedArrow));
        assert_eq!(kind_at("S | A -> a"), (1, GrammarParseErrorKind::BarInLhs));
        assert_eq!(kind_at("S -> <open"), (1, GrammarParseErrorKind::UnterminatedName));
        assert_eq!(kind_at("S -> <>"), (1, GrammarParseErrorKind::EmptyName));
        assert_eq!(kind_at("S -> a\\"), (1, GrammarParseErrorKind::DanglingEscape));
        assert_eq!(kind_at("S -> aä"), (1, GrammarParseErrorKind::NonAscii('ä')));
        assert_eq!(kind_at("S -> \\{}"), (1, GrammarParseErrorKind::InvalidByteEscape));
        assert_eq!(kind_at("S -> \\{4g}"), (1, GrammarParseErrorKind::InvalidByteEscape));
        assert_eq!(kind_at("S -> \\{123}"), (1, GrammarParseErrorKind::InvalidByteEscape));
        assert_eq!(kind_at("S -> <a\\"), (1, GrammarParseErrorKind::UnterminatedName));
        assert_eq!(kind_at("aS -> b"), (1, GrammarParseErrorKind::StartNotNonTerminal));
    }

    #[test]
    fn test_escapes() {
        let grammar = Grammar::parse("S -> a\\  | \\{e4}\\{9} | <{q0,q1\\>}>").unwrap();
        let rules: Vec<_> = grammar.rules_for("S").collect();
        assert_eq!(
            rules,
            vec![
                &[GrammarSymbol::Terminal(b'a'), GrammarSymbol::Terminal(b' ')][..],
                &[GrammarSymbol::Terminal(0xE4), GrammarSymbol::Terminal(b'\t')][..],
                &[GrammarSymbol::nonterminal("{q0,q1>}")][..],
            ]
        );
    }

    #[test]
    fn test_printed_escapes_parse_back() {
        let mut grammar = Grammar::new("{q0,q1}");
        grammar.add_rule("{q0,q1}", vec![GrammarSymbol::Terminal(b'a'), GrammarSymbol::Terminal(b' ')]);
        grammar.add_rule(
            "{q0,q1}",
            vec![GrammarSymbol::Terminal(0xE4), GrammarSymbol::nonterminal("a>b\\c")],
        );
        grammar.add_rule("a>b\\c", vec![GrammarSymbol::Terminal(b'{'), GrammarSymbol::Terminal(b'\n')]);

        let text = grammar.to_string();
        assert_eq!(
            text,
            "<{q0,q1}> → a\\{20} | \\{E4}<a\\>b\\\\c>\n<a\\>b\\\\c> → {\\{0A}\n"
        );

        let reparsed = Grammar::parse(&text).unwrap();
        assert_eq!(reparsed.start(), "{q0,q1}");
        assert_eq!(reparsed.productions(), grammar.productions());
    }

    #[test]
    fn test_error_display() {
        let err = Grammar::parse("S -> a\nA b").unwrap_err();
        assert_eq!(err.to_string(), "line 2: missing `->`");
    }
}
