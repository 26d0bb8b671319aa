//! Recursive-descent regex parser.
//!
//! ```text
//! expression := term ('|' term)*
//! term       := factor*
//! factor     := atom repetition?
//! atom       := literal | '\' any | '.' | '(' expression ')'
//! repetition := '*' | '+' | '?' | '{' integer '}' | '^' integer
//! ```

use crate::automaton::Symbol;
use crate::regex::fragment::{Fragment, Thompson};
use crate::regex::{RegexError, RegexErrorKind};

pub(crate) struct Parser<'p> {
    pattern: &'p [u8],
    position: usize,
    wildcard: &'p [Symbol],
    max_repetition: usize,
    thompson: Thompson,
}

impl<'p> Parser<'p> {
    pub(crate) fn new(pattern: &'p str, wildcard: &'p [Symbol], max_repetition: usize) -> Self {
        Self {
            pattern: pattern.as_bytes(),
            position: 0,
            wildcard,
            max_repetition,
            thompson: Thompson::new(),
        }
    }

    /// Parse the whole pattern into one fragment.
    pub(crate) fn parse(mut self) -> Result<Fragment, RegexError> {
        let fragment = self.expression()?;
        match self.peek() {
            None => Ok(fragment),
            // expression() only stops early on a `)` it did not open
            Some(_) => Err(self.error(RegexErrorKind::UnmatchedCloseParen)),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn error(&self, kind: RegexErrorKind) -> RegexError {
        RegexError {
            kind,
            offset: self.position,
        }
    }

    fn at_term_end(&self) -> bool {
        matches!(self.peek(), None | Some(b')' | b'|'))
    }

    fn expression(&mut self) -> Result<Fragment, RegexError> {
        let mut fragment = self.term()?;
        while self.peek() == Some(b'|') {
            self.position += 1;
            let right = self.term()?;
            fragment = self.thompson.union(fragment, right);
        }
        Ok(fragment)
    }

    fn term(&mut self) -> Result<Fragment, RegexError> {
        if self.at_term_end() {
            return Ok(self.thompson.empty());
        }
        let mut fragment = self.factor()?;
        while !self.at_term_end() {
            let next = self.factor()?;
            fragment = self.thompson.concatenate(fragment, next);
        }
        Ok(fragment)
    }

    fn factor(&mut self) -> Result<Fragment, RegexError> {
        let atom = self.atom()?;
        self.repetition(atom)
    }

    fn atom(&mut self) -> Result<Fragment, RegexError> {
        let open = self.position;
        let Some(byte) = self.bump() else {
            return Err(self.error(RegexErrorKind::UnexpectedEnd));
        };

        match byte {
            b'(' => {
                let inner = self.expression()?;
                if self.peek() != Some(b')') {
                    return Err(RegexError {
                        kind: RegexErrorKind::MissingCloseParen,
                        offset: open,
                    });
                }
                self.position += 1;
                Ok(inner)
            }
            b'.' => Ok(self.thompson.wildcard(self.wildcard)),
            b'\\' => match self.bump() {
                Some(escaped) => Ok(self.thompson.literal(escaped)),
                None => Err(RegexError {
                    kind: RegexErrorKind::DanglingEscape,
                    offset: open,
                }),
            },
            b'*' | b'+' | b'?' | b'{' | b'^' => Err(RegexError {
                kind: RegexErrorKind::NothingToRepeat,
                offset: open,
            }),
            literal => Ok(self.thompson.literal(literal)),
        }
    }

    fn repetition(&mut self, fragment: Fragment) -> Result<Fragment, RegexError> {
        let fragment = match self.peek() {
            Some(b'*') => {
                self.position += 1;
                self.thompson.star(fragment)
            }
            Some(b'+') => {
                self.position += 1;
                self.thompson.plus(fragment)
            }
            Some(b'?') => {
                self.position += 1;
                self.thompson.question(fragment)
            }
            Some(b'^') => {
                self.position += 1;
                let count = self.number()?;
                self.thompson.repeat(fragment, count)
            }
            Some(b'{') => {
                self.position += 1;
                let count = self.number()?;
                if self.peek() != Some(b'}') {
                    return Err(self.error(RegexErrorKind::MissingCloseBrace));
                }
                self.position += 1;
                self.thompson.repeat(fragment, count)
            }
            _ => fragment,
        };
        Ok(fragment)
    }

    /// Repetition count, at most `max_repetition`.
    fn number(&mut self) -> Result<usize, RegexError> {
        let start = self.position;
        if self.peek().is_none() {
            return Err(self.error(RegexErrorKind::UnexpectedEnd));
        }
        while self.peek().is_some_and(|byte| byte.is_ascii_digit()) {
            self.position += 1;
        }
        if start == self.position {
            return Err(self.error(RegexErrorKind::ExpectedNumber));
        }

        // only ASCII digits were consumed
        let digits = String::from_utf8_lossy(&self.pattern[start..self.position]);
        let invalid = RegexError {
            kind: RegexErrorKind::InvalidNumber,
            offset: start,
        };
        match digits.parse::<usize>() {
            Ok(count) if count <= self.max_repetition => Ok(count),
            _ => Err(invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> Result<Fragment, RegexError> {
        Parser::new(pattern, b"ab", 100).parse()
    }

    fn kind_at(pattern: &str) -> (RegexErrorKind, usize) {
        let err = parse(pattern).unwrap_err();
        (err.kind, err.offset)
    }

    #[test]
    fn test_well_formed_patterns() {
        for pattern in ["", "a", "a|", "|", "()", "(a|b)*", "a{0}", "a^12", "\\*", ".+", "((a))"] {
            assert!(parse(pattern).is_ok(), "{pattern:?} should parse");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(kind_at("(ab"), (RegexErrorKind::MissingCloseParen, 0));
        assert_eq!(kind_at("a(b|(c)"), (RegexErrorKind::MissingCloseParen, 1));
        assert_eq!(kind_at("ab)"), (RegexErrorKind::UnmatchedCloseParen, 2));
        assert_eq!(kind_at("a{"), (RegexErrorKind::UnexpectedEnd, 2));
        assert_eq!(kind_at("a{x}"), (RegexErrorKind::ExpectedNumber, 2));
        assert_eq!(kind_at("a^"), (RegexErrorKind::UnexpectedEnd, 2));
        assert_eq!(kind_at("a^}"), (RegexErrorKind::ExpectedNumber, 2));
        assert_eq!(kind_at("a{3"), (RegexErrorKind::MissingCloseBrace, 3));
        assert_eq!(kind_at("a{99999999999999999999999}"), (RegexErrorKind::InvalidNumber, 2));
        assert_eq!(kind_at("(ab|c){3000000}"), (RegexErrorKind::InvalidNumber, 7));
        assert_eq!(kind_at("b^101"), (RegexErrorKind::InvalidNumber, 2));
        assert!(parse("b^100").is_ok());
        assert_eq!(kind_at("*a"), (RegexErrorKind::NothingToRepeat, 0));
        assert_eq!(kind_at("a**"), (RegexErrorKind::NothingToRepeat, 2));
        assert_eq!(kind_at("ab\\"), (RegexErrorKind::DanglingEscape, 2));
    }
}
