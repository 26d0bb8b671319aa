//! Grammars over byte terminals and named nonterminals.
//!
//! Productions keep full symbol sequences on both sides, so the same model
//! holds right-linear grammars produced from automata as well as the
//! context-sensitive and unrestricted grammars the classifier has to tell
//! apart.

mod classify;
mod derive;
mod parse;

use crate::automaton::{Dfa, Nfa, Symbol};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

pub use classify::ChomskyType;
pub use derive::{DeriveError, MAX_DERIVATION_STEPS};
pub use parse::{GrammarParseError, GrammarParseErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarSymbol {
    Terminal(Symbol),
    NonTerminal(String),
}

impl GrammarSymbol {
    pub fn nonterminal(name: impl Into<String>) -> Self {
        GrammarSymbol::NonTerminal(name.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GrammarSymbol::Terminal(_))
    }

    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            GrammarSymbol::NonTerminal(name) => Some(name),
            GrammarSymbol::Terminal(_) => None,
        }
    }
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(symbol) if !symbol.is_ascii_graphic() => {
                write!(f, "\\{{{symbol:02X}}}")
            }
            GrammarSymbol::Terminal(symbol) => {
                let c = char::from(*symbol);
                if parse::needs_escape(c) {
                    write!(f, "\\{c}")
                } else {
                    write!(f, "{c}")
                }
            }
            GrammarSymbol::NonTerminal(name) => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_uppercase() => write!(f, "{c}"),
                    _ => {
                        f.write_str("<")?;
                        for c in name.chars() {
                            if matches!(c, '>' | '\\') {
                                f.write_str("\\")?;
                            }
                            write!(f, "{c}")?;
                        }
                        f.write_str(">")
                    }
                }
            }
        }
    }
}

/// `lhs → rhs`; an empty `rhs` is an epsilon production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Vec<GrammarSymbol>,
    pub rhs: Vec<GrammarSymbol>,
}

impl Production {
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }

    /// The left-hand side when it is exactly one nonterminal.
    pub fn lhs_nonterminal(&self) -> Option<&str> {
        match self.lhs.as_slice() {
            [symbol] => symbol.as_nonterminal(),
            _ => None,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbols(f, &self.lhs)?;
        f.write_str(" → ")?;
        write_symbols(f, &self.rhs)
    }
}

fn write_symbols(f: &mut fmt::Formatter<'_>, symbols: &[GrammarSymbol]) -> fmt::Result {
    if symbols.is_empty() {
        return f.write_str("ε");
    }
    for symbol in symbols {
        write!(f, "{symbol}")?;
    }
    Ok(())
}

/// Failures converting a grammar into an automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// The production is not of the form `A → w` or `A → w B`.
    NotRightLinear(String),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::NotRightLinear(production) => {
                write!(f, "production `{production}` is not right-linear")
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// A grammar `G = (Vn, Vt, P, S)`.
#[derive(Debug, Clone)]
pub struct Grammar {
    start: String,
    nonterminals: IndexSet<String>,
    terminals: IndexSet<Symbol>,
    productions: Vec<Production>,
}

impl Grammar {
    /// An empty grammar; the start symbol is declared as a nonterminal.
    pub fn new(start: &str) -> Self {
        let mut nonterminals = IndexSet::new();
        nonterminals.insert(start.to_string());
        Self {
            start: start.to_string(),
            nonterminals,
            terminals: IndexSet::new(),
            productions: Vec::new(),
        }
    }

    /// Parse the textual form, see [`parse`](self::parse).
    pub fn parse(text: &str) -> Result<Self, GrammarParseError> {
        text.parse()
    }

    pub fn add_nonterminal(&mut self, name: &str) {
        if !self.nonterminals.contains(name) {
            self.nonterminals.insert(name.to_string());
        }
    }

    pub fn add_terminal(&mut self, terminal: Symbol) {
        self.terminals.insert(terminal);
    }

    /// Add `lhs → rhs`. Symbols are declared on the fly; a duplicate
    /// production is ignored.
    pub fn add_production(&mut self, lhs: Vec<GrammarSymbol>, rhs: Vec<GrammarSymbol>) {
        for symbol in lhs.iter().chain(&rhs) {
            match symbol {
                GrammarSymbol::Terminal(terminal) => self.add_terminal(*terminal),
                GrammarSymbol::NonTerminal(name) => self.add_nonterminal(name),
            }
        }
        let production = Production { lhs, rhs };
        if !self.productions.contains(&production) {
            self.productions.push(production);
        }
    }

    /// Add `nonterminal → rhs`.
    pub fn add_rule(&mut self, nonterminal: &str, rhs: Vec<GrammarSymbol>) {
        self.add_production(vec![GrammarSymbol::nonterminal(nonterminal)], rhs);
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn nonterminals(&self) -> &IndexSet<String> {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &IndexSet<Symbol> {
        &self.terminals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Right-hand sides of the productions whose left-hand side is exactly
    /// `nonterminal`.
    pub fn rules_for<'g>(&'g self, nonterminal: &'g str) -> impl Iterator<Item = &'g [GrammarSymbol]> + 'g {
        self.productions
            .iter()
            .filter(move |production| production.lhs_nonterminal() == Some(nonterminal))
            .map(|production| production.rhs.as_slice())
    }

    /// NFA with one state per nonterminal plus a fresh final state.
    ///
    /// `A → a1..an B` becomes a chain of `n` edges ending in `B`, `A → a1..an`
    /// a chain ending in the final state, `A → B` an epsilon edge and `A → ε`
    /// makes `A` final.
    pub fn to_nfa(&self) -> Result<Nfa, GrammarError> {
        let final_state = fresh_name("X", |name| self.nonterminals.contains(name));

        let mut nfa = Nfa::new();
        nfa.add_start_state(&self.start);
        for name in &self.nonterminals {
            nfa.add_state(name);
        }
        for &terminal in &self.terminals {
            nfa.add_symbol(terminal);
        }
        nfa.add_final_state(&final_state);

        for production in &self.productions {
            let not_right_linear = || GrammarError::NotRightLinear(production.to_string());
            let lhs = production.lhs_nonterminal().ok_or_else(not_right_linear)?;
            let (terminals, next) = split_right_linear(&production.rhs).ok_or_else(not_right_linear)?;

            let target = next.unwrap_or(final_state.as_str());
            if terminals.is_empty() {
                match next {
                    Some(next) => nfa.add_epsilon_transition(lhs, next),
                    None => nfa.add_final_state(lhs),
                }
                continue;
            }

            let mut current = lhs.to_string();
            for (idx, &terminal) in terminals.iter().enumerate() {
                let destination = if idx + 1 == terminals.len() {
                    target.to_string()
                } else {
                    let table = nfa.state_table();
                    fresh_name(&format!("{lhs}'"), |name| table.contains(name))
                };
                nfa.add_transition(&current, terminal, &destination);
                current = destination;
            }
        }

        Ok(nfa)
    }

    /// Deterministic automaton for a right-linear grammar.
    pub fn to_dfa(&self) -> Result<Dfa, GrammarError> {
        Ok(self.to_nfa()?.to_dfa())
    }
}

impl fmt::Display for Grammar {
    /// One line per left-hand side, start symbol first:
    /// `S → aS | b`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: IndexMap<&[GrammarSymbol], Vec<&[GrammarSymbol]>> = IndexMap::new();
        let start = [GrammarSymbol::nonterminal(self.start.as_str())];
        if self.productions.iter().any(|p| p.lhs == start) {
            groups.insert(start.as_slice(), Vec::new());
        }
        for production in &self.productions {
            groups
                .entry(production.lhs.as_slice())
                .or_default()
                .push(production.rhs.as_slice());
        }

        for (lhs, alternatives) in groups {
            write_symbols(f, lhs)?;
            f.write_str(" → ")?;
            for (idx, rhs) in alternatives.into_iter().enumerate() {
                if idx > 0 {
                    f.write_str(" | ")?;
                }
                write_symbols(f, rhs)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Split a right-hand side into its terminal prefix and optional trailing
/// nonterminal. `None` when a nonterminal appears anywhere else.
pub(crate) fn split_right_linear(rhs: &[GrammarSymbol]) -> Option<(Vec<Symbol>, Option<&str>)> {
    let (body, next) = match rhs.split_last() {
        Some((GrammarSymbol::NonTerminal(name), body)) => (body, Some(name.as_str())),
        _ => (rhs, None),
    };
    let terminals = body
        .iter()
        .map(|symbol| match symbol {
            GrammarSymbol::Terminal(terminal) => Some(*terminal),
            GrammarSymbol::NonTerminal(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some((terminals, next))
}

/// `base`, or `base` followed by the smallest number that is not taken.
pub(crate) fn fresh_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (0usize..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn variant5() -> Grammar {
        Grammar::parse(
            "S -> bS | aF | d
             F -> cF | dF | aL | b
             L -> aL | c",
        )
        .unwrap()
    }

    #[test]
    fn test_model() {
        let grammar = variant5();
        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.nonterminals().iter().collect::<Vec<_>>(), vec!["S", "F", "L"]);
        assert_eq!(grammar.terminals().iter().copied().collect::<Vec<_>>(), b"badc".to_vec());
        assert_eq!(grammar.productions().len(), 9);
        assert_eq!(grammar.rules_for("L").count(), 2);
        assert_eq!(grammar.rules_for("Q").count(), 0);
    }

    #[test]
    fn test_duplicate_production_ignored() {
        let mut grammar = Grammar::new("S");
        grammar.add_rule("S", vec![GrammarSymbol::Terminal(b'a')]);
        grammar.add_rule("S", vec![GrammarSymbol::Terminal(b'a')]);
        assert_eq!(grammar.productions().len(), 1);
    }

    #[test]
    fn test_display_round_trip() {
        let mut grammar = variant5();
        grammar.add_rule("q1", vec![GrammarSymbol::Terminal(b'|'), GrammarSymbol::nonterminal("S")]);
        grammar.add_rule("S", Vec::new());

        let text = grammar.to_string();
        assert!(text.starts_with("S → bS | aF | d | ε\n"), "{text}");
        assert!(text.contains("<q1> → \\|S"), "{text}");

        let reparsed = Grammar::parse(&text).unwrap();
        assert_eq!(reparsed.to_string(), text);
        assert_eq!(reparsed.productions().len(), grammar.productions().len());
        for production in grammar.productions() {
            assert!(reparsed.productions().contains(production), "{production} lost");
        }
    }

    #[test]
    fn test_to_dfa_accepts_variant5() {
        let dfa = variant5().to_dfa().unwrap();
        for word in ["d", "bbd", "ab", "acdab", "aac", "aaaac"] {
            assert!(dfa.accept(word), "{word} should be accepted");
        }
        for word in ["baas", "addc", "bacbbda", "", "a", "dd"] {
            assert!(!dfa.accept(word), "{word} should be rejected");
        }
    }

    #[test]
    fn test_to_nfa_chains_terminal_strings() {
        let grammar = Grammar::parse(
            "S -> abS | c | A
             A -> ε | xy",
        )
        .unwrap();
        let nfa = grammar.to_nfa().unwrap();
        for word in ["c", "abc", "ababxy", "", "ab", "xy"] {
            assert!(nfa.accept(word), "{word} should be accepted");
        }
        for word in ["a", "abx", "cc"] {
            assert!(!nfa.accept(word), "{word} should be rejected");
        }
    }

    #[test]
    fn test_to_nfa_rejects_non_right_linear() {
        let grammar = Grammar::parse("S -> aSb | ε").unwrap();
        assert_eq!(
            grammar.to_nfa().unwrap_err(),
            GrammarError::NotRightLinear("S → aSb".to_string())
        );
    }

    #[test]
    fn test_fresh_name() {
        assert_eq!(fresh_name("X", |name| name == "Y"), "X");
        assert_eq!(fresh_name("X", |name| name == "X" || name == "X0"), "X1");
    }

    #[test]
    fn test_split_right_linear() {
        let rhs = [
            GrammarSymbol::Terminal(b'a'),
            GrammarSymbol::Terminal(b'b'),
            GrammarSymbol::nonterminal("B"),
        ];
        assert_eq!(split_right_linear(&rhs), Some((b"ab".to_vec(), Some("B"))));
        assert_eq!(split_right_linear(&rhs[..2]), Some((b"ab".to_vec(), None)));
        assert_eq!(split_right_linear(&[]), Some((Vec::new(), None)));
        let swapped = [GrammarSymbol::nonterminal("B"), GrammarSymbol::Terminal(b'a')];
        assert_eq!(split_right_linear(&swapped), None);
    }
}
