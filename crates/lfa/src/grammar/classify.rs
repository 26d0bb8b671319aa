//! Chomsky hierarchy classification.

use super::{Grammar, GrammarSymbol, Production};
use std::fmt;

/// Most restrictive Chomsky type a grammar satisfies. Ordered so that a
/// larger value is a more restrictive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChomskyType {
    Unrestricted = 0,
    ContextSensitive = 1,
    ContextFree = 2,
    Regular = 3,
}

impl ChomskyType {
    /// 0 to 3, as in "Type 3".
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ChomskyType::Unrestricted => "Unrestricted Grammar",
            ChomskyType::ContextSensitive => "Context-Sensitive Grammar",
            ChomskyType::ContextFree => "Context-Free Grammar",
            ChomskyType::Regular => "Regular Grammar",
        }
    }
}

impl fmt::Display for ChomskyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type {}: {}", self.level(), self.name())
    }
}

fn is_nonterminal(symbol: &GrammarSymbol) -> bool {
    !symbol.is_terminal()
}

impl Grammar {
    /// Classify by testing Type 3, Type 2 and Type 1 in that order.
    ///
    /// The Type 1 test only checks that no production shrinks the sentential
    /// form (apart from `S → ε` with `S` absent from every right-hand side).
    /// It does not look for the `αAβ → αγβ` context shape, so it accepts
    /// every noncontracting grammar.
    pub fn classify(&self) -> ChomskyType {
        if self.is_right_linear() || self.is_left_linear() {
            ChomskyType::Regular
        } else if self.is_context_free() {
            ChomskyType::ContextFree
        } else if self.is_context_sensitive() {
            ChomskyType::ContextSensitive
        } else {
            ChomskyType::Unrestricted
        }
    }

    /// Every production is `A → ε`, `A → a` or `A → aB`.
    pub fn is_right_linear(&self) -> bool {
        self.is_linear(|rhs| match rhs {
            [] => true,
            [first] => first.is_terminal(),
            [first, second] => first.is_terminal() && is_nonterminal(second),
            _ => false,
        })
    }

    /// Every production is `A → ε`, `A → a` or `A → Ba`.
    pub fn is_left_linear(&self) -> bool {
        self.is_linear(|rhs| match rhs {
            [] => true,
            [only] => only.is_terminal(),
            [first, second] => is_nonterminal(first) && second.is_terminal(),
            _ => false,
        })
    }

    fn is_linear(&self, rhs_ok: impl Fn(&[GrammarSymbol]) -> bool) -> bool {
        self.productions
            .iter()
            .all(|production| self.has_single_nonterminal_lhs(production) && rhs_ok(&production.rhs))
    }

    /// Every left-hand side is one declared nonterminal.
    pub fn is_context_free(&self) -> bool {
        self.productions
            .iter()
            .all(|production| self.has_single_nonterminal_lhs(production))
    }

    /// No production shrinks, except `S → ε` when `S` never appears on a
    /// right-hand side.
    pub fn is_context_sensitive(&self) -> bool {
        let start = GrammarSymbol::nonterminal(self.start.as_str());
        let start_on_rhs = self
            .productions
            .iter()
            .any(|production| production.rhs.contains(&start));

        self.productions.iter().all(|production| {
            if production.rhs.is_empty() && production.lhs == [start.clone()] {
                return !start_on_rhs;
            }
            production.rhs.len() >= production.lhs.len()
        })
    }

    fn has_single_nonterminal_lhs(&self, production: &Production) -> bool {
        production
            .lhs_nonterminal()
            .is_some_and(|name| self.nonterminals.contains(name))
    }
}
