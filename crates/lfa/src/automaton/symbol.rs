//! Alphabet symbols and edge labels.

use std::fmt;

/// An alphabet symbol. Words are read byte by byte.
pub type Symbol = u8;

/// The label on an automaton edge.
///
/// Epsilon is its own variant, so no alphabet byte can ever be mistaken for
/// an empty move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Symbol(Symbol),
    Epsilon,
}

impl Label {
    /// Check if this label is an epsilon move.
    #[inline]
    pub fn is_epsilon(self) -> bool {
        matches!(self, Label::Epsilon)
    }

    /// The consumed symbol, or `None` for epsilon.
    #[inline]
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Label::Symbol(symbol) => Some(symbol),
            Label::Epsilon => None,
        }
    }
}

impl From<Symbol> for Label {
    fn from(symbol: Symbol) -> Self {
        Label::Symbol(symbol)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Symbol(symbol) => write!(f, "{}", char::from(*symbol)),
            Label::Epsilon => f.write_str("ε"),
        }
    }
}
