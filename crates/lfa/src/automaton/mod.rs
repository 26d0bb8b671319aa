//! Finite automata over byte alphabets.
//!
//! [`Nfa`] allows epsilon edges and several start states; [`Dfa`] has one
//! start state and at most one successor per state and symbol. Both intern
//! state names into a [`StateTable`] and convert back into right-linear
//! grammars. [`subset_construction`] turns the former into the latter.

mod dfa;
mod generate;
mod nfa;
mod state;
mod subset_construction;
mod symbol;

use std::fmt;

pub use dfa::Dfa;
pub use generate::GenerateError;
pub use nfa::Nfa;
pub use state::{StateId, StateSet, StateTable};
pub use subset_construction::subset_construction;
pub use symbol::{Label, Symbol};

/// Errors raised while building an automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomatonError {
    /// A DFA already has a different successor for this state and symbol.
    ConflictingTransition {
        state: String,
        symbol: Symbol,
        existing: String,
        requested: String,
    },
}

impl fmt::Display for AutomatonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonError::ConflictingTransition {
                state,
                symbol,
                existing,
                requested,
            } => write!(
                f,
                "state `{state}` already moves to `{existing}` on `{}`, cannot add `{requested}`",
                char::from(*symbol)
            ),
        }
    }
}

impl std::error::Error for AutomatonError {}
