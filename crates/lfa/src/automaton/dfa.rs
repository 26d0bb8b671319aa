//! Deterministic automata over a partial transition function.

use crate::automaton::AutomatonError;
use crate::automaton::state::{StateId, StateSet, StateTable};
use crate::automaton::symbol::Symbol;
use crate::grammar::{Grammar, GrammarSymbol};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::collections::VecDeque;

/// A Deterministic Finite Automaton with a partial transition function.
#[derive(Debug, Clone)]
pub struct Dfa {
    /// State names, indexed by `StateId`
    states: StateTable,
    /// Declared alphabet
    alphabet: IndexSet<Symbol>,
    /// Transitions: (source, symbol) -> destination
    transitions: IndexMap<(StateId, Symbol), StateId>,
    /// The single start state
    start_state: StateId,
    /// Final (accepting) states
    final_states: StateSet,
}

impl Dfa {
    /// Create a DFA that only has its start state.
    pub fn new(start: &str) -> Self {
        let mut states = StateTable::new();
        let start_state = states.intern(start);
        Self {
            states,
            alphabet: IndexSet::new(),
            transitions: IndexMap::new(),
            start_state,
            final_states: StateSet::with_capacity(16),
        }
    }

    /// Build a DFA from explicit state, alphabet, transition and final lists.
    pub fn from_parts(
        states: &[&str],
        alphabet: &[Symbol],
        transitions: &[(&str, Symbol, &str)],
        start: &str,
        finals: &[&str],
    ) -> Result<Self, AutomatonError> {
        let mut dfa = Self::new(start);
        for state in states {
            dfa.add_state(state);
        }
        for &symbol in alphabet {
            dfa.add_symbol(symbol);
        }
        for &(source, symbol, destination) in transitions {
            dfa.add_transition(source, symbol, destination)?;
        }
        for state in finals {
            dfa.add_final_state(state);
        }
        Ok(dfa)
    }

    /// Add a state (no-op if it exists) and return its ID.
    pub fn add_state(&mut self, name: &str) -> StateId {
        self.states.intern(name)
    }

    /// Add a symbol to the alphabet.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.alphabet.insert(symbol);
    }

    /// Mark a state as final, adding it if needed.
    pub fn add_final_state(&mut self, name: &str) {
        let id = self.add_state(name);
        self.final_states.insert(id);
    }

    /// Add a transition. Fails if the source already moves somewhere else
    /// on the same symbol.
    pub fn add_transition(
        &mut self,
        source: &str,
        symbol: Symbol,
        destination: &str,
    ) -> Result<(), AutomatonError> {
        let src = self.add_state(source);
        let dst = self.add_state(destination);
        if let Some(&existing) = self.transitions.get(&(src, symbol)) {
            if existing != dst {
                return Err(AutomatonError::ConflictingTransition {
                    state: source.to_string(),
                    symbol,
                    existing: self.states.name(existing).to_string(),
                    requested: destination.to_string(),
                });
            }
        }
        self.add_transition_by_id(src, symbol, dst);
        Ok(())
    }

    pub(crate) fn add_transition_by_id(
        &mut self,
        source: StateId,
        symbol: Symbol,
        destination: StateId,
    ) {
        self.alphabet.insert(symbol);
        self.transitions.insert((source, symbol), destination);
    }

    pub(crate) fn add_final_by_id(&mut self, state: StateId) {
        self.final_states.insert(state);
    }

    /// Get the successor of a state on a symbol.
    pub fn transition(&self, state: &str, symbol: Symbol) -> Option<&str> {
        let src = self.states.id(state)?;
        self.transitions
            .get(&(src, symbol))
            .map(|&dst| self.states.name(dst))
    }

    /// Get the number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// All state names, in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|(_, name)| name)
    }

    /// Get the alphabet.
    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    /// Get the start state name.
    pub fn start_state(&self) -> &str {
        self.states.name(self.start_state)
    }

    /// Get the final state names.
    pub fn final_states(&self) -> impl Iterator<Item = &str> + '_ {
        self.final_states.iter().map(|id| self.states.name(id))
    }

    /// Check if a state is final. Unknown names are not.
    pub fn is_final(&self, state: &str) -> bool {
        self.states
            .id(state)
            .is_some_and(|id| self.final_states.contains(id))
    }

    /// All transitions as `(source, symbol, destination)`, in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, Symbol, &str)> + '_ {
        self.transitions.iter().map(|(&(src, symbol), &dst)| {
            (self.states.name(src), symbol, self.states.name(dst))
        })
    }

    /// Run the automaton on `word`. Unknown symbols and missing transitions
    /// reject; they are not errors.
    pub fn accept(&self, word: &str) -> bool {
        let mut current = self.start_state;

        for symbol in word.bytes() {
            if !self.alphabet.contains(&symbol) {
                debug!("symbol {:?} is not in the alphabet", char::from(symbol));
                return false;
            }
            match self.transitions.get(&(current, symbol)) {
                Some(&next) => current = next,
                None => {
                    debug!(
                        "state `{}` has no transition on {:?}",
                        self.states.name(current),
                        char::from(symbol)
                    );
                    return false;
                }
            }
        }

        self.final_states.contains(current)
    }

    /// Check if the DFA accepts no strings at all.
    pub fn is_empty(&self) -> bool {
        if self.final_states.is_empty() {
            return true;
        }

        let mut visited = StateSet::with_capacity(self.states.len());
        let mut queue = VecDeque::from([self.start_state]);

        while let Some(state) = queue.pop_front() {
            if !visited.insert(state) {
                continue;
            }
            if self.final_states.contains(state) {
                return false;
            }
            for &symbol in &self.alphabet {
                if let Some(&next) = self.transitions.get(&(state, symbol)) {
                    if !visited.contains(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        true
    }

    /// Right-linear grammar generating the same language.
    ///
    /// Every transition `q -a-> p` yields `q → a p`, plus `q → a` when `p` is
    /// final. A final start state contributes `start → ε`.
    pub fn to_grammar(&self) -> Grammar {
        let mut grammar = Grammar::new(self.start_state());
        for (_, name) in self.states.iter() {
            grammar.add_nonterminal(name);
        }
        for &symbol in &self.alphabet {
            grammar.add_terminal(symbol);
        }

        if self.final_states.contains(self.start_state) {
            grammar.add_rule(self.start_state(), Vec::new());
        }

        for (&(src, symbol), &dst) in &self.transitions {
            let lhs = self.states.name(src);
            grammar.add_rule(
                lhs,
                vec![
                    GrammarSymbol::Terminal(symbol),
                    GrammarSymbol::nonterminal(self.states.name(dst)),
                ],
            );
            if self.final_states.contains(dst) {
                grammar.add_rule(lhs, vec![GrammarSymbol::Terminal(symbol)]);
            }
        }

        grammar
    }
}
