//! Nondeterministic automata with epsilon edges.

use crate::automaton::dfa::Dfa;
use crate::automaton::state::{StateId, StateSet, StateTable};
use crate::automaton::subset_construction::subset_construction;
use crate::automaton::symbol::{Label, Symbol};
use crate::grammar::{Grammar, GrammarSymbol, fresh_name};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::collections::VecDeque;

/// `(Q, Σ, δ, Q0, F)` where `δ` maps a state and a [`Label`] to a set of
/// states.
#[derive(Debug, Clone, Default)]
pub struct Nfa {
    /// State names, indexed by `StateId`
    states: StateTable,
    /// All symbols used (epsilon is a label, never a symbol)
    alphabet: IndexSet<Symbol>,
    /// Transitions: (source, label) -> set of destination states
    transitions: IndexMap<(StateId, Label), StateSet>,
    start_states: StateSet,
    final_states: StateSet,
}

impl Nfa {
    /// Create an empty NFA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an NFA from explicit lists. Each transition is
    /// `(source, label, destinations)`.
    pub fn from_parts(
        states: &[&str],
        alphabet: &[Symbol],
        transitions: &[(&str, Label, &[&str])],
        start_states: &[&str],
        final_states: &[&str],
    ) -> Self {
        let mut nfa = Self::new();
        for state in states {
            nfa.add_state(state);
        }
        for &symbol in alphabet {
            nfa.add_symbol(symbol);
        }
        for &(source, label, destinations) in transitions {
            for destination in destinations {
                nfa.add_transition(source, label, destination);
            }
        }
        for state in start_states {
            nfa.add_start_state(state);
        }
        for state in final_states {
            nfa.add_final_state(state);
        }
        nfa
    }

    /// Add a state (no-op if it exists) and return its ID.
    pub fn add_state(&mut self, name: &str) -> StateId {
        self.states.intern(name)
    }

    /// Add a symbol to the alphabet.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.alphabet.insert(symbol);
    }

    /// Add a transition from source to destination. A symbol label is added
    /// to the alphabet.
    pub fn add_transition(&mut self, source: &str, label: impl Into<Label>, destination: &str) {
        let src = self.add_state(source);
        let dst = self.add_state(destination);
        let label = label.into();

        if let Label::Symbol(symbol) = label {
            self.alphabet.insert(symbol);
        }

        self.transitions
            .entry((src, label))
            .or_insert_with(|| StateSet::with_capacity(self.states.len()))
            .insert(dst);
    }

    /// Add an epsilon transition from source to destination.
    pub fn add_epsilon_transition(&mut self, source: &str, destination: &str) {
        self.add_transition(source, Label::Epsilon, destination);
    }

    /// Mark a state as a start state, adding it if needed.
    pub fn add_start_state(&mut self, name: &str) {
        let id = self.add_state(name);
        self.start_states.insert(id);
    }

    /// Mark a state as final, adding it if needed.
    pub fn add_final_state(&mut self, name: &str) {
        let id = self.add_state(name);
        self.final_states.insert(id);
    }

    /// Get the number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Get the state name table.
    pub fn state_table(&self) -> &StateTable {
        &self.states
    }

    /// Look up a state ID by name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.id(name)
    }

    /// Get the name of a state.
    pub fn state_name(&self, id: StateId) -> &str {
        self.states.name(id)
    }

    /// All state names, in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|(_, name)| name)
    }

    /// Σ; epsilon is never a member.
    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    /// Get the start states as a set of IDs.
    pub fn start_state_set(&self) -> &StateSet {
        &self.start_states
    }

    /// Get the final states as a set of IDs.
    pub fn final_state_set(&self) -> &StateSet {
        &self.final_states
    }

    /// Get the start state names.
    pub fn start_states(&self) -> impl Iterator<Item = &str> + '_ {
        self.start_states.iter().map(|id| self.states.name(id))
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

    /// Destinations of `state` on `label`; empty when there is no such edge.
    pub fn transitions_from(&self, state: &str, label: Label) -> impl Iterator<Item = &str> + '_ {
        self.states
            .id(state)
            .and_then(|id| self.transitions.get(&(id, label)))
            .into_iter()
            .flat_map(|destinations| destinations.iter())
            .map(|id| self.states.name(id))
    }

    /// All transitions as `(source, label, destination)`.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, Label, &str)> + '_ {
        self.transitions.iter().flat_map(move |(&(src, label), dests)| {
            dests
                .iter()
                .map(move |dst| (self.states.name(src), label, self.states.name(dst)))
        })
    }

    /// Outgoing edges of a state, epsilon edges first.
    pub(crate) fn edges_from(&self, state: StateId) -> Vec<(Label, StateId)> {
        std::iter::once(Label::Epsilon)
            .chain(self.alphabet.iter().map(|&symbol| Label::Symbol(symbol)))
            .filter_map(|label| {
                self.transitions
                    .get(&(state, label))
                    .map(|dests| (label, dests))
            })
            .flat_map(|(label, dests)| dests.iter().map(move |dst| (label, dst)))
            .collect()
    }

    /// States reachable from `state` through zero or more epsilon moves.
    pub fn epsilon_closure(&self, state: StateId) -> StateSet {
        self.epsilon_closure_set(&StateSet::singleton(state, self.states.len()))
    }

    /// Union of the epsilon closures of every member of `states` (DFS).
    pub fn epsilon_closure_set(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.states.len());
        let mut stack: Vec<StateId> = states.iter().collect();

        while let Some(s) = stack.pop() {
            if !closure.insert(s) {
                continue;
            }
            if let Some(destinations) = self.transitions.get(&(s, Label::Epsilon)) {
                stack.extend(destinations.iter().filter(|&dest| !closure.contains(dest)));
            }
        }

        closure
    }

    /// Epsilon closure of the states reached from `states` on `symbol`.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: Symbol) -> StateSet {
        let mut reached = StateSet::with_capacity(self.states.len());

        for state in states.iter() {
            if let Some(destinations) = self.transitions.get(&(state, Label::Symbol(symbol))) {
                reached.union_with(destinations);
            }
        }

        self.epsilon_closure_set(&reached)
    }

    /// Simulate the automaton on `word` over sets of states.
    pub fn accept(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure_set(&self.start_states);

        for (position, symbol) in word.bytes().enumerate() {
            current = self.move_on_symbol(&current, symbol);
            if current.is_empty() {
                debug!(
                    "no live states after {:?} at position {position}",
                    char::from(symbol)
                );
                return false;
            }
        }

        current.intersects(&self.final_states)
    }

    /// True iff the automaton already is a complete DFA: one start state, no
    /// epsilon edges and exactly one successor per state and symbol.
    pub fn is_dfa(&self) -> bool {
        if self.start_states.len() != 1 {
            return false;
        }
        if self.transitions.keys().any(|(_, label)| label.is_epsilon()) {
            return false;
        }
        self.states.iter().all(|(state, _)| {
            self.alphabet.iter().all(|&symbol| {
                self.transitions
                    .get(&(state, Label::Symbol(symbol)))
                    .is_some_and(|dests| dests.len() == 1)
            })
        })
    }

    /// Determinize via subset construction.
    pub fn to_dfa(&self) -> Dfa {
        subset_construction(self)
    }

    /// Right-linear grammar for the epsilon-free view of this automaton.
    ///
    /// For every state `q`, every `p` in the closure of `q` and every edge
    /// `p -a-> r`: `q → a r`, plus `q → a` when the closure of `r` holds a
    /// final state. Several start states share a fresh start nonterminal.
    pub fn to_grammar(&self) -> Grammar {
        let start = match self.start_states.len() {
            1 => self.start_states().collect::<String>(),
            _ => fresh_name("S", |name| self.states.contains(name)),
        };

        let mut grammar = Grammar::new(&start);
        for (_, name) in self.states.iter() {
            grammar.add_nonterminal(name);
        }
        for &symbol in &self.alphabet {
            grammar.add_terminal(symbol);
        }

        let start_closure = self.epsilon_closure_set(&self.start_states);
        if start_closure.intersects(&self.final_states) {
            grammar.add_rule(&start, Vec::new());
        }
        if !self.states.contains(&start) {
            for rhs in self.rules_from(&start_closure) {
                grammar.add_rule(&start, rhs);
            }
        }
        for (state, name) in self.states.iter() {
            for rhs in self.rules_from(&self.epsilon_closure(state)) {
                grammar.add_rule(name, rhs);
            }
        }

        grammar
    }

    fn rules_from(&self, closure: &StateSet) -> Vec<Vec<GrammarSymbol>> {
        let mut rules = Vec::new();
        for p in closure.iter() {
            for &symbol in &self.alphabet {
                let Some(dests) = self.transitions.get(&(p, Label::Symbol(symbol))) else {
                    continue;
                };
                for r in dests.iter() {
                    rules.push(vec![
                        GrammarSymbol::Terminal(symbol),
                        GrammarSymbol::nonterminal(self.states.name(r)),
                    ]);
                    if self.epsilon_closure(r).intersects(&self.final_states) {
                        rules.push(vec![GrammarSymbol::Terminal(symbol)]);
                    }
                }
            }
        }
        rules
    }

    /// Check if the NFA accepts no strings (BFS from the start closure).
    pub fn is_empty(&self) -> bool {
        let mut visited = StateSet::with_capacity(self.states.len());
        let mut queue: VecDeque<StateId> = self
            .epsilon_closure_set(&self.start_states)
            .iter()
            .collect();

        while let Some(state) = queue.pop_front() {
            if !visited.insert(state) {
                continue;
            }
            if self.final_states.contains(state) {
                return false;
            }
            for &symbol in &self.alphabet {
                let reached = self.move_on_symbol(&StateSet::singleton(state, 1), symbol);
                queue.extend(reached.iter().filter(|&dest| !visited.contains(dest)));
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ChomskyType;

    /// The variant-5 automaton: Q = {q0..q3}, F = {q3}, nondeterministic on
    /// (q1, a).
    fn variant5() -> Nfa {
        Nfa::from_parts(
            &["q0", "q1", "q2", "q3"],
            b"ab",
            &[
                ("q0", Label::Symbol(b'a'), &["q1"]),
                ("q0", Label::Symbol(b'b'), &["q0"]),
                ("q1", Label::Symbol(b'a'), &["q2", "q3"]),
                ("q2", Label::Symbol(b'a'), &["q3"]),
                ("q2", Label::Symbol(b'b'), &["q0"]),
            ],
            &["q0"],
            &["q3"],
        )
    }

    #[test]
    fn test_epsilon_nfa_basic() {
        // 0 -a-> 1 -ε-> 2 (final)
        let mut nfa = Nfa::new();
        nfa.add_transition("0", b'a', "1");
        nfa.add_epsilon_transition("1", "2");
        nfa.add_start_state("0");
        nfa.add_final_state("2");

        assert_eq!(nfa.num_states(), 3);
        assert_eq!(nfa.alphabet().len(), 1);
        assert!(!nfa.is_empty());
        assert!(nfa.accept("a"));
        assert!(!nfa.accept(""));
        assert!(!nfa.accept("aa"));
    }

    #[test]
    fn test_epsilon_closure() {
        // 0 -ε-> 1 -ε-> 2, 2 -ε-> 0
        let mut nfa = Nfa::new();
        nfa.add_epsilon_transition("0", "1");
        nfa.add_epsilon_transition("1", "2");
        nfa.add_epsilon_transition("2", "0");
        nfa.add_state("3");

        let closure = nfa.epsilon_closure(nfa.state_id("1").unwrap());
        assert_eq!(closure.to_vec(), vec![0, 1, 2]);

        let lone = nfa.epsilon_closure(nfa.state_id("3").unwrap());
        assert_eq!(lone.to_vec(), vec![3]);

        let both: StateSet = [2, 3].into_iter().collect();
        assert_eq!(nfa.epsilon_closure_set(&both).len(), 4);
    }

    #[test]
    fn test_move_on_symbol() {
        // 0 -a-> 1, 0 -a-> 2, 1 -ε-> 3
        let mut nfa = Nfa::new();
        nfa.add_transition("0", b'a', "1");
        nfa.add_transition("0", b'a', "2");
        nfa.add_epsilon_transition("1", "3");

        let start = StateSet::singleton(0, 4);
        let reached = nfa.move_on_symbol(&start, b'a');
        assert_eq!(reached.to_vec(), vec![1, 2, 3]);
        assert!(nfa.move_on_symbol(&start, b'b').is_empty());

        let mut dests: Vec<_> = nfa.transitions_from("0", Label::Symbol(b'a')).collect();
        dests.sort_unstable();
        assert_eq!(dests, vec!["1", "2"]);
        assert_eq!(nfa.transitions_from("3", Label::Epsilon).count(), 0);
        assert_eq!(nfa.transitions_from("nope", Label::Epsilon).count(), 0);
    }

    #[test]
    fn test_accept_variant5() {
        let nfa = variant5();
        for word in ["aa", "aaa", "baa", "aabaa", "bbaaa"] {
            assert!(nfa.accept(word), "{word} should be accepted");
        }
        for word in ["", "a", "ab", "aab", "aaaa", "aac"] {
            assert!(!nfa.accept(word), "{word} should be rejected");
        }
    }

    #[test]
    fn test_is_dfa() {
        assert!(!variant5().is_dfa());

        let total = Nfa::from_parts(
            &["s", "t"],
            b"ab",
            &[
                ("s", Label::Symbol(b'a'), &["t"]),
                ("s", Label::Symbol(b'b'), &["s"]),
                ("t", Label::Symbol(b'a'), &["t"]),
                ("t", Label::Symbol(b'b'), &["s"]),
            ],
            &["s"],
            &["t"],
        );
        assert!(total.is_dfa());

        let mut with_epsilon = total.clone();
        with_epsilon.add_epsilon_transition("s", "t");
        assert!(!with_epsilon.is_dfa());

        let mut partial = total.clone();
        partial.add_state("u");
        assert!(!partial.is_dfa());
    }

    #[test]
    fn test_empty_nfa() {
        let mut nfa = Nfa::new();
        nfa.add_start_state("0");
        nfa.add_final_state("1");
        // No transitions - no path from 0 to 1
        assert!(nfa.is_empty());

        nfa.add_transition("0", b'a', "1");
        assert!(!nfa.is_empty());
    }

    #[test]
    fn test_to_grammar_variant5() {
        let nfa = variant5();
        let grammar = nfa.to_grammar();
        assert_eq!(grammar.start(), "q0");
        assert_eq!(grammar.classify(), ChomskyType::Regular);

        let rules: Vec<_> = grammar.rules_for("q1").collect();
        assert!(rules.contains(&[GrammarSymbol::Terminal(b'a')].as_slice()));
        assert!(rules.contains(&[GrammarSymbol::Terminal(b'a'), GrammarSymbol::nonterminal("q2")].as_slice()));

        let dfa = grammar.to_dfa().unwrap();
        for word in ["aa", "aaa", "baa", "aabaa", "", "a", "ab", "aaaa"] {
            assert_eq!(nfa.accept(word), dfa.accept(word), "word {word:?}");
        }
    }

    #[test]
    fn test_to_grammar_with_epsilon_and_two_starts() {
        // s1 -ε-> f (final), s2 -b-> f
        let mut nfa = Nfa::new();
        nfa.add_start_state("s1");
        nfa.add_start_state("s2");
        nfa.add_epsilon_transition("s1", "m");
        nfa.add_transition("m", b'a', "f");
        nfa.add_transition("s2", b'b', "f");
        nfa.add_final_state("f");

        let grammar = nfa.to_grammar();
        assert_eq!(grammar.start(), "S");
        let dfa = grammar.to_dfa().unwrap();
        for word in ["a", "b", "", "ab", "ba"] {
            assert_eq!(nfa.accept(word), dfa.accept(word), "word {word:?}");
        }
    }
}
