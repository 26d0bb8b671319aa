//! Thompson's construction over owned NFA fragments.
//!
//! Every combinator takes its operands by value, so a fragment can be spliced
//! into at most one larger fragment. Reusing a sub-automaton (exact
//! repetition) goes through [`Thompson::duplicate`], which renames every
//! state.

use crate::automaton::{Label, Nfa, Symbol};
use std::collections::HashMap;

type FragmentState = u32;

/// A partial automaton with its own entry and exit states.
#[derive(Debug)]
pub(crate) struct Fragment {
    states: Vec<FragmentState>,
    edges: Vec<(FragmentState, Label, FragmentState)>,
    starts: Vec<FragmentState>,
    accepts: Vec<FragmentState>,
}

impl Fragment {
    pub(crate) fn num_states(&self) -> usize {
        self.states.len()
    }

    fn link_all(&mut self, from: &[FragmentState], to: &[FragmentState]) {
        for &source in from {
            for &destination in to {
                self.edges.push((source, Label::Epsilon, destination));
            }
        }
    }

    fn absorb(&mut self, other: Fragment) {
        self.states.extend(other.states);
        self.edges.extend(other.edges);
    }

    /// Name every state `{prefix}{n}` and build the final automaton.
    pub(crate) fn into_nfa(self, prefix: &str) -> Nfa {
        let name = |state: FragmentState| format!("{prefix}{state}");
        let mut nfa = Nfa::new();

        let mut states = self.states;
        states.sort_unstable();
        for state in states {
            nfa.add_state(&name(state));
        }
        for (source, label, destination) in self.edges {
            nfa.add_transition(&name(source), label, &name(destination));
        }
        for state in self.starts {
            nfa.add_start_state(&name(state));
        }
        for state in self.accepts {
            nfa.add_final_state(&name(state));
        }
        nfa
    }
}

/// Mints collision-free states for one compilation.
#[derive(Debug, Default)]
pub(crate) struct Thompson {
    next_state: FragmentState,
}

impl Thompson {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self) -> FragmentState {
        let state = self.next_state;
        self.next_state += 1;
        state
    }

    /// Fresh start/accept pair with no edges yet.
    fn pair(&mut self) -> (FragmentState, FragmentState, Fragment) {
        let start = self.fresh();
        let accept = self.fresh();
        let fragment = Fragment {
            states: vec![start, accept],
            edges: Vec::new(),
            starts: vec![start],
            accepts: vec![accept],
        };
        (start, accept, fragment)
    }

    /// Accepts exactly the empty word.
    pub(crate) fn empty(&mut self) -> Fragment {
        let state = self.fresh();
        Fragment {
            states: vec![state],
            edges: Vec::new(),
            starts: vec![state],
            accepts: vec![state],
        }
    }

    pub(crate) fn literal(&mut self, symbol: Symbol) -> Fragment {
        self.wildcard(&[symbol])
    }

    /// One edge per symbol between a single start and accept state.
    pub(crate) fn wildcard(&mut self, alphabet: &[Symbol]) -> Fragment {
        let (start, accept, mut fragment) = self.pair();
        for &symbol in alphabet {
            fragment.edges.push((start, Label::Symbol(symbol), accept));
        }
        fragment
    }

    pub(crate) fn concatenate(&mut self, mut left: Fragment, right: Fragment) -> Fragment {
        let accepts = std::mem::take(&mut left.accepts);
        left.link_all(&accepts, &right.starts);
        left.accepts = right.accepts.clone();
        left.absorb(right);
        left
    }

    pub(crate) fn union(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let (start, accept, mut fragment) = self.pair();
        for operand in [left, right] {
            fragment.link_all(&[start], &operand.starts);
            fragment.link_all(&operand.accepts, &[accept]);
            fragment.absorb(operand);
        }
        fragment
    }

    /// Zero or more: bypass plus back-edge.
    pub(crate) fn star(&mut self, inner: Fragment) -> Fragment {
        let mut fragment = self.plus(inner);
        let (start, accept) = (fragment.starts[0], fragment.accepts[0]);
        fragment.edges.push((start, Label::Epsilon, accept));
        fragment
    }

    /// One or more: back-edge from every inner accept to every inner start.
    pub(crate) fn plus(&mut self, inner: Fragment) -> Fragment {
        let (start, accept, mut fragment) = self.pair();
        fragment.link_all(&[start], &inner.starts);
        fragment.link_all(&inner.accepts, &[accept]);
        fragment.link_all(&inner.accepts, &inner.starts);
        fragment.absorb(inner);
        fragment
    }

    /// Zero or one: bypass only.
    pub(crate) fn question(&mut self, inner: Fragment) -> Fragment {
        let (start, accept, mut fragment) = self.pair();
        fragment.link_all(&[start], &inner.starts);
        fragment.link_all(&inner.accepts, &[accept]);
        fragment.edges.push((start, Label::Epsilon, accept));
        fragment.absorb(inner);
        fragment
    }

    /// Exactly `count` chained copies; zero copies accept only the empty word.
    pub(crate) fn repeat(&mut self, inner: Fragment, count: usize) -> Fragment {
        if count == 0 {
            return self.empty();
        }
        let copies: Vec<Fragment> = (1..count).map(|_| self.duplicate(&inner)).collect();
        copies
            .into_iter()
            .fold(inner, |chain, copy| self.concatenate(chain, copy))
    }

    /// Deep copy of `fragment` where every state gets a fresh name.
    pub(crate) fn duplicate(&mut self, fragment: &Fragment) -> Fragment {
        let renamed: HashMap<FragmentState, FragmentState> = fragment
            .states
            .iter()
            .map(|&state| (state, self.fresh()))
            .collect();
        let rename = |state: &FragmentState| renamed[state];

        Fragment {
            states: fragment.states.iter().map(rename).collect(),
            edges: fragment
                .edges
                .iter()
                .map(|(source, label, destination)| (rename(source), *label, rename(destination)))
                .collect(),
            starts: fragment.starts.iter().map(rename).collect(),
            accepts: fragment.accepts.iter().map(rename).collect(),
        }
    }
}
