//! Determinization of [`Nfa`]s.

use crate::automaton::dfa::Dfa;
use crate::automaton::nfa::Nfa;
use crate::automaton::state::{StateId, StateSet};
use indexmap::IndexMap;
use log::trace;
use std::collections::VecDeque;

/// Each DFA state is the epsilon-closed set of NFA states it stands for and
/// is named by that set's canonical label (`{q0,q2}`). The start state is the
/// closure of the NFA start states, even when that set is empty.
pub fn subset_construction(nfa: &Nfa) -> Dfa {
    let table = nfa.state_table();

    // Sorted member ids -> DFA state id. Interning here means each subset's
    // label is built exactly once.
    let mut state_mapping: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut worklist: VecDeque<(StateSet, StateId)> = VecDeque::new();

    let initial_set = nfa.epsilon_closure_set(nfa.start_state_set());
    let mut dfa = Dfa::new(&table.canonical_label(&initial_set));
    state_mapping.insert(initial_set.to_vec(), 0);
    if initial_set.intersects(nfa.final_state_set()) {
        dfa.add_final_by_id(0);
    }
    worklist.push_back((initial_set, 0));

    for &symbol in nfa.alphabet() {
        dfa.add_symbol(symbol);
    }

    while let Some((current_set, current_dfa_state)) = worklist.pop_front() {
        trace!("processing {}", table.canonical_label(&current_set));

        for &symbol in nfa.alphabet() {
            let next_set = nfa.move_on_symbol(&current_set, symbol);
            if next_set.is_empty() {
                // the DFA stays partial here
                continue;
            }

            let next_vec = next_set.to_vec();
            let next_dfa_state = match state_mapping.get(&next_vec) {
                Some(&existing) => existing,
                None => {
                    let label = table.canonical_label(&next_set);
                    let new_state = dfa.add_state(&label);
                    trace!("new state {label}");
                    state_mapping.insert(next_vec, new_state);
                    if next_set.intersects(nfa.final_state_set()) {
                        dfa.add_final_by_id(new_state);
                    }
                    worklist.push_back((next_set, new_state));
                    new_state
                }
            };

            dfa.add_transition_by_id(current_dfa_state, symbol, next_dfa_state);
        }
    }

    dfa
}
