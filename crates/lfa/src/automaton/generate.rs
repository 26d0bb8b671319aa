//! Random word generation from an NFA.

use crate::automaton::nfa::Nfa;
use crate::automaton::state::StateId;
use crate::automaton::symbol::{Label, Symbol};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;

/// Why a random walk did not produce a word. None of these are fatal;
/// callers usually retry with another seed or a larger bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    /// The walk came back to a state with the same word length.
    Cycle,
    /// A non-final state without outgoing edges was reached.
    DeadEnd,
    /// Every move was exhausted, or the length bound cut them all off.
    NoValidWord,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Cycle => f.write_str("detected cycle in NFA"),
            GenerateError::DeadEnd => f.write_str("reached dead end"),
            GenerateError::NoValidWord => f.write_str("no valid word found"),
        }
    }
}

impl std::error::Error for GenerateError {}

impl Nfa {
    /// Generate a random accepted word of at most `max_len` symbols.
    ///
    /// The walk starts at a random start state, tries epsilon moves before
    /// symbol moves and, at a final state, stops with probability
    /// `len / max_len`. Each `(state, length)` pair is entered at most once,
    /// which bounds the recursion depth.
    pub fn generate_random_word<R: Rng + ?Sized>(
        &self,
        max_len: usize,
        rng: &mut R,
    ) -> Result<String, GenerateError> {
        let starts = self.start_state_set().to_vec();
        let Some(&start) = starts.choose(rng) else {
            return Err(GenerateError::NoValidWord);
        };

        let mut walk = Walk {
            nfa: self,
            max_len,
            visited: HashSet::new(),
            rng,
        };
        let word = walk.from_state(start, Vec::new())?;
        Ok(String::from_utf8_lossy(&word).into_owned())
    }
}

struct Walk<'a, R: ?Sized> {
    nfa: &'a Nfa,
    max_len: usize,
    visited: HashSet<(StateId, usize)>,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Walk<'_, R> {
    fn from_state(&mut self, state: StateId, word: Vec<Symbol>) -> Result<Vec<Symbol>, GenerateError> {
        if !self.visited.insert((state, word.len())) {
            return Err(GenerateError::Cycle);
        }

        let is_final = self.nfa.final_state_set().contains(state);
        if is_final && !word.is_empty() && self.should_stop(word.len()) {
            return Ok(word);
        }

        let edges = self.nfa.edges_from(state);
        if edges.is_empty() {
            return if is_final {
                Ok(word)
            } else {
                Err(GenerateError::DeadEnd)
            };
        }

        let (mut epsilon, mut consuming): (Vec<_>, Vec<_>) =
            edges.into_iter().partition(|(label, _)| label.is_epsilon());
        epsilon.shuffle(&mut *self.rng);
        consuming.shuffle(&mut *self.rng);

        let mut last_error = None;
        for (_, next) in epsilon {
            match self.from_state(next, word.clone()) {
                Ok(found) => return Ok(found),
                Err(err) => last_error = Some(err),
            }
        }

        if word.len() < self.max_len {
            for (label, next) in consuming {
                let Label::Symbol(symbol) = label else {
                    continue;
                };
                let mut longer = word.clone();
                longer.push(symbol);
                match self.from_state(next, longer) {
                    Ok(found) => return Ok(found),
                    Err(err) => last_error = Some(err),
                }
            }
        }

        if is_final {
            Ok(word)
        } else {
            Err(last_error.unwrap_or(GenerateError::NoValidWord))
        }
    }

    fn should_stop(&mut self, len: usize) -> bool {
        let probability = (len as f64 / self.max_len.max(1) as f64).min(1.0);
        self.rng.gen_bool(probability)
    }
}
