//! Formal languages and automata.
//!
//! - [`grammar`]: grammars, their text form, random derivation, Chomsky
//!   classification and conversion to automata.
//! - [`automaton`]: NFAs and DFAs over byte alphabets, subset construction,
//!   conversion back to right-linear grammars and random word generation.
//! - [`regex`]: Thompson's construction for a small regular expression
//!   language.
//! - [`cnf`]: Chomsky Normal Form for context-free grammars.
//!
//! ```
//! use lfa::regex::create_nfa_from_regex;
//!
//! let nfa = create_nfa_from_regex("(a|b)*abb").unwrap();
//! let dfa = nfa.to_dfa();
//! assert!(dfa.accept("babb"));
//! assert!(!dfa.accept("abab"));
//! ```

pub mod automaton;
pub mod cnf;
pub mod grammar;
pub mod regex;

pub use automaton::{Dfa, Nfa, subset_construction};
pub use cnf::CnfGrammar;
pub use grammar::{ChomskyType, Grammar, GrammarSymbol};
pub use regex::{RegexCompiler, create_nfa_from_regex};
