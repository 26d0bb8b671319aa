//! Random derivation of words from right-linear grammars.

use super::{Grammar, GrammarSymbol, Production, split_right_linear};
use log::trace;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;

/// Upper bound on rule applications in a single derivation.
pub const MAX_DERIVATION_STEPS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    /// A chosen rule was not `A → w` or `A → w B`.
    NotRightLinear(String),
    /// The derivation reached a nonterminal without rules.
    NoRules(String),
    StepLimit,
    /// `derive_unique` drew only known words.
    Exhausted { attempts: usize },
}

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeriveError::NotRightLinear(production) => {
                write!(f, "production `{production}` is not right-linear")
            }
            DeriveError::NoRules(nonterminal) => write!(f, "no rules for nonterminal {nonterminal}"),
            DeriveError::StepLimit => {
                write!(f, "derivation exceeded {MAX_DERIVATION_STEPS} steps")
            }
            DeriveError::Exhausted { attempts } => {
                write!(f, "no new word after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for DeriveError {}

impl Grammar {
    /// Derive one word: from the start symbol pick a uniformly random rule,
    /// emit its terminals and continue with its trailing nonterminal until a
    /// rule without one is chosen.
    pub fn derive<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, DeriveError> {
        let mut word = Vec::new();
        let mut current = self.start.as_str();

        for _ in 0..MAX_DERIVATION_STEPS {
            let rules: Vec<_> = self.rules_for(current).collect();
            let Some(&rhs) = rules.choose(rng) else {
                return Err(DeriveError::NoRules(current.to_string()));
            };
            let Some((terminals, next)) = split_right_linear(rhs) else {
                let production = Production {
                    lhs: vec![GrammarSymbol::nonterminal(current)],
                    rhs: rhs.to_vec(),
                };
                return Err(DeriveError::NotRightLinear(production.to_string()));
            };

            word.extend(terminals);
            match next {
                Some(next) => current = next,
                None => {
                    let word = String::from_utf8_lossy(&word).into_owned();
                    trace!("derived {word:?}");
                    return Ok(word);
                }
            }
        }

        Err(DeriveError::StepLimit)
    }

    /// Derive a word that is not in `seen` and record it there. Gives up
    /// after `max_attempts` draws, so finite languages cannot loop forever.
    pub fn derive_unique<R: Rng + ?Sized>(
        &self,
        seen: &mut HashSet<String>,
        max_attempts: usize,
        rng: &mut R,
    ) -> Result<String, DeriveError> {
        for _ in 0..max_attempts {
            let word = self.derive(rng)?;
            if seen.insert(word.clone()) {
                return Ok(word);
            }
        }
        Err(DeriveError::Exhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn variant5() -> Grammar {
        Grammar::parse(
            "S -> bS | aF | d
             F -> cF | dF | aL | b
             L -> aL | c",
        )
        .unwrap()
    }

    #[test]
    fn test_derived_words_are_in_the_language() {
        let grammar = variant5();
        let dfa = grammar.to_dfa().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let word = grammar.derive(&mut rng).unwrap();
            assert!(dfa.accept(&word), "{word} derived but rejected");
        }
    }

    #[test]
    fn test_unique_words() {
        let grammar = variant5();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = HashSet::new();
        let words: Vec<_> = (0..100)
            .map(|_| grammar.derive_unique(&mut seen, 10_000, &mut rng).unwrap())
            .collect();

        let distinct: HashSet<_> = words.iter().collect();
        assert_eq!(distinct.len(), 100);
        assert_eq!(seen.len(), 100);
        for word in ["baas", "addc", "bacbbda"] {
            assert!(!seen.contains(word));
        }
    }

    #[test]
    fn test_finite_language_is_exhausted() {
        let grammar = Grammar::parse("S -> a | b").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = HashSet::new();
        grammar.derive_unique(&mut seen, 100, &mut rng).unwrap();
        grammar.derive_unique(&mut seen, 100, &mut rng).unwrap();
        assert_eq!(
            grammar.derive_unique(&mut seen, 100, &mut rng),
            Err(DeriveError::Exhausted { attempts: 100 })
        );
    }

    #[test]
    fn test_derive_failures() {
        let mut rng = StdRng::seed_from_u64(0);

        let no_rules = Grammar::parse("S -> aA").unwrap();
        assert_eq!(no_rules.derive(&mut rng), Err(DeriveError::NoRules("A".to_string())));

        let nested = Grammar::parse("S -> aSb").unwrap();
        assert_eq!(
            nested.derive(&mut rng),
            Err(DeriveError::NotRightLinear("S → aSb".to_string()))
        );

        let endless = Grammar::parse("S -> aS").unwrap();
        assert_eq!(endless.derive(&mut rng), Err(DeriveError::StepLimit));
    }
}
