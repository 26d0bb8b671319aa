//! Chomsky Normal Form.
//!
//! [`CnfGrammar`] keeps productions as full symbol sequences over named
//! symbols and rewrites them in place. [`CnfGrammar::normalize`] runs the
//! five stages in the only order that is safe:
//!
//! 1. [`eliminate_epsilon`](CnfGrammar::eliminate_epsilon)
//! 2. [`eliminate_renaming`](CnfGrammar::eliminate_renaming)
//! 3. [`eliminate_inaccessible_symbols`](CnfGrammar::eliminate_inaccessible_symbols)
//! 4. [`eliminate_non_productive_symbols`](CnfGrammar::eliminate_non_productive_symbols)
//! 5. [`convert_to_cnf`](CnfGrammar::convert_to_cnf)
//!
//! Afterwards every production is `A -> a` or `A -> B C`, plus possibly
//! `S -> ε` for the start symbol.

use crate::grammar::fresh_name;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use std::collections::VecDeque;
use std::fmt;

type Rhs = Vec<String>;

#[derive(Debug, Clone)]
pub struct CnfGrammar {
    start: String,
    epsilon: String,
    nonterminals: IndexSet<String>,
    terminals: IndexSet<String>,
    productions: IndexMap<String, Vec<Rhs>>,
    /// Next suffix tried for binarization nonterminals.
    counter: usize,
}

impl CnfGrammar {
    /// `epsilon` is the marker that spells the empty word in right-hand
    /// sides passed to [`add_production`](Self::add_production). The start
    /// symbol is always a nonterminal.
    pub fn new(start: &str, epsilon: &str, nonterminals: &[&str], terminals: &[&str]) -> Self {
        let mut declared: IndexSet<String> = IndexSet::new();
        declared.insert(start.to_string());
        declared.extend(nonterminals.iter().map(|name| name.to_string()));

        Self {
            start: start.to_string(),
            epsilon: epsilon.to_string(),
            nonterminals: declared,
            terminals: terminals.iter().map(|name| name.to_string()).collect(),
            productions: IndexMap::new(),
            counter: 0,
        }
    }

    fn strip_epsilon(&self, rhs: &[&str]) -> Rhs {
        rhs.iter()
            .filter(|symbol| **symbol != self.epsilon)
            .map(|symbol| symbol.to_string())
            .collect()
    }

    /// Add `lhs -> rhs` unless present. `lhs` becomes a nonterminal; epsilon
    /// markers in `rhs` are dropped, so `[ε]` and `[]` are the same rule.
    pub fn add_production(&mut self, lhs: &str, rhs: &[&str]) {
        let rhs = self.strip_epsilon(rhs);
        self.nonterminals.insert(lhs.to_string());
        push_unique(&mut self.productions, lhs, rhs);
    }

    pub fn has_production(&self, lhs: &str, rhs: &[&str]) -> bool {
        let rhs = self.strip_epsilon(rhs);
        self.productions
            .get(lhs)
            .is_some_and(|rules| rules.contains(&rhs))
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn epsilon(&self) -> &str {
        &self.epsilon
    }

    pub fn nonterminals(&self) -> &IndexSet<String> {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &IndexSet<String> {
        &self.terminals
    }

    /// Right-hand sides of `lhs`; an epsilon production is an empty slice.
    pub fn rules_for(&self, lhs: &str) -> &[Rhs] {
        self.productions.get(lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn productions(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.productions
            .iter()
            .flat_map(|(lhs, rules)| rules.iter().map(move |rhs| (lhs.as_str(), rhs.as_slice())))
    }

    pub fn num_productions(&self) -> usize {
        self.productions.values().map(Vec::len).sum()
    }

    fn is_nonterminal(&self, symbol: &str) -> bool {
        self.nonterminals.contains(symbol)
    }

    fn is_unit(&self, rhs: &[String]) -> bool {
        matches!(rhs, [only] if self.is_nonterminal(only))
    }

    /// Nonterminals that derive the empty word.
    fn nullable(&self) -> IndexSet<String> {
        let mut nullable: IndexSet<String> = IndexSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rules) in &self.productions {
                if nullable.contains(lhs) {
                    continue;
                }
                let derives_empty = rules.iter().any(|rhs| {
                    rhs.iter()
                        .all(|symbol| !self.terminals.contains(symbol) && nullable.contains(symbol))
                });
                if derives_empty {
                    nullable.insert(lhs.clone());
                    changed = true;
                }
            }
        }
        nullable
    }

    /// Remove every epsilon production. Each rule is replaced by all its
    /// variants with nullable symbols present or absent; `start -> ε` is kept
    /// iff the start symbol is nullable.
    pub fn eliminate_epsilon(&mut self) {
        let nullable = self.nullable();

        let mut productions = IndexMap::new();
        for (lhs, rules) in &self.productions {
            for rhs in rules.iter().filter(|rhs| !rhs.is_empty()) {
                for variant in expand_nullable(rhs, &nullable) {
                    if !variant.is_empty() {
                        push_unique(&mut productions, lhs, variant);
                    }
                }
            }
        }
        if nullable.contains(&self.start) {
            push_unique(&mut productions, &self.start, Vec::new());
        }

        self.productions = productions;
        debug!(
            "eliminated epsilon productions: {} nullable, {} productions",
            nullable.len(),
            self.num_productions()
        );
    }

    /// Nonterminals reachable from `from` through unit productions,
    /// including `from` itself.
    fn unit_closure(&self, from: &str) -> IndexSet<String> {
        let mut closure: IndexSet<String> = IndexSet::new();
        closure.insert(from.to_string());
        let mut queue = VecDeque::from([from.to_string()]);

        while let Some(current) = queue.pop_front() {
            for rhs in self.rules_for(&current) {
                if self.is_unit(rhs) && closure.insert(rhs[0].clone()) {
                    queue.push_back(rhs[0].clone());
                }
            }
        }
        closure
    }

    /// Remove unit productions `A -> B` by copying the non-unit productions
    /// of everything `A` renames to into `A`.
    pub fn eliminate_renaming(&mut self) {
        let mut productions = IndexMap::new();
        for lhs in &self.nonterminals {
            for renamed in self.unit_closure(lhs) {
                for rhs in self.rules_for(&renamed) {
                    if self.is_unit(rhs) {
                        continue;
                    }
                    // only the start symbol may keep the empty word
                    if rhs.is_empty() && *lhs != self.start {
                        continue;
                    }
                    push_unique(&mut productions, lhs, rhs.clone());
                }
            }
        }

        self.productions = productions;
        debug!("eliminated unit productions: {} productions", self.num_productions());
    }

    /// Drop nonterminals that cannot be reached from the start symbol.
    pub fn eliminate_inaccessible_symbols(&mut self) {
        let mut accessible: IndexSet<String> = IndexSet::new();
        accessible.insert(self.start.clone());
        let mut queue = VecDeque::from([self.start.clone()]);

        while let Some(current) = queue.pop_front() {
            for rhs in self.rules_for(&current) {
                for symbol in rhs {
                    if self.is_nonterminal(symbol) && accessible.insert(symbol.clone()) {
                        queue.push_back(symbol.clone());
                    }
                }
            }
        }

        let removed = self.nonterminals.len() - accessible.len();
        self.productions.retain(|lhs, _| accessible.contains(lhs));
        self.nonterminals.retain(|name| accessible.contains(name));
        debug!("eliminated {removed} inaccessible nonterminals");
    }

    /// Drop nonterminals that derive no terminal word, and every production
    /// that mentions a non-productive or undeclared symbol. The start symbol
    /// stays declared.
    pub fn eliminate_non_productive_symbols(&mut self) {
        let mut productive: IndexSet<String> = self.terminals.iter().cloned().collect();
        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rules) in &self.productions {
                if productive.contains(lhs) {
                    continue;
                }
                if rules
                    .iter()
                    .any(|rhs| rhs.iter().all(|symbol| productive.contains(symbol)))
                {
                    productive.insert(lhs.clone());
                    changed = true;
                }
            }
        }

        let before = self.nonterminals.len();
        self.productions.retain(|lhs, rules| {
            rules.retain(|rhs| rhs.iter().all(|symbol| productive.contains(symbol)));
            productive.contains(lhs) && !rules.is_empty()
        });
        let start = &self.start;
        self.nonterminals
            .retain(|name| name == start || productive.contains(name));
        debug!(
            "eliminated {} non-productive nonterminals",
            before - self.nonterminals.len()
        );
    }

    fn fresh_wrapper(&self, terminal: &str) -> String {
        fresh_name(&format!("T_{terminal}"), |name| {
            self.nonterminals.contains(name) || self.terminals.contains(name)
        })
    }

    fn fresh_binary(&mut self) -> String {
        loop {
            let name = format!("X{}", self.counter);
            self.counter += 1;
            if !self.nonterminals.contains(&name) && !self.terminals.contains(&name) {
                self.nonterminals.insert(name.clone());
                return name;
            }
        }
    }

    /// Replace terminals inside right-hand sides longer than one symbol by
    /// wrapper nonterminals `T_a -> a`, then split every right-hand side
    /// longer than two symbols into a chain of fresh `X0`, `X1`, ...
    pub fn convert_to_cnf(&mut self) {
        let mut wrappers: IndexMap<String, String> = IndexMap::new();
        for rhs in self.productions.values().flatten().filter(|rhs| rhs.len() > 1) {
            for symbol in rhs {
                if self.terminals.contains(symbol) && !wrappers.contains_key(symbol) {
                    let wrapper = self.fresh_wrapper(symbol);
                    self.nonterminals.insert(wrapper.clone());
                    wrappers.insert(symbol.clone(), wrapper);
                }
            }
        }

        let old = std::mem::take(&mut self.productions);
        let mut productions = IndexMap::new();
        for (lhs, rules) in old {
            for rhs in rules {
                if rhs.len() <= 1 {
                    push_unique(&mut productions, &lhs, rhs);
                    continue;
                }

                let mut rhs: Rhs = rhs
                    .into_iter()
                    .map(|symbol| wrappers.get(&symbol).cloned().unwrap_or(symbol))
                    .collect();
                let mut current = lhs.clone();
                while rhs.len() > 2 {
                    let rest = self.fresh_binary();
                    let head = rhs.remove(0);
                    push_unique(&mut productions, &current, vec![head, rest.clone()]);
                    current = rest;
                }
                push_unique(&mut productions, &current, rhs);
            }
        }
        for (terminal, wrapper) in wrappers {
            push_unique(&mut productions, &wrapper, vec![terminal]);
        }

        self.productions = productions;
        debug!(
            "converted to CNF: {} nonterminals, {} productions",
            self.nonterminals.len(),
            self.num_productions()
        );
    }

    pub fn normalize(&mut self) {
        self.eliminate_epsilon();
        self.eliminate_renaming();
        self.eliminate_inaccessible_symbols();
        self.eliminate_non_productive_symbols();
        self.convert_to_cnf();
    }

    /// Every production is `A -> a`, `A -> B C` or `start -> ε`.
    pub fn is_in_cnf(&self) -> bool {
        self.productions().all(|(lhs, rhs)| match rhs {
            [] => lhs == self.start,
            [terminal] => self.terminals.contains(terminal),
            [left, right] => self.is_nonterminal(left) && self.is_nonterminal(right),
            _ => false,
        })
    }
}

fn push_unique(productions: &mut IndexMap<String, Vec<Rhs>>, lhs: &str, rhs: Rhs) {
    let rules = productions.entry(lhs.to_string()).or_default();
    if !rules.contains(&rhs) {
        rules.push(rhs);
    }
}

/// Every variant of `rhs` with each nullable symbol kept or dropped.
fn expand_nullable(rhs: &[String], nullable: &IndexSet<String>) -> Vec<Rhs> {
    let mut variants: Vec<Rhs> = vec![Vec::new()];
    for symbol in rhs {
        let optional = nullable.contains(symbol);
        let mut next = Vec::with_capacity(variants.len() * 2);
        for variant in variants {
            let mut with = variant.clone();
            with.push(symbol.clone());
            next.push(with);
            if optional {
                next.push(variant);
            }
        }
        variants = next;
    }
    variants
}

impl fmt::Display for CnfGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (lhs, rules) in &self.productions {
            write!(f, "{lhs} ->")?;
            for (idx, rhs) in rules.iter().enumerate() {
                if idx > 0 {
                    f.write_str(" |")?;
                }
                if rhs.is_empty() {
                    write!(f, " {}", self.epsilon)?;
                }
                for symbol in rhs {
                    write!(f, " {symbol}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
