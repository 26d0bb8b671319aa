//! State identifiers, state sets and the name table behind them.

use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use std::fmt;

/// Dense index into a [`StateTable`].
pub type StateId = u32;

/// Bit set of [`StateId`]s. Grows on demand, so the capacity passed at
/// construction is only a hint.
#[derive(Clone, Default)]
pub struct StateSet {
    bits: FixedBitSet,
}

impl StateSet {
    pub fn with_capacity(capacity: usize) -> Self {
        let bits = FixedBitSet::with_capacity(capacity);
        Self { bits }
    }

    pub fn singleton(state: StateId, capacity: usize) -> Self {
        let mut set = Self::with_capacity(capacity);
        set.insert(state);
        set
    }

    /// Returns `false` if `state` was already a member.
    pub fn insert(&mut self, state: StateId) -> bool {
        let bit = state as usize;
        if bit >= self.bits.len() {
            self.bits.grow(bit + 1);
        }
        !self.bits.put(bit)
    }

    pub fn contains(&self, state: StateId) -> bool {
        // FixedBitSet::contains is false past the end
        self.bits.contains(state as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.bits.ones().map(|bit| bit as StateId)
    }

    pub fn union_with(&mut self, other: &StateSet) {
        let needed = other.bits.len();
        if needed > self.bits.len() {
            self.bits.grow(needed);
        }
        self.bits.union_with(&other.bits);
    }

    pub fn intersects(&self, other: &StateSet) -> bool {
        !self.bits.is_disjoint(&other.bits)
    }

    /// Sorted member ids. Two sets are equal iff their vectors are equal,
    /// which makes this the key for interning subsets.
    pub fn to_vec(&self) -> Vec<StateId> {
        self.iter().collect()
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        // capacities may differ between equal sets
        self.iter().eq(other.iter())
    }
}

impl Eq for StateSet {}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        let mut set = Self::default();
        for state in iter {
            set.insert(state);
        }
        set
    }
}

/// Interns state names to dense [`StateId`]s, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    names: IndexSet<String>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `name`, adding it if it is new.
    pub fn intern(&mut self, name: &str) -> StateId {
        if let Some(idx) = self.names.get_index_of(name) {
            return idx as StateId;
        }
        let (idx, _) = self.names.insert_full(name.to_string());
        idx as StateId
    }

    pub fn id(&self, name: &str) -> Option<StateId> {
        self.names.get_index_of(name).map(|idx| idx as StateId)
    }

    /// The name of a state id handed out by this table.
    pub fn name(&self, id: StateId) -> &str {
        &self.names[id as usize]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as StateId, name.as_str()))
    }

    /// Canonical label of a state set: member names sorted, joined with `,`
    /// and wrapped in braces. Distinct sets always get distinct labels.
    pub fn canonical_label(&self, set: &StateSet) -> String {
        let mut members: Vec<&str> = set.iter().map(|id| self.name(id)).collect();
        members.sort_unstable();
        members.dedup();
        format!("{{{}}}", members.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_set_basic() {
        let mut set = StateSet::with_capacity(10);
        assert!(set.is_empty());

        assert!(set.insert(3));
        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 2);
        assert!(set.contains(3));
        assert!(set.contains(7));
        assert!(!set.contains(5));
        assert!(!set.contains(500));
    }

    #[test]
    fn test_state_set_union_grows() {
        let mut small = StateSet::with_capacity(2);
        small.insert(1);

        let big: StateSet = [40, 3].into_iter().collect();
        small.union_with(&big);
        assert_eq!(small.to_vec(), vec![1, 3, 40]);
        assert!(small.intersects(&big));
        assert!(!StateSet::singleton(2, 4).intersects(&big));
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let a = StateSet::singleton(5, 6);
        let b = StateSet::singleton(5, 600);
        assert_eq!(a, b);
        assert_ne!(a, StateSet::singleton(4, 6));
    }

    #[test]
    fn test_table_interning() {
        let mut table = StateTable::new();
        let q0 = table.intern("q0");
        let q1 = table.intern("q1");
        assert_eq!(table.intern("q0"), q0);
        assert_eq!(table.id("q1"), Some(q1));
        assert_eq!(table.id("q9"), None);
        assert_eq!(table.name(q1), "q1");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_canonical_label_sorts_by_name() {
        let mut table = StateTable::new();
        let b = table.intern("b");
        let a = table.intern("a");
        let c = table.intern("c");

        let forward: StateSet = [a, b, c].into_iter().collect();
        let backward: StateSet = [c, b, a].into_iter().collect();
        assert_eq!(table.canonical_label(&forward), "{a,b,c}");
        assert_eq!(table.canonical_label(&backward), "{a,b,c}");
        assert_eq!(table.canonical_label(&StateSet::default()), "{}");
    }
}
