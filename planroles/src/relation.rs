//! Binary relations over interned objects.
use std::collections::BTreeSet;

use crate::universe::{Object, ObjectUniverse};

/// A finite set of ordered object pairs.
///
/// Pairs are kept sorted, which lets [`Relation::compose`] find the pairs
/// starting at a given object with a range query instead of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Relation(BTreeSet<(Object, Object)>);

/// Shared empty relation.
pub static EMPTY: Relation = Relation(BTreeSet::new());

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Object, to: Object) -> bool {
        self.0.insert((from, to))
    }

    pub fn contains(&self, from: Object, to: Object) -> bool {
        self.0.contains(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Object, Object)> + '_ {
        self.0.iter().copied()
    }

    /// Pairs present in both relations.
    pub fn intersect(&self, other: &Relation) -> Relation {
        Relation(self.0.intersection(&other.0).copied().collect())
    }

    pub fn union(&self, other: &Relation) -> Relation {
        Relation(self.0.union(&other.0).copied().collect())
    }

    /// `{ (x, z) | (x, y) in self, (y, z) in other }`.
    pub fn compose(&self, other: &Relation) -> Relation {
        let mut composed = BTreeSet::new();
        for &(x, y) in &self.0 {
            let successors = other.0.range((y, Object::MIN)..=(y, Object::MAX));
            composed.extend(successors.map(|&(_, z)| (x, z)));
        }
        Relation(composed)
    }

    /// Smallest superset closed under composition with itself.
    ///
    /// Pairs `(x, x)` only appear when `x` lies on a cycle of the relation.
    pub fn transitive_closure(&self) -> Relation {
        let mut closure = self.0.clone();
        let mut delta = self.clone();

        // Semi-naive: only pairs found in the previous round are extended.
        loop {
            let fresh: BTreeSet<_> = delta
                .compose(self)
                .0
                .into_iter()
                .filter(|pair| !closure.contains(pair))
                .collect();
            if fresh.is_empty() {
                break;
            }
            closure.extend(fresh.iter().copied());
            delta = Relation(fresh);
        }

        Relation(closure)
    }

    /// Render the pairs with object names, e.g. `{(a, b), (b, c)}`.
    pub fn display(&self, universe: &ObjectUniverse) -> String {
        let pairs: Vec<String> = self
            .iter()
            .map(|(x, y)| format!("({}, {})", universe.name(x), universe.name(y)))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

impl FromIterator<(Object, Object)> for Relation {
    fn from_iter<I: IntoIterator<Item = (Object, Object)>>(iter: I) -> Self {
        Relation(iter.into_iter().collect())
    }
}

impl Extend<(Object, Object)> for Relation {
    fn extend<I: IntoIterator<Item = (Object, Object)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
