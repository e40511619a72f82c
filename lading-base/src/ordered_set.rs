use crate::hashing::HashSet;
use std::hash::Hash;

/// A set that remembers insertion order. Iteration yields values in the order they were first
/// inserted, which keeps dependency processing deterministic.
#[derive(Clone)]
pub struct OrderedSet<T: Eq + Hash + Clone> {
    vec: Vec<T>,
    // lookup only, the vec owns the order
    set: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        OrderedSet {
            vec: Vec::default(),
            set: HashSet::default(),
        }
    }
}

impl<'a, T: Eq + Hash + Clone> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: std::fmt::Debug + Eq + Hash + Clone> std::fmt::Debug for OrderedSet<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_list().entries(self.vec.iter()).finish()
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.vec.iter()
    }

    pub fn contains(
        &self,
        value: &T,
    ) -> bool {
        self.set.contains(value)
    }

    // Returns false if the value was already present
    pub fn try_insert_at_end(
        &mut self,
        value: T,
    ) -> bool {
        let is_newly_inserted = self.set.insert(value.clone());
        if is_newly_inserted {
            self.vec.push(value);
        }

        is_newly_inserted
    }

    pub fn remove(
        &mut self,
        value: &T,
    ) -> bool {
        let removed = self.set.remove(value);
        if removed {
            self.vec.retain(|x| x != value);
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.vec.clone()
    }
}
