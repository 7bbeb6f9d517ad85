// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicitly excluded particle pairs.
//!
//! Pairs are keyed by particle tag so that they survive reordering. They are
//! removed from each row after the tree traversal; the row is compacted and
//! its count lowered accordingly.

use alloc::collections::BTreeSet;

/// Set of unordered tag pairs that must never appear in a neighbor row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exclusions {
    pairs: BTreeSet<(u32, u32)>,
}

impl Exclusions {
    /// No exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude the pair `(a, b)`. Returns `false` if it was already excluded.
    pub fn insert(&mut self, a: u32, b: u32) -> bool {
        self.pairs.insert(key(a, b))
    }

    /// Allow the pair `(a, b)` again. Returns `false` if it was not excluded.
    pub fn remove(&mut self, a: u32, b: u32) -> bool {
        self.pairs.remove(&key(a, b))
    }

    /// Whether `(a, b)` is excluded, in either order.
    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.pairs.contains(&key(a, b))
    }

    /// Number of excluded pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Drop every exclusion.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Compact `row` in place, keeping only neighbors not excluded from `tag`.
    ///
    /// `tag_of` maps a neighbor index to its tag. Returns the new length.
    pub fn filter_row(&self, tag: u32, row: &mut [u32], tag_of: impl Fn(u32) -> u32) -> usize {
        let mut kept = 0;
        for k in 0..row.len() {
            let j = row[k];
            if !self.contains(tag, tag_of(j)) {
                row[kept] = j;
                kept += 1;
            }
        }
        kept
    }
}

impl Extend<(u32, u32)> for Exclusions {
    fn extend<I: IntoIterator<Item = (u32, u32)>>(&mut self, iter: I) {
        self.pairs.extend(iter.into_iter().map(|(a, b)| key(a, b)));
    }
}

impl FromIterator<(u32, u32)> for Exclusions {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        let mut out = Self::new();
        out.extend(iter);
        out
    }
}

fn key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_unordered() {
        let mut ex = Exclusions::new();
        assert!(ex.insert(5, 2));
        assert!(!ex.insert(2, 5));
        assert!(ex.contains(2, 5) && ex.contains(5, 2));
        assert_eq!(ex.len(), 1);
        assert!(ex.remove(5, 2));
        assert!(ex.is_empty());
    }

    #[test]
    fn filter_compacts_and_keeps_order() {
        let ex: Exclusions = [(0, 3), (0, 7)].into_iter().collect();
        let mut row = [7, 1, 3, 9, 4];
        let kept = ex.filter_row(0, &mut row, |j| j);
        assert_eq!(kept, 3);
        assert_eq!(&row[..kept], &[1, 9, 4]);
    }

    #[test]
    fn filter_goes_through_tags() {
        // Particle index j carries tag 10 + j.
        let ex: Exclusions = [(10, 12)].into_iter().collect();
        let mut row = [1, 2];
        let kept = ex.filter_row(10, &mut row, |j| 10 + j);
        assert_eq!(&row[..kept], &[1]);
    }
}
