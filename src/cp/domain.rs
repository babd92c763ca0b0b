//! Finite integer domains as sorted, disjoint, inclusive ranges.

use std::fmt;

/// A finite set of integers stored as sorted, disjoint, non-adjacent
/// inclusive ranges.
///
/// # Examples
///
/// ```
/// use u_liner::cp::Domain;
///
/// let mut d = Domain::range(0, 10);
/// d.remove_between(3, 5);
/// assert_eq!(d.ranges(), &[(0, 2), (6, 10)]);
/// assert_eq!(d.size(), 8);
/// assert!(!d.contains(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    ranges: Vec<(i64, i64)>,
}

impl Domain {
    /// The empty domain.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// All integers in `[lo, hi]`; empty when `lo > hi`.
    pub fn range(lo: i64, hi: i64) -> Self {
        if lo > hi {
            return Self::empty();
        }
        Self {
            ranges: vec![(lo, hi)],
        }
    }

    /// The single value `v`.
    pub fn singleton(v: i64) -> Self {
        Self::range(v, v)
    }

    /// The boolean domain `{0, 1}`.
    pub fn boolean() -> Self {
        Self::range(0, 1)
    }

    /// Builds a domain from arbitrary values (duplicates allowed).
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        let mut vals: Vec<i64> = values.into_iter().collect();
        vals.sort_unstable();
        vals.dedup();
        let mut ranges: Vec<(i64, i64)> = Vec::new();
        for v in vals {
            match ranges.last_mut() {
                Some(last) if last.1.checked_add(1) == Some(v) => last.1 = v,
                _ => ranges.push((v, v)),
            }
        }
        Self { ranges }
    }

    /// The underlying ranges.
    pub fn ranges(&self) -> &[(i64, i64)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Smallest value, if any.
    pub fn min(&self) -> Option<i64> {
        self.ranges.first().map(|r| r.0)
    }

    /// Largest value, if any.
    pub fn max(&self) -> Option<i64> {
        self.ranges.last().map(|r| r.1)
    }

    /// Number of values.
    pub fn size(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(lo, hi)| hi.abs_diff(lo).saturating_add(1))
            .fold(0u64, u64::saturating_add)
    }

    pub fn contains(&self, v: i64) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < v {
                    std::cmp::Ordering::Less
                } else if lo > v {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Iterates the values in increasing order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }

    /// Removes one value.
    pub fn remove(&mut self, v: i64) {
        self.remove_between(v, v);
    }

    /// Removes every value in `[lo, hi]`. No-op when `lo > hi`.
    pub fn remove_between(&mut self, lo: i64, hi: i64) {
        if lo > hi {
            return;
        }
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for &(a, b) in &self.ranges {
            if b < lo || a > hi {
                kept.push((a, b));
                continue;
            }
            if let Some(before) = lo.checked_sub(1).filter(|&l| a <= l) {
                kept.push((a, before));
            }
            if let Some(after) = hi.checked_add(1).filter(|&h| h <= b) {
                kept.push((after, b));
            }
        }
        self.ranges = kept;
    }

    /// Values present in both domains.
    pub fn intersect(&self, other: &Domain) -> Domain {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a1, b1) = self.ranges[i];
            let (a2, b2) = other.ranges[j];
            let lo = a1.max(a2);
            let hi = b1.min(b2);
            if lo <= hi {
                out.push((lo, hi));
            }
            if b1 < b2 {
                i += 1;
            } else {
                j += 1;
            }
        }
        Domain { ranges: out }
    }

    /// Values present in either domain.
    pub fn union(&self, other: &Domain) -> Domain {
        let mut all: Vec<(i64, i64)> = self
            .ranges
            .iter()
            .chain(other.ranges.iter())
            .copied()
            .collect();
        all.sort_unstable();
        let mut out: Vec<(i64, i64)> = Vec::with_capacity(all.len());
        for (lo, hi) in all {
            match out.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => out.push((lo, hi)),
            }
        }
        Domain { ranges: out }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, &(lo, hi)) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if lo == hi {
                write!(f, "{lo}")?;
            } else {
                write!(f, "{lo}..{hi}")?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_values_merges_adjacent() {
        let d = Domain::from_values([5, 1, 2, 3, 9, 2]);
        assert_eq!(d.ranges(), &[(1, 3), (5, 5), (9, 9)]);
        assert_eq!(d.size(), 5);
        assert_eq!(d.min(), Some(1));
        assert_eq!(d.max(), Some(9));
    }

    #[test]
    fn test_empty_range() {
        assert!(Domain::range(3, 2).is_empty());
        assert_eq!(Domain::empty().min(), None);
    }

    #[test]
    fn test_remove_splits_range() {
        let mut d = Domain::range(-1, 4);
        d.remove(-1);
        d.remove(2);
        assert_eq!(d.ranges(), &[(0, 1), (3, 4)]);
    }

    #[test]
    fn test_remove_between_inverted_is_noop() {
        let mut d = Domain::range(0, 5);
        d.remove_between(4, 2);
        assert_eq!(d, Domain::range(0, 5));
    }

    #[test]
    fn test_intersect_and_union() {
        let a = Domain::from_values([0, 1, 2, 7, 8]);
        let b = Domain::range(2, 7);
        assert_eq!(a.intersect(&b).values().collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(a.union(&b), Domain::range(0, 8));
    }

    #[test]
    fn test_extreme_bounds() {
        let d = Domain::from_values([i64::MAX, i64::MIN, i64::MAX - 1]);
        assert_eq!(d.ranges(), &[(i64::MIN, i64::MIN), (i64::MAX - 1, i64::MAX)]);

        let mut d = Domain::range(i64::MIN, i64::MAX);
        d.remove_between(i64::MIN, 0);
        assert_eq!(d.ranges(), &[(1, i64::MAX)]);
        d.remove(i64::MAX);
        assert_eq!(d.ranges(), &[(1, i64::MAX - 1)]);

        let mut d = Domain::range(i64::MIN, 5);
        d.remove_between(-3, i64::MAX);
        assert_eq!(d.ranges(), &[(i64::MIN, -4)]);
        assert_eq!(Domain::range(i64::MIN, i64::MAX).size(), u64::MAX);
    }

    #[test]
    fn test_display() {
        let d = Domain::from_values([-1, 3, 4, 5]);
        assert_eq!(d.to_string(), "{-1,3..5}");
    }

    proptest! {
        #[test]
        fn prop_contains_matches_values(vals in prop::collection::vec(-20i64..20, 0..15), x in -25i64..25) {
            let d = Domain::from_values(vals.iter().copied());
            prop_assert_eq!(d.contains(x), vals.contains(&x));
            prop_assert_eq!(d.size() as usize, d.values().count());
        }

        #[test]
        fn prop_remove_between_removes_exactly(vals in prop::collection::vec(-20i64..20, 0..15), lo in -25i64..25, hi in -25i64..25) {
            let mut d = Domain::from_values(vals.iter().copied());
            d.remove_between(lo, hi);
            for v in -25..25 {
                let expected = vals.contains(&v) && !(lo <= v && v <= hi);
                prop_assert_eq!(d.contains(v), expected);
            }
        }
    }
}
