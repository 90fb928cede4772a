//! Overlap scoring between genre groups.
//!
//! The score answers "is one of these groups basically a subset of the
//! other?". For member lists A and B, the longer list is the super group
//! (ties go to A) and the other the sub group. `duplicates` counts sub group
//! entries that also appear in the super group. Each side's cover is
//! `duplicates / (len - duplicates)`: how large the shared portion is
//! compared to what that side has on its own.

use rustc_hash::FxHashSet;

/// Cover ratios of a pair of groups, labeled by position.
///
/// A higher cover means that group is closer to being a subgroup of the
/// other. Covers are unbounded above; a side with nothing outside the shared
/// portion reports `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapScore {
    pub first_in_second: f64,
    pub second_in_first: f64,
}

impl OverlapScore {
    pub fn max(&self) -> f64 {
        self.first_in_second.max(self.second_in_first)
    }

    /// Pair is similar enough to merge
    pub fn qualifies(&self, threshold: f64) -> bool {
        self.max() > threshold
    }

    /// One side is entirely contained in the shared portion.
    pub fn is_total(&self) -> bool {
        self.first_in_second.is_infinite() || self.second_in_first.is_infinite()
    }

    /// Whether the second group should be folded into the first.
    /// Ties keep the first group.
    pub fn second_is_subgroup(&self) -> bool {
        self.second_in_first >= self.first_in_second
    }

    pub fn swapped(&self) -> Self {
        Self {
            first_in_second: self.second_in_first,
            second_in_first: self.first_in_second,
        }
    }
}

/// Cover of one side. A zero denominator means the side has no members
/// outside the shared portion: total containment when anything is shared,
/// no overlap at all when the lists are empty.
fn cover(duplicates: usize, uniques: usize) -> f64 {
    if uniques == 0 {
        if duplicates > 0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        duplicates as f64 / uniques as f64
    }
}

/// Compute the overlap score of two member lists.
///
/// e.g. `[1,2,3,4,5]` vs `[8,9,1]`: one duplicate, covers 1/4 and 1/2, so
/// the second list is the one closer to being a subgroup.
pub fn overlap_score<S: AsRef<str>>(first: &[S], second: &[S]) -> OverlapScore {
    let first_is_super = first.len() >= second.len();
    let (super_group, sub_group) = if first_is_super {
        (first, second)
    } else {
        (second, first)
    };

    let super_members: FxHashSet<&str> = super_group.iter().map(|m| m.as_ref()).collect();
    // Membership test, not frequency-weighted
    let duplicates = sub_group
        .iter()
        .map(|m| -> &str { m.as_ref() })
        .filter(|m| super_members.contains(m))
        .count();

    let cover_super = cover(duplicates, super_group.len() - duplicates);
    let cover_sub = cover(duplicates, sub_group.len() - duplicates);

    if first_is_super {
        OverlapScore {
            first_in_second: cover_super,
            second_in_first: cover_sub,
        }
    } else {
        OverlapScore {
            first_in_second: cover_sub,
            second_in_first: cover_super,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_overlap() {
        let score = overlap_score(&["1", "2", "3", "4", "5"], &["8", "9", "1"]);
        assert_eq!(score.first_in_second, 0.25);
        assert_eq!(score.second_in_first, 0.5);
        assert!(score.second_is_subgroup());
        assert!(!score.qualifies(0.9));
    }

    #[test]
    fn test_symmetry() {
        let a = ["A", "B", "C", "D", "E", "F"];
        let b = ["A", "B", "C", "X"];
        let ab = overlap_score(&a, &b);
        let ba = overlap_score(&b, &a);
        assert_eq!(ab, ba.swapped());

        // Equal lengths take the tie path
        let c = ["A", "B", "Y", "Z"];
        assert_eq!(overlap_score(&b, &c), overlap_score(&c, &b).swapped());
    }

    #[test]
    fn test_no_overlap() {
        let score = overlap_score(&["A", "B"], &["C"]);
        assert_eq!(score.max(), 0.0);
        assert!(!score.is_total());
    }

    #[test]
    fn test_subset_is_total_on_sub_side() {
        let score = overlap_score(&["A", "B"], &["A", "B", "C", "D"]);
        assert!(score.first_in_second.is_infinite());
        assert_eq!(score.second_in_first, 1.0);
        assert!(score.is_total());
        assert!(score.qualifies(0.9));
        assert!(!score.second_is_subgroup());
    }

    #[test]
    fn test_identical_groups_keep_first() {
        let score = overlap_score(&["A", "B"], &["B", "A"]);
        assert!(score.first_in_second.is_infinite());
        assert!(score.second_in_first.is_infinite());
        assert!(score.second_is_subgroup());
    }

    #[test]
    fn test_empty_lists_never_qualify() {
        let empty: [&str; 0] = [];
        let score = overlap_score(&empty, &empty);
        assert_eq!(score.max(), 0.0);
        assert!(!score.qualifies(0.0));
        let score = overlap_score(&["A"], &empty);
        assert_eq!(score.max(), 0.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // 9 shared, 10 unique on the sub side → exactly 0.9
        let shared: Vec<String> = (0..9).map(|i| format!("s{}", i)).collect();
        let mut first = shared.clone();
        first.extend((0..10).map(|i| format!("a{}", i)));
        let mut second = shared;
        second.extend((0..20).map(|i| format!("b{}", i)));
        let score = overlap_score(&first, &second);
        assert!((score.first_in_second - 0.9).abs() < 1e-12);
        assert!(!score.qualifies(0.9));
        assert!(score.qualifies(0.89));
    }
}
