//! Group merging: explicit custom rules and overlap-based similarity merges.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{MergeRule, MergeStrategy};
use crate::models::{is_reserved, Anomaly, GenreIndex, CATEGORY_MISSING};
use crate::scoring::{overlap_score, OverlapScore};

// ============================================================================
// Custom Rules
// ============================================================================

/// Fold configured subgenres into their target genre. Subgenres absent from
/// the index are ignored; the target is created on first use.
/// Returns the number of subgenres merged.
pub fn apply_custom_rules(index: &mut GenreIndex, rules: &[MergeRule]) -> usize {
    let mut merged = 0;
    for rule in rules {
        if is_reserved(&rule.genre) {
            warn!("Skipping custom rule into reserved group '{}'", rule.genre);
            continue;
        }
        for subgenre in &rule.subgenres {
            if is_reserved(subgenre) {
                warn!("Skipping reserved group '{}' in custom rule for '{}'", subgenre, rule.genre);
                continue;
            }
            if index.absorb(&rule.genre, subgenre) {
                debug!("Custom rule: '{}' <- '{}'", rule.genre, subgenre);
                merged += 1;
            }
        }
    }
    merged
}

// ============================================================================
// Similarity Merger
// ============================================================================

/// Merge groups whose member lists are near-duplicates.
///
/// Pairs are visited in encounter order. For a qualifying pair the group that
/// is more of a subgroup is folded into the other. Once the first group of a
/// pair has been folded away the scan moves on to the next first group.
/// Pairs involving a reserved group are never merged; a qualifying pair with
/// "category missing" is reported.
///
/// Returns the number of merges applied.
pub fn merge_similar_groups(
    index: &mut GenreIndex,
    threshold: f64,
    strategy: MergeStrategy,
    anomalies: &mut Vec<Anomaly>,
) -> usize {
    match strategy {
        MergeStrategy::SinglePass => merge_pass(index, threshold, anomalies),
        MergeStrategy::FixedPoint => {
            let mut total = 0;
            let mut passes = 0;
            loop {
                let merged = merge_pass(index, threshold, anomalies);
                passes += 1;
                total += merged;
                if merged == 0 {
                    break;
                }
            }
            debug!("Similarity merge converged after {} passes", passes);
            total
        }
    }
}

/// One sweep over every unordered pair of groups.
fn merge_pass(index: &mut GenreIndex, threshold: f64, anomalies: &mut Vec<Anomaly>) -> usize {
    let names = index.names_snapshot();
    let mut merges = 0;

    for (i, first) in names.iter().enumerate() {
        let mut next = i + 1;

        // Rows are rescored after `first` absorbs a group, since its members changed
        'row: while next < names.len() {
            let scores = score_row(index, first, &names[next..], next);

            let mut restart_at = None;
            for (j, score) in scores {
                if !score.qualifies(threshold) {
                    continue;
                }
                let second = &names[j];

                if is_reserved(first) || is_reserved(second) {
                    if first == CATEGORY_MISSING || second == CATEGORY_MISSING {
                        let other = if first == CATEGORY_MISSING { second } else { first };
                        report(
                            anomalies,
                            Anomaly::CategoryMissingMergeCandidate {
                                other: other.clone(),
                                score: score.max(),
                            },
                        );
                    }
                    continue;
                }

                if score.is_total() {
                    report(
                        anomalies,
                        Anomaly::TotalOverlap {
                            first: first.clone(),
                            second: second.clone(),
                        },
                    );
                }

                if score.second_is_subgroup() {
                    debug!("Merge '{}' <- '{}' ({:?})", first, second, score);
                    index.absorb(first, second);
                    merges += 1;
                    restart_at = Some(j + 1);
                    break;
                }

                debug!("Merge '{}' -> '{}' ({:?})", first, second, score);
                index.absorb(second, first);
                merges += 1;
                break 'row;
            }

            match restart_at {
                Some(j) => next = j,
                None => break,
            }
        }
    }

    merges
}

/// Score `first` against each candidate still present in the index.
/// Scoring is read-only, so candidates are scored in parallel; results come
/// back in candidate order.
fn score_row(
    index: &GenreIndex,
    first: &str,
    candidates: &[String],
    offset: usize,
) -> Vec<(usize, OverlapScore)> {
    let Some(first_members) = index.get(first) else {
        return Vec::new();
    };
    candidates
        .par_iter()
        .enumerate()
        .filter_map(|(k, second)| {
            index
                .get(second)
                .map(|second_members| (offset + k, overlap_score(first_members, second_members)))
        })
        .collect()
}

/// Record an anomaly once, even across repeated passes.
fn report(anomalies: &mut Vec<Anomaly>, anomaly: Anomaly) {
    if !anomalies.contains(&anomaly) {
        warn!("{}", anomaly);
        anomalies.push(anomaly);
    }
}

/// Log a one-line summary for a merge stage.
pub fn log_merge_summary(stage: &str, merged: usize, index: &GenreIndex) {
    info!("{}: merged {} groups, {} remain", stage, merged, index.len());
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(groups: &[(&str, &[&str])]) -> GenreIndex {
        let mut index = GenreIndex::new();
        for (name, members) in groups {
            for member in *members {
                index.push_member(name, member);
            }
        }
        index
    }

    fn members(index: &GenreIndex, group: &str) -> Vec<String> {
        let mut list = index.get(group).unwrap().to_vec();
        list.sort();
        list
    }

    #[test]
    fn test_custom_rules_fold_subgenres() {
        let mut index = index_of(&[
            ("album rock", &["A", "B"]),
            ("classic rock", &["B", "C"]),
            ("jazz", &["D"]),
        ]);
        let rules = vec![MergeRule {
            genre: "rock".to_string(),
            subgenres: vec![
                "album rock".to_string(),
                "classic rock".to_string(),
                "not present".to_string(),
            ],
        }];
        assert_eq!(apply_custom_rules(&mut index, &rules), 2);
        assert_eq!(members(&index, "rock"), vec!["A", "B", "C"]);
        assert!(!index.contains("album rock"));
        assert!(index.contains("jazz"));
    }

    #[test]
    fn test_custom_rules_skip_reserved() {
        let mut index = index_of(&[(CATEGORY_MISSING, &["W"]), ("rock", &["A"])]);
        let rules = vec![
            MergeRule {
                genre: "rock".to_string(),
                subgenres: vec![CATEGORY_MISSING.to_string()],
            },
            MergeRule {
                genre: crate::models::MISC.to_string(),
                subgenres: vec!["rock".to_string()],
            },
        ];
        assert_eq!(apply_custom_rules(&mut index, &rules), 0);
        assert!(index.contains(CATEGORY_MISSING));
        assert!(index.contains("rock"));
    }

    #[test]
    fn test_near_duplicate_merges_into_first() {
        // "deep house" shares 10 of 11 with "house": covers 10/1 vs 10/1
        let shared: Vec<String> = (0..10).map(|i| format!("A{}", i)).collect();
        let mut index = GenreIndex::new();
        index.extend_members("house", &shared);
        index.push_member("house", "H");
        index.extend_members("deep house", &shared);
        index.push_member("deep house", "D");
        let mut anomalies = Vec::new();

        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies);

        assert_eq!(merged, 1);
        assert!(index.contains("house"));
        assert!(!index.contains("deep house"));
        assert_eq!(index.group_len("house"), 12);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_subset_first_group_is_absorbed() {
        let mut index = index_of(&[
            ("nu jazz", &["A", "B"]),
            ("jazz", &["A", "B", "C", "D", "E"]),
            ("metal", &["M"]),
        ]);
        let mut anomalies = Vec::new();

        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies);

        assert_eq!(merged, 1);
        assert!(!index.contains("nu jazz"));
        assert_eq!(members(&index, "jazz"), vec!["A", "B", "C", "D", "E"]);
        assert!(index.contains("metal"));
        assert!(matches!(anomalies.as_slice(), [Anomaly::TotalOverlap { .. }]));
    }

    #[test]
    fn test_below_threshold_is_left_alone() {
        let mut index = index_of(&[("a", &["1", "2", "3", "4", "5"]), ("b", &["8", "9", "1"])]);
        let before = index.clone();
        let mut anomalies = Vec::new();
        assert_eq!(
            merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies),
            0
        );
        assert_eq!(index, before);
    }

    #[test]
    fn test_category_missing_is_never_merged() {
        let mut index = index_of(&[("rock", &["W", "A"]), (CATEGORY_MISSING, &["W"])]);
        let mut anomalies = Vec::new();

        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::FixedPoint, &mut anomalies);

        assert_eq!(merged, 0);
        assert!(index.contains(CATEGORY_MISSING));
        assert!(index.contains("rock"));
        assert_eq!(anomalies.len(), 1);
        assert!(matches!(
            &anomalies[0],
            Anomaly::CategoryMissingMergeCandidate { other, .. } if other == "rock"
        ));
    }

    #[test]
    fn test_misc_is_never_merged() {
        let mut index = index_of(&[
            ("x", &["A", "B", "C", "D", "E", "F"]),
            (crate::models::MISC, &["A", "B"]),
        ]);
        let before = index.clone();
        let mut anomalies = Vec::new();

        for strategy in [MergeStrategy::SinglePass, MergeStrategy::FixedPoint] {
            let merged = merge_similar_groups(&mut index, 0.9, strategy, &mut anomalies);
            assert_eq!(merged, 0);
        }

        assert_eq!(index, before);
        assert!(anomalies.is_empty());
    }

    /// a is mostly inside b, and b is entirely inside c.
    fn chain_fixture() -> GenreIndex {
        index_of(&[
            ("a", &["1", "2", "3", "4", "5", "6", "7"]),
            ("b", &["1", "2", "3", "4", "5", "6", "P", "Q", "R", "S", "T"]),
            ("c", &["1", "2", "3", "4", "5", "6", "7", "P", "Q", "R", "S", "T", "U"]),
        ])
    }

    #[test]
    fn test_merge_chain_follows_surviving_group() {
        // Row a: a~b covers 6/1 vs 6/5, so a is folded into b and the row ends.
        // Row b: b (now 12) is entirely inside c and is folded into c.
        let mut index = chain_fixture();
        let mut anomalies = Vec::new();
        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies);
        assert_eq!(merged, 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.group_len("c"), 13);
        assert_eq!(
            anomalies,
            vec![Anomaly::TotalOverlap {
                first: "b".to_string(),
                second: "c".to_string()
            }]
        );
    }

    /// Row x scores y before absorbing z. Only the grown x overlaps y.
    fn late_growth_fixture() -> GenreIndex {
        index_of(&[
            ("x", &["1", "2", "3", "4", "5", "6"]),
            ("y", &["7", "8"]),
            ("z", &["1", "2", "3", "4", "7"]),
        ])
    }

    #[test]
    fn test_single_pass_leaves_late_overlap() {
        // x~y shares nothing; x~z covers 4/2 vs 4/1 so z is folded into x.
        // x~y is not rescored after x grows.
        let mut index = late_growth_fixture();
        let mut anomalies = Vec::new();
        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies);
        assert_eq!(merged, 1);
        assert_eq!(index.len(), 2);
        assert_eq!(members(&index, "x"), vec!["1", "2", "3", "4", "5", "6", "7"]);
        assert!(index.contains("y"));
    }

    #[test]
    fn test_fixed_point_merges_late_overlap() {
        // Second pass: grown x~y covers 1/6 vs 1/1, so y is folded into x.
        let mut index = late_growth_fixture();
        let mut anomalies = Vec::new();
        let merged = merge_similar_groups(&mut index, 0.9, MergeStrategy::FixedPoint, &mut anomalies);
        assert_eq!(merged, 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.group_len("x"), 8);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_merge_is_stable_when_rerun() {
        let mut index = late_growth_fixture();
        let mut anomalies = Vec::new();
        merge_similar_groups(&mut index, 0.9, MergeStrategy::FixedPoint, &mut anomalies);
        let settled = index.clone();
        assert_eq!(
            merge_similar_groups(&mut index, 0.9, MergeStrategy::SinglePass, &mut anomalies),
            0
        );
        assert_eq!(index, settled);
    }
}
