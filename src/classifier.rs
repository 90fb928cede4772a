//! The grouping pipeline.
//!
//! Stages run in a fixed order, each taking the Genre Index, mutating it and
//! handing it on:
//!
//! 1. index artists and raw tags
//! 2. custom merge rules
//! 3. similarity merge
//! 4. small-group absorption
//! 5. residual collection into "misc"
//! 6. exact and fuzzy rescue out of "misc"
//! 7. consolidation (absorption with the larger threshold)
//! 8. report
//!
//! The pipeline does no I/O and is deterministic for a given input order.

use anyhow::Result;
use log::info;

use crate::absorb::{absorb_small_groups, collect_residuals};
use crate::config::GroupingConfig;
use crate::index::{index_artists, index_genres};
use crate::merge::{apply_custom_rules, log_merge_summary, merge_similar_groups};
use crate::models::{Anomaly, Artist, ArtistIndex, ClassificationStats, GenreIndex, MISC};
use crate::report::report;
use crate::rescue::rescue_misc;

/// Result of one classification run.
#[derive(Debug, Clone)]
pub struct Classification {
    pub artist_index: ArtistIndex,
    /// Member lists are sorted
    pub genre_index: GenreIndex,
    pub stats: ClassificationStats,
    pub anomalies: Vec<Anomaly>,
}

impl Classification {
    /// Artists no stage could place in a named group.
    pub fn uncategorized(&self) -> &[String] {
        self.genre_index.get(MISC).unwrap_or_default()
    }

    /// Every group listing `artist`, in group order.
    pub fn groups_of(&self, artist: &str) -> Vec<&str> {
        self.genre_index
            .iter()
            .filter(|(_, members)| members.binary_search_by(|m| m.as_str().cmp(artist)).is_ok())
            .map(|(name, _)| name)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenreClassifier {
    config: GroupingConfig,
}

impl GenreClassifier {
    pub fn new(config: GroupingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Group a fresh list of artists.
    pub fn classify(&self, artists: &[Artist]) -> Classification {
        let artist_index = index_artists(artists);
        let genre_index = index_genres(artists);
        info!(
            "Indexed {} artists ({} records) into {} genres",
            artist_index.len(),
            artists.len(),
            genre_index.len()
        );
        self.regroup(artist_index, genre_index, artists.len())
    }

    /// Run every stage after indexing on an existing Genre Index.
    ///
    /// Feeding a previous result back in is allowed; "misc" carries over and
    /// keeps growing rather than being rebuilt.
    pub fn regroup(
        &self,
        artist_index: ArtistIndex,
        mut genre_index: GenreIndex,
        raw_input_count: usize,
    ) -> Classification {
        let config = &self.config;
        let mut anomalies = Vec::new();
        let mut stats = ClassificationStats {
            initial_groups: genre_index.len(),
            ..Default::default()
        };

        stats.custom_rule_merges = apply_custom_rules(&mut genre_index, &config.custom_merge_rules);
        if !config.custom_merge_rules.is_empty() {
            log_merge_summary("Custom rules", stats.custom_rule_merges, &genre_index);
        }

        stats.similarity_merges = merge_similar_groups(
            &mut genre_index,
            config.similarity_threshold,
            config.merge_strategy,
            &mut anomalies,
        );
        log_merge_summary("Similarity merge", stats.similarity_merges, &genre_index);

        stats.absorbed_groups =
            absorb_small_groups(&mut genre_index, &artist_index, config.small_group_threshold);
        stats.swept_artists =
            collect_residuals(&mut genre_index, config.small_group_threshold, &mut anomalies);

        let rescued = rescue_misc(&mut genre_index, &artist_index, config);
        stats.exact_rescues = rescued.exact;
        stats.fuzzy_rescues = rescued.fuzzy;

        if let Some(threshold) = config.consolidation_threshold {
            stats.consolidated_groups = absorb_small_groups(&mut genre_index, &artist_index, threshold);
        }

        if genre_index.get(MISC).is_some_and(|misc| misc.is_empty()) {
            genre_index.remove(MISC);
        }
        genre_index.sort_members();

        report(&artist_index, raw_input_count, &genre_index, &mut stats);
        stats.anomalies = anomalies.len();
        info!(
            "Finished: {} groups, {} of {} artists categorized, {} in '{}'",
            stats.final_groups,
            stats.categorized_artists,
            stats.total_artists,
            stats.misc_artists,
            MISC
        );

        Classification {
            artist_index,
            genre_index,
            stats,
            anomalies,
        }
    }
}

/// Classify with the default configuration.
pub fn classify(artists: &[Artist]) -> Classification {
    GenreClassifier::default().classify(artists)
}

// ============================================================================
// TESTS
// ============================================================================
