//! Grouping configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Keys are camelCase in JSON.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::models::is_reserved;
use crate::normalize::match_key;

/// Overlap ratio a pair of groups must exceed to be merged
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Groups with this many members or fewer are small
pub const DEFAULT_SMALL_GROUP_THRESHOLD: usize = 4;

/// Small-group threshold for the consolidation pass after rescue
pub const DEFAULT_CONSOLIDATION_THRESHOLD: usize = 8;

/// Genre tokens must be at least this many characters to be used for rescue
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 4;

/// Words too common across genre names to say anything on their own
pub const DEFAULT_TOKEN_BLOCKLIST: [&str; 3] = ["dark", "wave", "indie"];

/// How many times the similarity merger sweeps the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// One sweep over all pairs. Transitively mergeable groups may survive.
    #[default]
    SinglePass,
    /// Sweep until a full pass merges nothing.
    FixedPoint,
}

/// Explicit merge: every listed subgenre is folded into `genre`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRule {
    pub genre: String,
    pub subgenres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupingConfig {
    pub similarity_threshold: f64,
    pub small_group_threshold: usize,
    /// `None` skips the consolidation pass.
    pub consolidation_threshold: Option<usize>,
    pub merge_strategy: MergeStrategy,
    pub token_blocklist: BTreeSet<String>,
    pub min_token_length: usize,
    pub custom_merge_rules: Vec<MergeRule>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            small_group_threshold: DEFAULT_SMALL_GROUP_THRESHOLD,
            consolidation_threshold: Some(DEFAULT_CONSOLIDATION_THRESHOLD),
            merge_strategy: MergeStrategy::default(),
            token_blocklist: DEFAULT_TOKEN_BLOCKLIST.iter().map(|t| t.to_string()).collect(),
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            custom_merge_rules: Vec::new(),
        }
    }
}

impl GroupingConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            bail!(
                "similarityThreshold must be a finite, non-negative number (got {})",
                self.similarity_threshold
            );
        }
        if self.min_token_length == 0 {
            bail!("minTokenLength must be at least 1");
        }
        if let Some(consolidation) = self.consolidation_threshold {
            if consolidation < self.small_group_threshold {
                bail!(
                    "consolidationThreshold ({}) cannot be below smallGroupThreshold ({})",
                    consolidation,
                    self.small_group_threshold
                );
            }
        }
        for rule in &self.custom_merge_rules {
            if rule.genre.trim().is_empty() {
                bail!("custom merge rule with an empty target genre");
            }
            if is_reserved(&rule.genre) {
                log::warn!("Custom merge rule targets reserved group '{}'; it will be skipped", rule.genre);
            }
        }
        Ok(())
    }

    /// Whether a genre-derived token is specific enough to rescue an artist.
    /// `token` is expected in match-key form.
    pub fn keeps_token(&self, token: &str) -> bool {
        token.chars().count() >= self.min_token_length
            && !self.token_blocklist.iter().any(|blocked| match_key(blocked) == token)
    }
}

// ============================================================================
// TESTS
// ============================================================================
