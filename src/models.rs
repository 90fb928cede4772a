//! Core data models for genre grouping.
//!
//! This module contains the artist record, the two indices the pipeline
//! stages hand to each other, and the diagnostics/statistics returned with a
//! finished grouping.

use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Reserved Groups
// ============================================================================

/// Group holding artists whose raw genre list was empty.
pub const CATEGORY_MISSING: &str = "category missing";

/// Catch-all group for artists whose tags did not survive merging.
pub const MISC: &str = "misc";

/// Reserved groups live outside normal genre space: they are never merge
/// sources, absorption targets or rescue targets.
pub fn is_reserved(group: &str) -> bool {
    group == CATEGORY_MISSING || group == MISC
}

// ============================================================================
// Artist Records
// ============================================================================

/// Artist as supplied by the streaming service.
///
/// Only `name` and `genres` matter to the engine; the rest is carried through
/// untouched for whoever renders the result. Unknown fields in the source JSON
/// are dropped on deserialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: serde_json::Value,
}

impl Artist {
    pub fn new(name: &str, genres: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..Self::default()
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepted input shapes: a bare array, or the service's paged envelope for
/// followed artists.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtistPayload {
    List(Vec<Artist>),
    Paged { artists: ArtistPage },
}

#[derive(Deserialize)]
struct ArtistPage {
    items: Vec<Artist>,
}

/// Parse artist records from JSON.
pub fn parse_artists(json: &str) -> Result<Vec<Artist>> {
    let payload: ArtistPayload =
        serde_json::from_str(json).context("Input is neither an artist array nor a paged artist list")?;
    Ok(match payload {
        ArtistPayload::List(artists) => artists,
        ArtistPayload::Paged { artists } => artists.items,
    })
}

// ============================================================================
// Indices
// ============================================================================

/// Artist name to artist record. Built once per run, read-only afterward.
pub type ArtistIndex = FxHashMap<String, Artist>;

/// Group name to member artist names.
///
/// Groups keep the order in which they were first created; every scan in the
/// pipeline walks them in that order, which is what makes tie-breaks
/// reproducible. Member lists never hold the same artist twice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenreIndex {
    order: Vec<String>,
    groups: FxHashMap<String, Vec<String>>,
}

impl GenreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Member count, zero for unknown groups.
    pub fn group_len(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, Vec::len)
    }

    pub fn contains_member(&self, group: &str, artist: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.iter().any(|m| m == artist))
    }

    /// Group names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Owned copy of the group names, for stages that mutate while scanning.
    pub fn names_snapshot(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.groups[name].as_slice()))
    }

    /// Add `artist` to `group`, creating the group if needed.
    /// Returns false when the artist was already a member.
    pub fn push_member(&mut self, group: &str, artist: &str) -> bool {
        let members = self.entry(group);
        if members.iter().any(|m| m == artist) {
            return false;
        }
        members.push(artist.to_string());
        true
    }

    /// Append members to `group` (created if needed), skipping ones already
    /// present. Returns how many were added.
    pub fn extend_members<'a, I>(&mut self, group: &str, artists: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let members = self.entry(group);
        let mut seen: FxHashSet<String> = members.iter().cloned().collect();
        let mut added = 0;
        for artist in artists {
            if seen.insert(artist.clone()) {
                members.push(artist.clone());
                added += 1;
            }
        }
        added
    }

    pub fn remove_member(&mut self, group: &str, artist: &str) -> bool {
        match self.groups.get_mut(group) {
            Some(members) => {
                let before = members.len();
                members.retain(|m| m != artist);
                members.len() != before
            }
            None => false,
        }
    }

    /// Dissociate a group name from the index entirely.
    pub fn remove(&mut self, group: &str) -> Option<Vec<String>> {
        let members = self.groups.remove(group)?;
        self.order.retain(|name| name != group);
        Some(members)
    }

    /// Move every member of `source` into `target` and delete `source`.
    /// Returns false if `source` does not exist or names the target.
    pub fn absorb(&mut self, target: &str, source: &str) -> bool {
        if target == source {
            return false;
        }
        match self.remove(source) {
            Some(members) => {
                self.extend_members(target, &members);
                true
            }
            None => false,
        }
    }

    /// Set of every artist that belongs to at least one group.
    pub fn member_set(&self) -> FxHashSet<&str> {
        self.groups
            .values()
            .flat_map(|members| members.iter().map(String::as_str))
            .collect()
    }

    pub fn sort_members(&mut self) {
        for members in self.groups.values_mut() {
            members.sort();
        }
    }

    fn entry(&mut self, group: &str) -> &mut Vec<String> {
        if !self.groups.contains_key(group) {
            self.order.push(group.to_string());
        }
        self.groups.entry(group.to_string()).or_default()
    }
}

/// Serialized as a JSON object in group creation order.
impl Serialize for GenreIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, members) in self.iter() {
            map.serialize_entry(name, members)?;
        }
        map.end()
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Non-fatal conditions noticed while grouping. None of them stop the run;
/// they are logged and handed back with the result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// A pair involving "category missing" overlapped enough to merge.
    /// The merge is skipped.
    CategoryMissingMergeCandidate { other: String, score: f64 },
    /// One side of an overlap had no members outside the shared portion.
    TotalOverlap { first: String, second: String },
    /// Artist being swept into "misc" already sits in a big group.
    /// It is dropped from the sweep instead of duplicated.
    AlreadyCategorized { artist: String, group: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::CategoryMissingMergeCandidate { other, score } => write!(
                f,
                "'{}' overlaps '{}' (score {:.2}) but will not be merged",
                CATEGORY_MISSING, other, score
            ),
            Anomaly::TotalOverlap { first, second } => {
                write!(f, "'{}' and '{}' overlap completely on one side", first, second)
            }
            Anomaly::AlreadyCategorized { artist, group } => write!(
                f,
                "'{}' swept from a small group but already belongs to '{}'",
                artist, group
            ),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Population counts and per-stage counters for one classification run.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationStats {
    // Reporter
    pub total_artists: usize,
    pub raw_input_count: usize,
    pub categorized_artists: usize,

    // Indexer
    pub initial_groups: usize,

    // Merge stages
    pub custom_rule_merges: usize,
    pub similarity_merges: usize,
    pub absorbed_groups: usize,

    // Residual collection and rescue
    pub swept_artists: usize,
    pub exact_rescues: usize,
    pub fuzzy_rescues: usize,

    // Consolidation
    pub consolidated_groups: usize,

    // Final shape
    pub final_groups: usize,
    pub misc_artists: usize,
    pub anomalies: usize,
}

impl ClassificationStats {
    /// Share of distinct artists that ended up in a named group (not "misc"),
    /// as a percentage.
    pub fn named_rate(&self) -> f64 {
        if self.total_artists == 0 {
            0.0
        } else {
            100.0 * (self.total_artists - self.misc_artists.min(self.total_artists)) as f64
                / self.total_artists as f64
        }
    }

    /// Input records sharing a name with another record.
    pub fn duplicate_inputs(&self) -> usize {
        self.raw_input_count.saturating_sub(self.total_artists)
    }

    /// Log stats in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            log::info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
