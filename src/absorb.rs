//! Small-group handling: absorption into related big groups, and the sweep
//! of leftovers into "misc".
//!
//! A group is small when it has `threshold` members or fewer. Reserved groups
//! sit outside the partition: they are never absorbed or swept, and never
//! serve as absorption targets.

use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{is_reserved, Anomaly, ArtistIndex, GenreIndex, MISC};

/// Non-reserved groups split by size.
#[derive(Debug, Default)]
pub struct Partition {
    pub big: FxHashSet<String>,
    /// Small groups in index order
    pub small: Vec<String>,
}

pub fn partition(index: &GenreIndex, threshold: usize) -> Partition {
    let mut result = Partition::default();
    for (name, members) in index.iter() {
        if is_reserved(name) {
            continue;
        }
        if members.len() <= threshold {
            result.small.push(name.to_string());
        } else {
            result.big.insert(name.to_string());
        }
    }
    result
}

/// Raw tags of every member of a group, first occurrence order, no repeats.
fn related_genres(members: &[String], artists: &ArtistIndex) -> Vec<String> {
    let mut seen = FxHashSet::default();
    members
        .iter()
        .filter_map(|member| artists.get(member))
        .flat_map(|artist| artist.genres.iter())
        .filter(|genre| seen.insert(genre.as_str()))
        .cloned()
        .collect()
}

/// Biggest related genre that currently names a big group. Ties keep the
/// first one encountered.
fn pick_target<'a>(
    small: &str,
    related: &'a [String],
    big: &FxHashSet<String>,
    index: &GenreIndex,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for genre in related {
        if genre == small || !big.contains(genre) {
            continue;
        }
        let size = index.group_len(genre);
        if best.map_or(true, |(_, best_size)| size > best_size) {
            best = Some((genre.as_str(), size));
        }
    }
    best.map(|(genre, _)| genre)
}

/// Fold every small group into its biggest related big group, found through
/// the other raw tags of its members. Small groups without such a target are
/// left untouched. Returns the number of groups absorbed.
pub fn absorb_small_groups(index: &mut GenreIndex, artists: &ArtistIndex, threshold: usize) -> usize {
    let Partition { big, small } = partition(index, threshold);
    let mut absorbed = 0;

    for small_group in &small {
        let Some(members) = index.get(small_group) else {
            continue;
        };
        let related = related_genres(members, artists);
        if let Some(target) = pick_target(small_group, &related, &big, index) {
            debug!("Absorb '{}' -> '{}'", small_group, target);
            index.absorb(target, small_group);
            absorbed += 1;
        }
    }

    info!(
        "Absorbed {} of {} groups with <= {} members",
        absorbed,
        small.len(),
        threshold
    );
    absorbed
}

/// Sweep artists out of small groups into "misc" and delete the small groups.
///
/// Artists already present in a big group are reported and dropped from the
/// sweep. When no big group exists at all the small groups are the grouping,
/// and nothing is swept. Returns the number of artists added to "misc".
pub fn collect_residuals(
    index: &mut GenreIndex,
    threshold: usize,
    anomalies: &mut Vec<Anomaly>,
) -> usize {
    let Partition { big, small } = partition(index, threshold);
    if big.is_empty() {
        info!(
            "No group has more than {} members; keeping {} small groups",
            threshold,
            small.len()
        );
        return 0;
    }

    // Artist → first big group (in index order) that lists it
    let mut homes: FxHashMap<String, String> = FxHashMap::default();
    for (name, members) in index.iter() {
        if big.contains(name) {
            for member in members {
                homes.entry(member.clone()).or_insert_with(|| name.to_string());
            }
        }
    }

    let mut swept = 0;
    for small_group in &small {
        let Some(members) = index.remove(small_group) else {
            continue;
        };
        for artist in members {
            if let Some(home) = homes.get(&artist) {
                let anomaly = Anomaly::AlreadyCategorized {
                    artist: artist.clone(),
                    group: home.clone(),
                };
                warn!("{}", anomaly);
                anomalies.push(anomaly);
                continue;
            }
            if index.push_member(MISC, &artist) {
                swept += 1;
            }
        }
    }

    info!(
        "Collected {} artists from {} small groups into '{}'",
        swept,
        small.len(),
        MISC
    );
    swept
}

// ============================================================================
// TESTS
// ============================================================================
