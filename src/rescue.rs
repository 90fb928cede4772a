//! Heuristic rescue of "misc" artists into named groups.
//!
//! Each artist in "misc" gets a token set from its own name plus its raw
//! genre tags. Two passes run back to back:
//!
//! - exact: a token equal to a group name moves the artist into that group
//! - fuzzy: a token contained in group names adds the artist to every such
//!   group
//!
//! Comparison happens on match keys, so "House" and "house" are the same
//! token. Reserved groups are never targets.

use log::{debug, info};

use crate::config::GroupingConfig;
use crate::models::{is_reserved, ArtistIndex, GenreIndex, MISC};
use crate::normalize::{match_key, split_tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    Exact,
    Fuzzy,
}

/// Artists moved out of "misc" by each pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RescueOutcome {
    pub exact: usize,
    pub fuzzy: usize,
}

/// Candidate tokens for one artist, in match-key form, first occurrence order.
///
/// Name tokens are all kept. Genre tokens must pass the length and blocklist
/// filter.
pub fn rescue_tokens(name: &str, genres: &[String], config: &GroupingConfig) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut push = |token: String| {
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    };

    for token in split_tokens(name) {
        push(match_key(token));
    }
    for genre in genres {
        for token in split_tokens(genre) {
            let key = match_key(token);
            if config.keeps_token(&key) {
                push(key);
            }
        }
    }
    tokens
}

/// Run the exact pass, then the fuzzy pass over whatever is left in "misc".
pub fn rescue_misc(index: &mut GenreIndex, artists: &ArtistIndex, config: &GroupingConfig) -> RescueOutcome {
    let exact = rescue_pass(index, artists, config, MatchMode::Exact);
    let fuzzy = rescue_pass(index, artists, config, MatchMode::Fuzzy);
    info!(
        "Rescued {} artists from '{}' ({} exact, {} fuzzy), {} remain",
        exact + fuzzy,
        MISC,
        exact,
        fuzzy,
        index.group_len(MISC)
    );
    RescueOutcome { exact, fuzzy }
}

fn rescue_pass(
    index: &mut GenreIndex,
    artists: &ArtistIndex,
    config: &GroupingConfig,
    mode: MatchMode,
) -> usize {
    let Some(misc) = index.get(MISC) else {
        return 0;
    };
    let candidates = misc.to_vec();

    // (group name, match key) for every possible target
    let targets: Vec<(String, String)> = index
        .names()
        .filter(|name| !is_reserved(name))
        .map(|name| (name.to_string(), match_key(name)))
        .collect();

    let mut rescued = 0;
    for artist_name in candidates {
        let genres = artists
            .get(&artist_name)
            .map(|artist| artist.genres.as_slice())
            .unwrap_or_default();
        let tokens = rescue_tokens(&artist_name, genres, config);

        let homes: Vec<&str> = match mode {
            MatchMode::Exact => targets
                .iter()
                .find(|(_, key)| tokens.iter().any(|token| token == key))
                .map(|(name, _)| name.as_str())
                .into_iter()
                .collect(),
            MatchMode::Fuzzy => targets
                .iter()
                .filter(|(_, key)| {
                    tokens
                        .iter()
                        .any(|token| config.keeps_token(token) && key.contains(token.as_str()))
                })
                .map(|(name, _)| name.as_str())
                .collect(),
        };

        if homes.is_empty() {
            continue;
        }
        for home in &homes {
            index.push_member(home, &artist_name);
        }
        index.remove_member(MISC, &artist_name);
        debug!("Rescued '{}' ({:?}) into {:?}", artist_name, mode, homes);
        rescued += 1;
    }
    rescued
}

// ============================================================================
// TESTS
// ============================================================================
