//! Reporter: population counts for a finished grouping.

use crate::models::{ArtistIndex, ClassificationStats, GenreIndex, MISC};

/// Fill the population counts of `stats` from the final indices.
///
/// `categorized_artists` counts distinct artists across all groups, so an
/// artist rescued into several groups counts once.
pub fn report(
    artists: &ArtistIndex,
    raw_input_count: usize,
    index: &GenreIndex,
    stats: &mut ClassificationStats,
) {
    stats.total_artists = artists.len();
    stats.raw_input_count = raw_input_count;
    stats.categorized_artists = index.member_set().len();
    stats.final_groups = index.len();
    stats.misc_artists = index.group_len(MISC);
}
