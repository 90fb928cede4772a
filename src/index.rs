//! Indexer: artist lookup and the initial genre → artists index.

use crate::models::{Artist, ArtistIndex, GenreIndex, CATEGORY_MISSING};

/// Artist name → record. A later record with the same name replaces the
/// earlier one.
pub fn index_artists(artists: &[Artist]) -> ArtistIndex {
    let mut index = ArtistIndex::default();
    for artist in artists {
        index.insert(artist.name.clone(), artist.clone());
    }
    index
}

/// Genre → artist names, seeded from each artist's raw tags. Untagged
/// artists go to "category missing".
pub fn index_genres(artists: &[Artist]) -> GenreIndex {
    let mut index = GenreIndex::new();
    for artist in artists {
        if artist.genres.is_empty() {
            index.push_member(CATEGORY_MISSING, &artist.name);
            continue;
        }
        for genre in &artist.genres {
            index.push_member(genre, &artist.name);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(index_artists(&[]).is_empty());
        assert!(index_genres(&[]).is_empty());
    }

    #[test]
    fn test_genre_index_in_encounter_order() {
        let artists = vec![
            Artist::new("X", &["a"]),
            Artist::new("Y", &["b", "a"]),
            Artist::new("W", &[]),
        ];
        let index = index_genres(&artists);
        let names: Vec<&str> = index.names().collect();
        assert_eq!(names, vec!["a", "b", CATEGORY_MISSING]);
        assert_eq!(index.get("a").unwrap(), ["X".to_string(), "Y".to_string()].as_slice());
        assert_eq!(index.get(CATEGORY_MISSING).unwrap(), ["W".to_string()].as_slice());
    }

    #[test]
    fn test_repeated_tag_adds_artist_once() {
        let artists = vec![Artist::new("X", &["a", "a"])];
        assert_eq!(index_genres(&artists).group_len("a"), 1);
    }

    #[test]
    fn test_duplicate_names_last_record_wins() {
        let artists = vec![Artist::new("X", &["a"]), Artist::new("X", &["b"])];
        let artist_index = index_artists(&artists);
        assert_eq!(artist_index.len(), 1);
        assert_eq!(artist_index["X"].genres, vec!["b".to_string()]);

        // Both records still contribute their tags
        let genre_index = index_genres(&artists);
        assert!(genre_index.contains_member("a", "X"));
        assert!(genre_index.contains_member("b", "X"));
    }
}
