//! Text normalization shared by the rescue pass and configuration.
//!
//! Genre tags and artist names are compared in "match-key" form: NFKD
//! decomposed, combining marks dropped, transliterated to ASCII and
//! lowercased. Tokens are produced by splitting on runs of whitespace,
//! commas and hyphens.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Runs of whitespace, commas and hyphens: "lo-fi, chill  hop" → lo / fi / chill / hop
pub static TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,\-]+").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing combining marks.
/// e.g., "Música Popular" → "musica popular", "Électro" → "electro"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Remaining non-ASCII (Cyrillic, Greek, CJK...) is transliterated
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Comparison form of a token or group name. Case and diacritics are ignored.
pub fn match_key(s: &str) -> String {
    fold_to_ascii(s.trim())
}

/// Split text into tokens, dropping empty pieces from leading/trailing separators.
pub fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_SEPARATOR.split(text).filter(|t| !t.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
