//! Name normalization utilities
//!
//! Deterministic, side-effect-free string transforms shared by every other component.
//! None of these functions fail: odd or empty input is returned unchanged.

pub mod variants;

pub use variants::{detect_artist_type, name_variants, ArtistType};

/// Quote characters stripped from artist names (straight and curly)
const QUOTE_CHARS: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

/// Track-title suffixes, checked in order; the first one present wins
const TRACK_SUFFIXES: &[&str] = &[
    " - from",
    " (from",
    " - soundtrack",
    " (soundtrack",
    " - original motion picture soundtrack",
    " version",
    " - instrumental",
    " (instrumental",
    " - orchestral",
    " (orchestral",
    " - theme",
    " (theme",
    " - main theme",
    " (main theme",
    " - score",
    " (score",
    " - original score",
    " (original score",
    " - film version",
    " (film version",
    " - movie version",
    " (movie version)",
    " - extended",
    " (extended",
    " - reprise",
    " (reprise",
    " - live",
    " (live",
    " - remix",
    " (remix",
];

/// Album-title suffixes for soundtrack releases
const ALBUM_SUFFIXES: &[&str] = &[
    " - original motion picture soundtrack",
    " (original motion picture soundtrack)",
    " - soundtrack",
    " (soundtrack)",
    " - original soundtrack",
    " (original soundtrack)",
    " - film soundtrack",
    " (film soundtrack)",
    " - movie soundtrack",
    " (movie soundtrack)",
    " - original score",
    " (original score)",
    " - score",
    " (score)",
];

/// Separators that start a featured-artist clause
const FEAT_PATTERNS: [&str; 3] = [" feat. ", " feat ", " ft. "];

const SOUNDTRACK_KEYWORDS: [&str; 6] = ["soundtrack", "motion picture", "film", "movie", "score", "theme"];

/// Collapse runs of whitespace to single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search variants of a raw artist name
///
/// For `Joe "Bean" Esposito` this yields `Joe Bean Esposito` then `Joe Esposito`.
/// Without quotes the original string comes first, followed by a whitespace-collapsed
/// form if that differs. Order is preserved and duplicates/empties removed.
pub fn clean_variations(name: &str) -> Vec<String> {
    if name.trim().is_empty() {
        return vec![name.to_string()];
    }

    let normalized = name.replace("\\\"", "\"");
    let has_quotes = normalized.contains(QUOTE_CHARS);

    let mut candidates = Vec::new();
    if has_quotes {
        candidates.push(collapse_whitespace(&normalized.replace(QUOTE_CHARS, "")));
        candidates.push(collapse_whitespace(&strip_quoted_segments(&normalized)));
    } else {
        candidates.push(name.to_string());
        candidates.push(collapse_whitespace(name));
    }

    let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !c.is_empty() && !unique.contains(&c) {
            unique.push(c);
        }
    }

    if unique.is_empty() {
        unique.push(name.to_string());
    }
    unique
}

/// Remove every `"..."` segment (straight or curly quotes) together with its padding
fn strip_quoted_segments(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_quote = false;
    for ch in name.chars() {
        if QUOTE_CHARS.contains(&ch) {
            in_quote = !in_quote;
            out.push(' ');
        } else if !in_quote {
            out.push(ch);
        }
    }
    out
}

/// Core track title with a known decoration suffix removed
///
/// Matching is case-insensitive; the first suffix in the table that occurs anywhere
/// in the title truncates it. Original casing is kept for the retained prefix.
pub fn simplify_track_title(title: &str) -> String {
    truncate_at_first_suffix(title, TRACK_SUFFIXES)
}

/// Core album title with a soundtrack suffix removed
pub fn simplify_album_title(album: &str) -> String {
    truncate_at_first_suffix(album, ALBUM_SUFFIXES)
}

/// Film/show title from a soundtrack album ("The Karate Kid: Original Score" → "The Karate Kid")
pub fn core_album_title(album: &str) -> String {
    let simplified = simplify_album_title(album);
    match simplified.split_once(':') {
        Some((head, _)) if !head.trim().is_empty() => head.trim().to_string(),
        _ => simplified,
    }
}

/// True if an album name looks like a soundtrack release
pub fn is_soundtrack_hint(album_name: &str) -> bool {
    let lower = album_name.to_lowercase();
    SOUNDTRACK_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn truncate_at_first_suffix(text: &str, suffixes: &[&str]) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lower = text.to_lowercase();
    for suffix in suffixes {
        if let Some(idx) = lower.find(suffix) {
            let prefix = lower[..idx].trim();
            // Lowercasing can change byte lengths for some scripts; only restore
            // casing when the byte layout lines up.
            if lower.len() == text.len() && text.is_char_boundary(prefix.len()) {
                let original = &text[..prefix.len()];
                if original.to_lowercase() == prefix {
                    return original.to_string();
                }
            }
            return prefix.to_string();
        }
    }

    text.to_string()
}

/// Lowercase, trimmed name with parentheticals and "feat." clauses removed
///
/// This is the comparison key used by identity resolution.
pub fn normalize_for_matching(name: &str) -> String {
    let lower = name.to_lowercase();

    let without_feat = match FEAT_PATTERNS.iter().filter_map(|p| lower.find(p)).min() {
        Some(idx) => &lower[..idx],
        None => lower.as_str(),
    };

    let mut out = String::with_capacity(without_feat.len());
    let mut depth = 0usize;
    for ch in without_feat.chars() {
        match ch {
            '(' => {
                depth += 1;
                out.push(' ');
            }
            ')' if depth > 0 => {
                depth -= 1;
                out.push(' ');
            }
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

/// Node id for an artist: lowercase, spaces → underscores
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

// ============================================================================
// Tests
// ============================================================================
