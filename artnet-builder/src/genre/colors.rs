//! Node colors per genre bucket (tuned for a dark background)

const OTHER_COLOR: &str = "#C0C0C0";

const GENRE_COLORS: &[(&str, &str)] = &[
    ("pop", "#FFEB3B"),
    ("rock", "#F44336"),
    ("metal", "#607D8B"),
    ("electronic", "#9C27B0"),
    ("asian", "#FF69B4"),
    ("latin", "#DC143C"),
    ("country", "#FF9800"),
    ("folk", "#FF9800"),
    ("r&b", "#8D6E63"),
    ("soul", "#8D6E63"),
    ("hip-hop", "#FFD700"),
    ("indie", "#00BCD4"),
    ("world", "#4CAF50"),
    ("classical", "#E8EAF6"),
    ("orchestral", "#E8EAF6"),
    ("ost", "#E8EAF6"),
    ("other", OTHER_COLOR),
];

/// Hex color for a bucket; unknown buckets get the `other` color
pub fn genre_color(bucket: &str) -> &'static str {
    GENRE_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(bucket))
        .map(|(_, color)| *color)
        .unwrap_or(OTHER_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genre::tables::GENRE_MAPPINGS;

    #[test]
    fn test_known_and_fallback_colors() {
        assert_eq!(genre_color("asian"), "#FF69B4");
        assert_eq!(genre_color("Hip-Hop"), "#FFD700");
        assert_eq!(genre_color("polka"), OTHER_COLOR);
    }

    #[test]
    fn test_every_bucket_has_a_color() {
        for (bucket, _) in GENRE_MAPPINGS {
            assert!(GENRE_COLORS.iter().any(|(b, _)| b == bucket), "{} has no color", bucket);
        }
    }
}
