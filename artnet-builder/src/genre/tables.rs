//! Keyword tables for genre classification

/// Fallback bucket when no tag matches
pub const OTHER: &str = "other";

/// Bucket priority; cultural and regional buckets outrank generic ones
pub const HIERARCHY: &[(&str, u32)] = &[
    ("asian", 10),
    ("latin", 10),
    ("world", 9),
    ("country", 8),
    ("folk", 7),
    ("classical", 7),
    ("metal", 6),
    ("rock", 5),
    ("electronic", 5),
    ("hip-hop", 5),
    ("r&b", 4),
    ("indie", 3),
    ("pop", 2),
    ("other", 1),
];

/// Priority of a bucket; unlisted buckets rank with `other`
pub fn hierarchy(bucket: &str) -> u32 {
    HIERARCHY
        .iter()
        .find(|(name, _)| *name == bucket)
        .map(|(_, p)| *p)
        .unwrap_or(1)
}

/// Keywords that decide the primary bucket outright, checked in table order
pub const EXCLUSIVE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "asian",
        &[
            "k-pop", "kpop", "korean pop", "k pop", "j-pop", "jpop", "japanese pop", "j pop",
            "c-pop", "cpop", "chinese pop", "c pop", "korean", "japanese", "chinese", "thai",
            "vietnamese",
        ],
    ),
    (
        "latin",
        &[
            "reggaeton", "bachata", "salsa", "merengue", "cumbia", "latin pop", "latin rock",
            "latin alternative", "spanish pop", "mexican", "argentinian", "brazilian",
        ],
    ),
    (
        "country",
        &["country pop", "country rock", "country alternative", "americana", "bluegrass", "country music"],
    ),
    (
        "metal",
        &["death metal", "black metal", "heavy metal", "thrash metal", "metalcore", "doom metal", "power metal"],
    ),
    (
        "electronic",
        &["edm", "house music", "techno", "dubstep", "trance", "drum and bass", "synthpop", "synthwave"],
    ),
    (
        "hip-hop",
        &["hip hop", "hip-hop", "rap music", "trap music", "gangsta rap", "conscious rap", "old school rap"],
    ),
    (
        "classical",
        &["classical music", "orchestral", "symphony", "opera", "baroque", "romantic classical", "film score"],
    ),
];

/// Substring keywords per bucket, used for scoring
pub const GENRE_MAPPINGS: &[(&str, &[&str])] = &[
    (
        "asian",
        &[
            "k-pop", "kpop", "korean", "j-pop", "jpop", "japanese", "c-pop", "cpop", "chinese",
            "mandopop", "cantopop", "thai", "vietnamese", "indonesian", "filipino",
        ],
    ),
    (
        "latin",
        &[
            "latin", "spanish", "reggaeton", "bachata", "salsa", "merengue", "cumbia", "mexican",
            "argentinian", "brazilian", "portuguese", "bossa nova",
        ],
    ),
    (
        "electronic",
        &[
            "electronic", "edm", "house", "techno", "dubstep", "trance", "drum and bass", "synthpop",
            "synthwave", "ambient", "dance", "electronica",
        ],
    ),
    (
        "rock",
        &[
            "rock", "alternative rock", "indie rock", "classic rock", "hard rock", "punk rock",
            "grunge", "garage rock", "progressive rock",
        ],
    ),
    (
        "metal",
        &[
            "metal", "heavy metal", "death metal", "black metal", "thrash metal", "metalcore",
            "hardcore", "doom metal", "power metal",
        ],
    ),
    ("pop", &["pop", "pop rock", "electropop", "dance pop", "teen pop", "bubblegum pop"]),
    (
        "hip-hop",
        &["hip-hop", "rap", "hip hop", "trap", "gangsta rap", "conscious rap", "old school rap"],
    ),
    ("r&b", &["r&b", "rnb", "soul", "neo-soul", "contemporary r&b", "motown", "funk"]),
    ("soul", &["soul", "neo-soul", "motown", "funk", "r&b", "rnb"]),
    ("country", &["country", "americana", "bluegrass", "western", "country rock"]),
    ("folk", &["folk", "acoustic", "singer-songwriter", "indie folk", "folk rock"]),
    ("indie", &["indie", "independent", "alternative", "indie pop", "indie folk", "indie rock"]),
    ("classical", &["classical", "orchestral", "symphony", "opera", "baroque", "romantic"]),
    ("orchestral", &["orchestral", "soundtrack", "film score", "video game music", "ost"]),
    ("ost", &["soundtrack", "film score", "video game music", "ost", "original soundtrack"]),
    (
        "world",
        &[
            "world", "african", "middle eastern", "celtic", "folk", "traditional", "ethnic", "tribal",
            "indigenous",
        ],
    ),
];
