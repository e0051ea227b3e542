//! Lookup variants for artist names
//!
//! Providers spell artists inconsistently (romanization, Hangul/kana, stylized
//! punctuation). `name_variants` produces an ordered list of spellings to try,
//! most likely first.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Coarse artist origin, used to pick variant strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistType {
    Kpop,
    Jpop,
    Western,
}

/// Curated spellings known to resolve on the providers, keyed by uppercase name
static KNOWN_PATTERNS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    // K-pop groups
    m.insert("IVE", &["IVE (아이브)", "아이브"]);
    m.insert("TWICE", &["TWICE (트와이스)", "트와이스"]);
    m.insert("BLACKPINK", &["BLACKPINK (블랙핑크)", "블랙핑크"]);
    m.insert("BTS", &["BTS (방탄소년단)", "방탄소년단"]);
    m.insert("STRAY KIDS", &["Stray Kids (스트레이 키즈)", "스트레이 키즈"]);
    m.insert("NEWJEANS", &["NewJeans (뉴진스)", "뉴진스"]);
    m.insert("LE SSERAFIM", &["LE SSERAFIM (르세라핌)", "르세라핌"]);
    m.insert("AESPA", &["aespa (에스파)", "에스파"]);
    m.insert("ITZY", &["ITZY (있지)", "있지"]);
    m.insert("(G)I-DLE", &["(G)I-DLE ((여자)아이들)", "(여자)아이들"]);
    m.insert("SEVENTEEN", &["SEVENTEEN (세븐틴)", "세븐틴"]);
    m.insert("ENHYPEN", &["ENHYPEN (엔하이픈)", "엔하이픈"]);
    m.insert("ARTMS", &["ARTMS (아르테미스)", "아르테미스"]);
    m.insert("ILLIT", &["ILLIT (아일릿)", "아일릿"]);
    // K-pop soloists
    m.insert("ANYUJIN", &["An Yujin", "ANYUJIN (IVE)", "Ahn Yujin", "Ahn Yu-jin"]);
    m.insert("JEON SOMI", &["SOMI", "Somi"]);
    m.insert("KISS OF LIFE", &["KOL", "Kiss Of Life"]);
    m.insert("SUNMI", &["Lee Sun-mi", "SUNMI (선미)", "선미"]);
    m.insert("MIYEON", &["Cho Mi-yeon", "미연", "MIYEON ((G)I-DLE)", "Mi-yeon"]);
    // Japanese
    m.insert("AIMYON", &["Aimyon", "あいみょん", "aimyon"]);
    m.insert("YOASOBI", &["YOASOBI (ヨアソビ)", "ヨアソビ", "yoasobi"]);
    m.insert("ヨルシカ", &["Yorushika", "YORUSHIKA"]);
    m.insert("YORUSHIKA", &["ヨルシカ", "Yorushika"]);
    m.insert("YUIKA", &["ユイカ", "Yuika", "yuika"]);
    // Western stylizations
    m.insert("TWENTY ONE PILOTS", &["twenty one pilots", "21 Pilots", "Twenty One Pilots"]);
    m.insert("BRING ME THE HORIZON", &["BMTH", "Bring Me the Horizon"]);
    m.insert("MY CHEMICAL ROMANCE", &["MCR", "My Chemical Romance"]);
    m.insert("PANIC! AT THE DISCO", &["P!ATD", "Panic at the Disco", "Panic! At The Disco"]);
    m.insert("P!NK", &["Pink", "P!nk"]);
    m.insert("KE$HA", &["Kesha", "Ke$ha"]);
    m.insert("BBNO$", &["bbno$", "Baby No Money"]);
    m.insert("MGK", &["Machine Gun Kelly", "mgk"]);
    m.insert("A$AP ROCKY", &["ASAP Rocky", "A$AP Rocky"]);
    m.insert("88RISING", &["88rising", "88 Rising"]);
    m
});

/// Short indicators that only count as a whole word ("IVE" must not match "OLIVER")
const KOREAN_WORD_INDICATORS: [&str; 2] = ["IVE", "BTS"];

const KOREAN_INDICATORS: [&str; 14] = [
    "TWICE", "BLACKPINK", "STRAY", "NEWJEANS", "AESPA", "SEVENTEEN", "ENHYPEN",
    "ITZY", "SSERAFIM", "ARTMS", "ILLIT", "SOMI", "YUJIN", "KISS OF LIFE",
];

const JAPANESE_INDICATORS: [&str; 4] = ["YOASOBI", "YORUSHIKA", "BABYMETAL", "PERFUME"];

fn is_hangul(c: char) -> bool {
    ('\u{AC00}'..='\u{D7AF}').contains(&c)
}

fn is_japanese(c: char) -> bool {
    ('\u{3040}'..='\u{30FF}').contains(&c) || ('\u{4E00}'..='\u{9FAF}').contains(&c)
}

/// Guess an artist's origin from indicator names and script
pub fn detect_artist_type(name: &str) -> ArtistType {
    let upper = name.to_uppercase();

    let has_word = |word: &str| upper.split(|c: char| !c.is_alphanumeric()).any(|w| w == word);

    if KOREAN_WORD_INDICATORS.iter().any(|i| has_word(*i)) || KOREAN_INDICATORS.iter().any(|i| upper.contains(i)) {
        return ArtistType::Kpop;
    }
    if JAPANESE_INDICATORS.iter().any(|i| upper.contains(i)) || name.chars().any(is_japanese) {
        return ArtistType::Jpop;
    }
    if name.chars().any(is_hangul) {
        return ArtistType::Kpop;
    }
    ArtistType::Western
}

/// Ordered, de-duplicated spellings to try when looking an artist up
///
/// Priority: exact → curated patterns → origin-specific → abbreviations → basic transforms.
pub fn name_variants(name: &str) -> Vec<String> {
    let clean = name.trim();
    if clean.is_empty() {
        return vec![name.to_string()];
    }

    let mut variants = vec![clean.to_string()];

    if let Some(known) = KNOWN_PATTERNS.get(clean.to_uppercase().as_str()) {
        variants.extend(known.iter().map(|s| s.to_string()));
    }

    match detect_artist_type(clean) {
        ArtistType::Kpop => variants.extend([
            format!("{} (K-pop)", clean),
            format!("{} (Korean)", clean),
            title_case(clean),
            clean.to_lowercase(),
        ]),
        ArtistType::Jpop => variants.extend([
            format!("{} (Japanese)", clean),
            format!("{} (J-pop)", clean),
            clean.to_lowercase(),
            title_case(clean),
        ]),
        ArtistType::Western => variants.extend([
            title_case(clean),
            clean.to_lowercase(),
            clean.to_uppercase(),
        ]),
    }

    let words: Vec<&str> = clean.split_whitespace().collect();
    if words.len() > 1 {
        let initials: String = words
            .iter()
            .filter_map(|w| w.chars().next())
            .flat_map(|c| c.to_uppercase())
            .collect();
        variants.push(initials);
        variants.push(words[0].to_string());
        variants.push(words[words.len() - 1].to_string());
    }

    variants.extend(basic_transformations(clean));

    let mut unique: Vec<String> = Vec::with_capacity(variants.len());
    for v in variants {
        if !v.is_empty() && !unique.contains(&v) {
            unique.push(v);
        }
    }
    unique
}

fn basic_transformations(name: &str) -> Vec<String> {
    let mut out = Vec::new();

    match name.get(..4).zip(name.get(4..)) {
        Some((head, rest)) if head.eq_ignore_ascii_case("the ") => out.push(rest.to_string()),
        _ => out.push(format!("The {}", name)),
    }

    let no_punct: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    if no_punct != name {
        out.push(no_punct);
    }

    if name.contains('&') {
        out.push(name.replace('&', "and"));
    }

    out
}

/// Capitalize the first letter of each word, lowercase the rest
fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
