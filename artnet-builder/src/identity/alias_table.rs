//! Curated artist identities
//!
//! Cross-script aliases and group membership for artists whose names providers
//! routinely disagree on. Aliases are stored lowercase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One canonical artist with every known spelling and its group relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistIdentity {
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// Groups this artist belongs to
    #[serde(default)]
    pub group_memberships: BTreeSet<String>,
    /// Members, if this identity is a group
    #[serde(default)]
    pub members: BTreeSet<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl ArtistIdentity {
    pub fn new(canonical_name: &str) -> Self {
        Self {
            canonical_name: canonical_name.to_string(),
            aliases: BTreeSet::new(),
            group_memberships: BTreeSet::new(),
            members: BTreeSet::new(),
            confidence: default_confidence(),
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_lowercase()));
        self
    }

    pub fn member_of(mut self, groups: &[&str]) -> Self {
        self.group_memberships.extend(groups.iter().map(|g| g.to_string()));
        self
    }

    pub fn members(mut self, members: &[&str]) -> Self {
        self.members.extend(members.iter().map(|m| m.to_string()));
        self
    }
}

/// Built-in identity records
pub fn curated_identities() -> Vec<ArtistIdentity> {
    vec![
        ArtistIdentity::new("IVE")
            .aliases(&[
                "ive",
                "아이브",
                "ive (아이브)",
                "ive 아이브",
                "i*ve",
                "아이브 (ive)",
                "ive (girl group)",
            ])
            .members(&[
                "anyujin",
                "안유진",
                "ahn yujin",
                "ahn yu-jin",
                "jang wonyoung",
                "장원영",
                "wonyoung",
                "rei",
                "레이",
                "naoi rei",
                "gaeul",
                "가을",
                "liz",
                "리즈",
                "leeseo",
                "이서",
            ]),
        ArtistIdentity::new("ANYUJIN")
            .aliases(&[
                "anyujin",
                "안유진",
                "ahn yujin",
                "ahn yu-jin",
                "ahn yu jin",
                "안유진 (ive)",
                "anyujin (ive)",
                "yujin",
                "유진",
                "an yujin",
                "anyujin ive",
            ])
            .member_of(&["IVE"]),
        ArtistIdentity::new("IZ*ONE")
            .aliases(&[
                "iz*one",
                "izone",
                "아이즈원",
                "iz*one 아이즈원",
                "izone アイズワン",
                "iz*one (아이즈원)",
            ])
            .members(&[
                "안유진",
                "장원영",
                "조유리",
                "최예나",
                "김채원",
                "권은비",
                "이채연",
                "야마구치 나코",
                "혼다 히토미",
                "강혜원",
                "김민주",
            ]),
        ArtistIdentity::new("TWICE")
            .aliases(&["twice", "트와이스", "twice 트와이스"])
            .members(&[
                "nayeon", "jeongyeon", "momo", "sana", "jihyo", "mina", "dahyun", "chaeyoung",
                "tzuyu",
            ]),
        ArtistIdentity::new("ITZY")
            .aliases(&["itzy", "있지", "itzy 있지"])
            .members(&["yeji", "lia", "ryujin", "chaeryeong", "yuna"]),
        ArtistIdentity::new("(G)I-DLE")
            .aliases(&["(g)i-dle", "gidle", "여자아이들", "(여자)아이들", "girl idle"])
            .members(&["soyeon", "miyeon", "minnie", "shuhua", "yuqi"]),
    ]
}
