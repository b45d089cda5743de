//! Preference tiers and their rating bands
//!
//! Three fixed tiers, each mapped to a closed rating interval. The bands are
//! configuration constants; ratings are always derived from position within
//! the band, never stored.

use serde::{Deserialize, Serialize};

/// Preference tier for a shelved book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Beloved,
    Tolerated,
    Disliked,
}

impl Tier {
    /// All tiers in display order (best band first)
    pub const ALL: [Tier; 3] = [Tier::Beloved, Tier::Tolerated, Tier::Disliked];

    /// Closed rating interval `(base, max)` for this tier
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Tier::Beloved => (7.5, 10.0),
            Tier::Tolerated => (4.5, 7.0),
            Tier::Disliked => (1.0, 4.0),
        }
    }

    /// Database / API string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Beloved => "beloved",
            Tier::Tolerated => "tolerated",
            Tier::Disliked => "disliked",
        }
    }

    /// Parse from the string form, None for unknown names
    pub fn from_str(s: &str) -> Option<Tier> {
        match s {
            "beloved" => Some(Tier::Beloved),
            "tolerated" => Some(Tier::Tolerated),
            "disliked" => Some(Tier::Disliked),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
