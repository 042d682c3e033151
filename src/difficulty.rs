use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Bounds for a user-adjusted word count.
pub const WORD_COUNT_RANGE: RangeInclusive<usize> = 25..=70;

/// Named tier controlling the word pool and default word count
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Alphanumeric,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Alphanumeric,
    ];

    pub fn default_word_count(&self) -> usize {
        match self {
            Difficulty::Easy => 75,
            Difficulty::Medium => 45,
            Difficulty::Hard => 28,
            Difficulty::Alphanumeric => 25,
        }
    }

    /// Name used on the wire and for pool files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Alphanumeric => "alphanumeric",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

pub fn clamp_word_count(count: usize) -> usize {
    count.clamp(*WORD_COUNT_RANGE.start(), *WORD_COUNT_RANGE.end())
}
