use crate::difficulty::Difficulty;
use crate::error::{ApiError, LeaderboardError};
use async_trait::async_trait;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Entries kept per difficulty
pub const BOARD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wpm: u32,
}

/// A validated score ready to merge or send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub difficulty: Difficulty,
    pub username: String,
    pub wpm: u32,
}

/// A score as it arrives on the wire, every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreRequest {
    pub difficulty: Option<String>,
    pub username: Option<String>,
    pub wpm: Option<f64>,
}

impl TryFrom<ScoreRequest> for ScoreSubmission {
    type Error = LeaderboardError;

    fn try_from(req: ScoreRequest) -> Result<Self, Self::Error> {
        let difficulty = req
            .difficulty
            .filter(|d| !d.is_empty())
            .ok_or(LeaderboardError::MissingField("difficulty"))?;
        let username = req
            .username
            .filter(|u| !u.trim().is_empty())
            .ok_or(LeaderboardError::MissingField("username"))?;
        let wpm = req
            .wpm
            .filter(|w| w.is_finite())
            .ok_or(LeaderboardError::MissingField("wpm"))?;
        let difficulty = difficulty
            .parse::<Difficulty>()
            .map_err(LeaderboardError::UnknownDifficulty)?;

        Ok(Self {
            difficulty,
            username,
            wpm: wpm.round().max(0.0) as u32,
        })
    }
}

/// Leaderboard fetch shape: best first, at most [`BOARD_SIZE`] per difficulty
pub type Standings = BTreeMap<Difficulty, Vec<LeaderboardEntry>>;

/// Top scores per difficulty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    buckets: Standings,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self {
            buckets: Difficulty::ALL.into_iter().map(|d| (d, Vec::new())).collect(),
        }
    }
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, difficulty: Difficulty) -> &[LeaderboardEntry] {
        self.buckets
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn standings(&self) -> Standings {
        self.buckets.clone()
    }

    /// Keeps each user's best, sorted descending, top [`BOARD_SIZE`] only.
    pub fn record(&mut self, score: &ScoreSubmission) -> &[LeaderboardEntry] {
        let bucket = self.buckets.entry(score.difficulty).or_default();

        match bucket.iter().position(|e| e.username == score.username) {
            Some(i) => bucket[i].wpm = bucket[i].wpm.max(score.wpm),
            None => bucket.push(LeaderboardEntry {
                username: score.username.clone(),
                wpm: score.wpm,
            }),
        }
        bucket.sort_by(|a, b| b.wpm.cmp(&a.wpm));
        bucket.truncate(BOARD_SIZE);

        debug!(
            "leaderboard {} now has {} entries",
            score.difficulty,
            bucket.len()
        );
        bucket
    }

    pub fn submit(&mut self, req: ScoreRequest) -> Result<&[LeaderboardEntry], LeaderboardError> {
        let score = ScoreSubmission::try_from(req)?;
        Ok(self.record(&score))
    }
}

/// Plain-text rendering, one section per difficulty.
pub fn format_standings(standings: &Standings) -> String {
    Difficulty::ALL
        .iter()
        .map(|d| {
            let entries = standings.get(d).map(Vec::as_slice).unwrap_or_default();
            let body = if entries.is_empty() {
                "  no records yet".to_string()
            } else {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("  #{} {} {} wpm", i + 1, e.username, e.wpm))
                    .join("\n")
            };
            format!("{d}\n{body}")
        })
        .join("\n\n")
}

/// Destination for completed-session scores
#[async_trait]
pub trait ScoreSink: Send + Sync {
    async fn submit(&self, score: &ScoreSubmission) -> Result<(), ApiError>;
}

/// In-process leaderboard used when no server is configured
#[derive(Debug, Default)]
pub struct LocalLeaderboard {
    board: Mutex<Leaderboard>,
}

impl LocalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standings(&self) -> Standings {
        self.board
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .standings()
    }
}

#[async_trait]
impl ScoreSink for LocalLeaderboard {
    async fn submit(&self, score: &ScoreSubmission) -> Result<(), ApiError> {
        self.board
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(score);
        Ok(())
    }
}
