use super::core::WordPools;
use super::selector::{RandomSelector, WordSelector};
use crate::difficulty::Difficulty;
use crate::error::SupplyError;
use crate::metrics::SessionStats;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of a remote word-generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub difficulty: Difficulty,
    pub accuracy: u32,
    pub wpm: u32,
    pub errors: usize,
    pub word_count: usize,
}

impl GenerateRequest {
    pub fn new(difficulty: Difficulty, word_count: usize, stats: &SessionStats) -> Self {
        Self {
            difficulty,
            accuracy: stats.accuracy,
            wpm: stats.wpm,
            errors: stats.errors,
            word_count,
        }
    }
}

/// Remote generator of adaptive word lists
#[async_trait]
pub trait WordSource: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<String>, SupplyError>;
}

/// Reject anything that is not a clean list of single words.
pub fn validate_words(words: Vec<String>) -> Result<Vec<String>, SupplyError> {
    if words.is_empty() {
        return Err(SupplyError::Malformed("empty word list".into()));
    }
    if let Some(bad) = words
        .iter()
        .find(|w| w.is_empty() || w.chars().any(|c| c.is_whitespace() || c.is_control()))
    {
        return Err(SupplyError::Malformed(format!("invalid word {bad:?}")));
    }
    Ok(words)
}

/// Produces the target words for a session
#[derive(Clone)]
pub struct WordSupply {
    pools: Arc<WordPools>,
    remote: Option<Arc<dyn WordSource>>,
}

impl WordSupply {
    pub fn new(pools: WordPools) -> Self {
        Self {
            pools: Arc::new(pools),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn WordSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn pools(&self) -> &WordPools {
        &self.pools
    }

    /// Exactly `word_count` words; adaptive when prior stats exist and the
    /// remote succeeds, otherwise drawn from the static pool.
    pub async fn request_words(
        &self,
        difficulty: Difficulty,
        word_count: usize,
        prior: Option<&SessionStats>,
    ) -> Vec<String> {
        let (remote, stats) = match (&self.remote, prior) {
            (Some(remote), Some(stats)) if !stats.is_first_session() => (remote, stats),
            _ => return self.static_words(difficulty, word_count),
        };

        let request = GenerateRequest::new(difficulty, word_count, stats);
        match remote.generate(&request).await.and_then(validate_words) {
            Ok(words) => {
                debug!("adaptive words generated: {}", words.len());
                self.fit_to_count(words, difficulty, word_count)
            }
            Err(err) => {
                warn!("adaptive generation failed, using static words: {err}");
                self.static_words(difficulty, word_count)
            }
        }
    }

    pub fn static_words(&self, difficulty: Difficulty, word_count: usize) -> Vec<String> {
        RandomSelector.select_words(
            self.pools.get(difficulty),
            word_count,
            &mut rand::thread_rng(),
        )
    }

    /// Truncate, or pad with static draws.
    fn fit_to_count(
        &self,
        mut words: Vec<String>,
        difficulty: Difficulty,
        word_count: usize,
    ) -> Vec<String> {
        if words.len() >= word_count {
            words.truncate(word_count);
        } else {
            let missing = word_count - words.len();
            words.extend(self.static_words(difficulty, missing));
        }
        words
    }
}
