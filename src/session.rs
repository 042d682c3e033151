use crate::difficulty::Difficulty;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No words loaded yet, or a regeneration is in flight
    Idle,
    Active,
    Completed,
}

/// One timed typing attempt over a fixed sequence of target words
#[derive(Debug, Clone)]
pub struct Session {
    /// Lifecycle generation the words were requested for
    pub generation: u64,
    pub difficulty: Difficulty,
    target_words: Vec<Vec<char>>,
    pub word_index: usize,
    pub char_index: usize,
    pub started_at: Option<Instant>,
    pub correct_chars: usize,
    pub errors: usize,
    pub status: SessionStatus,
}

impl Session {
    /// An empty session waiting for words.
    pub fn idle(generation: u64, difficulty: Difficulty) -> Self {
        Self {
            generation,
            difficulty,
            target_words: Vec::new(),
            word_index: 0,
            char_index: 0,
            started_at: None,
            correct_chars: 0,
            errors: 0,
            status: SessionStatus::Idle,
        }
    }

    pub fn new(generation: u64, difficulty: Difficulty, words: Vec<String>) -> Self {
        Self {
            target_words: words.iter().map(|w| w.chars().collect()).collect(),
            status: SessionStatus::Active,
            ..Self::idle(generation, difficulty)
        }
    }

    pub fn len(&self) -> usize {
        self.target_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_words.is_empty()
    }

    pub fn target_words(&self) -> impl Iterator<Item = String> + '_ {
        self.target_words.iter().map(|w| w.iter().collect())
    }

    /// The word under the cursor, `None` once every word has been typed.
    pub fn current_word(&self) -> Option<&[char]> {
        self.target_words.get(self.word_index).map(Vec::as_slice)
    }

    pub fn word_len(&self, index: usize) -> usize {
        self.target_words.get(index).map_or(0, Vec::len)
    }

    pub fn is_exhausted(&self) -> bool {
        !self.target_words.is_empty() && self.word_index >= self.target_words.len()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn typed_chars(&self) -> usize {
        self.correct_chars + self.errors
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            generation: self.generation,
            difficulty: self.difficulty,
            word_count: self.target_words.len(),
            started_at: self.started_at,
            correct_chars: self.correct_chars,
            errors: self.errors,
        }
    }
}

/// Immutable copy of the counters handed to deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub difficulty: Difficulty,
    pub word_count: usize,
    pub started_at: Option<Instant>,
    pub correct_chars: usize,
    pub errors: usize,
}
