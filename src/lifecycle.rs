//! Session lifecycle: `Idle -> Active -> Completed -> (new session)`.
//!
//! The controller never performs IO. Regeneration hands out a [`WordTicket`]
//! tagged with the session generation it was issued for; whoever fetched the
//! words returns the ticket with them, and anything that no longer matches the
//! current generation or settings is discarded.

use crate::difficulty::{clamp_word_count, Difficulty};
use crate::leaderboard::ScoreSubmission;
use crate::metrics::{self, BestWpm, FinalMetrics, SessionStats};
use crate::session::{Session, SessionStatus};
use crate::typing_policy::{apply_key, KeyOutcome, Keystroke};
use log::{debug, info, warn};
use std::time::Instant;

/// Why a new word list is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Refresh,
    SettingsChanged,
    AutoRestart,
}

/// An outstanding word request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTicket {
    pub generation: u64,
    pub difficulty: Difficulty,
    pub word_count: usize,
    pub prior: Option<SessionStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordsOutcome {
    Accepted,
    /// Superseded response; `reissue` carries a replacement request when the
    /// settings moved on while it was in flight
    Stale { reissue: Option<WordTicket> },
    Empty,
}

/// Produced exactly once per finished session
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub metrics: FinalMetrics,
    pub stats: SessionStats,
    pub new_best: bool,
    /// `None` when no username is known
    pub submission: Option<ScoreSubmission>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyReport {
    pub outcome: KeyOutcome,
    pub completion: Option<Completion>,
}

#[derive(Debug)]
pub struct Lifecycle {
    difficulty: Difficulty,
    /// Count picked by the user; the difficulty's default applies when unset
    word_count: Option<usize>,
    session: Session,
    generation: u64,
    in_flight: Option<WordTicket>,
    completing: bool,
    carry_over: Option<SessionStats>,
    last_metrics: Option<FinalMetrics>,
    best: BestWpm,
    username: Option<String>,
}

impl Lifecycle {
    /// A controller with a fixed, user-chosen word count.
    pub fn new(difficulty: Difficulty, word_count: usize) -> Self {
        Self::with_word_count(difficulty, Some(word_count))
    }

    /// A controller whose word count follows the current difficulty.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self::with_word_count(difficulty, None)
    }

    fn with_word_count(difficulty: Difficulty, word_count: Option<usize>) -> Self {
        Self {
            difficulty,
            word_count,
            session: Session::idle(0, difficulty),
            generation: 0,
            in_flight: None,
            completing: false,
            carry_over: None,
            last_metrics: None,
            best: BestWpm::default(),
            username: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn word_count(&self) -> usize {
        self.word_count.unwrap_or_else(|| self.difficulty.default_word_count())
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn carry_over(&self) -> Option<&SessionStats> {
        self.carry_over.as_ref()
    }

    /// Final figures of the most recent completed session, kept across resets.
    pub fn last_metrics(&self) -> Option<&FinalMetrics> {
        self.last_metrics.as_ref()
    }

    pub fn best_wpm(&self) -> u32 {
        self.best.get()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    pub fn live_wpm(&self, now: Instant) -> u32 {
        metrics::live_wpm(&self.session.snapshot(), now)
    }

    /// Starts a regeneration, resetting the session to `Idle`. Returns `None`
    /// when a request is already in flight (the trigger is dropped, not
    /// queued) or when an automatic restart no longer applies.
    pub fn request_words(&mut self, trigger: Trigger) -> Option<WordTicket> {
        if let Some(pending) = &self.in_flight {
            debug!(
                "{trigger:?} dropped, generation {} still in flight",
                pending.generation
            );
            return None;
        }
        if trigger == Trigger::AutoRestart && self.session.status != SessionStatus::Completed {
            debug!("auto restart skipped, session already replaced");
            return None;
        }

        self.generation += 1;
        self.session = Session::idle(self.generation, self.difficulty);
        let ticket = WordTicket {
            generation: self.generation,
            difficulty: self.difficulty,
            word_count: self.word_count(),
            prior: self.carry_over,
        };
        debug!(
            "{trigger:?}: requesting {} {} words for generation {}",
            ticket.word_count, ticket.difficulty, ticket.generation
        );
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Option<WordTicket> {
        if difficulty == self.difficulty {
            return None;
        }
        self.difficulty = difficulty;
        self.request_words(Trigger::SettingsChanged)
    }

    pub fn set_word_count(&mut self, word_count: usize) -> Option<WordTicket> {
        let word_count = clamp_word_count(word_count);
        if word_count == self.word_count() {
            return None;
        }
        self.word_count = Some(word_count);
        self.request_words(Trigger::SettingsChanged)
    }

    /// Installs fetched words if `ticket` is still the outstanding request.
    pub fn words_ready(&mut self, ticket: &WordTicket, words: Vec<String>) -> WordsOutcome {
        if self.in_flight.as_ref() != Some(ticket) {
            warn!(
                "discarding words for generation {}, not the pending request",
                ticket.generation
            );
            return WordsOutcome::Stale { reissue: None };
        }
        self.in_flight = None;

        if ticket.difficulty != self.difficulty || ticket.word_count != self.word_count() {
            warn!(
                "discarding {} words for generation {}, settings changed",
                ticket.difficulty, ticket.generation
            );
            let reissue = self.request_words(Trigger::SettingsChanged);
            return WordsOutcome::Stale { reissue };
        }
        if words.is_empty() {
            warn!("generation {} received no words", ticket.generation);
            return WordsOutcome::Empty;
        }

        self.session = Session::new(ticket.generation, ticket.difficulty, words);
        self.completing = false;
        info!(
            "session {} ready: {} {} words",
            ticket.generation,
            self.session.len(),
            ticket.difficulty
        );
        WordsOutcome::Accepted
    }

    /// Feeds one key to the active session; completes it when the last word is done.
    pub fn on_key(&mut self, key: impl Into<Keystroke>, now: Instant) -> KeyReport {
        if self.session.status != SessionStatus::Active {
            return KeyReport {
                outcome: KeyOutcome::Ignored,
                completion: None,
            };
        }

        let outcome = apply_key(&mut self.session, key.into(), now);
        let completion = if self.session.is_exhausted() && !self.completing {
            Some(self.complete(now))
        } else {
            None
        };

        KeyReport {
            outcome,
            completion,
        }
    }

    fn complete(&mut self, now: Instant) -> Completion {
        self.completing = true;
        self.session.status = SessionStatus::Completed;

        let snapshot = self.session.snapshot();
        let metrics = FinalMetrics::compute(&snapshot, now);
        let stats = SessionStats::from(&metrics);
        let new_best = self.best.record(metrics.wpm);
        self.carry_over = Some(stats);
        self.last_metrics = Some(metrics);

        info!(
            "session {} complete: {} wpm, {}% accuracy, {} errors",
            snapshot.generation, metrics.wpm, metrics.accuracy, metrics.errors
        );

        let submission = self.username.clone().map(|username| ScoreSubmission {
            difficulty: snapshot.difficulty,
            username,
            wpm: metrics.wpm,
        });
        if submission.is_none() {
            warn!("no username known for session {}", snapshot.generation);
        }

        Completion {
            metrics,
            stats,
            new_best,
            submission,
        }
    }
}
