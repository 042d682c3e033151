use crate::api::ProfileSource;
use crate::clock::{Clock, SystemClock};
use crate::difficulty::Difficulty;
use crate::leaderboard::{ScoreSink, ScoreSubmission};
use crate::lifecycle::{Completion, Lifecycle, Trigger, WordTicket, WordsOutcome};
use crate::metrics::FinalMetrics;
use crate::typing_policy::KeyOutcome;
use crate::words::WordSupply;
use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, Instant as TokioInstant};

/// Post-completion pause before the next round is requested
pub const RESTART_DELAY: Duration = Duration::from_millis(1000);

/// Input consumed by the runner, strictly in arrival order
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Key(KeyEvent),
    SetDifficulty(Difficulty),
    SetWordCount(usize),
    Refresh,
}

/// Notifications for whatever is presenting the session
#[derive(Clone, Debug, PartialEq)]
pub enum RunnerUpdate {
    Ready {
        generation: u64,
        difficulty: Difficulty,
        words: Vec<String>,
    },
    Key {
        outcome: KeyOutcome,
        word_index: usize,
        char_index: usize,
        total_words: usize,
        live_wpm: u32,
    },
    Completed(Completion),
    Submitted {
        score: ScoreSubmission,
        accepted: bool,
    },
}

/// Results of spawned network work, delivered back onto the runner loop
enum Internal {
    Words(WordTicket, Vec<String>),
    Username(String),
    Submitted(ScoreSubmission, bool),
}

/// Drives one [`Lifecycle`]: keystrokes, word fetches, score submission and
/// the restart timer all funnel through a single select loop, so nothing
/// mutates the session concurrently and network calls never block typing.
pub struct Runner {
    lifecycle: Lifecycle,
    supply: WordSupply,
    scores: Option<Arc<dyn ScoreSink>>,
    profile: Option<Arc<dyn ProfileSource>>,
    clock: Arc<dyn Clock>,
    restart_delay: Duration,
    updates: Option<UnboundedSender<RunnerUpdate>>,
    /// Latest result that completed before any username was known
    unsubmitted: Option<FinalMetrics>,
    internal_tx: UnboundedSender<Internal>,
    internal_rx: UnboundedReceiver<Internal>,
}

impl Runner {
    pub fn new(lifecycle: Lifecycle, supply: WordSupply) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            lifecycle,
            supply,
            scores: None,
            profile: None,
            clock: Arc::new(SystemClock),
            restart_delay: RESTART_DELAY,
            updates: None,
            unsubmitted: None,
            internal_tx,
            internal_rx,
        }
    }

    pub fn with_scores(mut self, scores: Arc<dyn ScoreSink>) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn with_profile(mut self, profile: Arc<dyn ProfileSource>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_updates(mut self, updates: UnboundedSender<RunnerUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Runs until `events` is closed, then hands the lifecycle back.
    pub async fn run(mut self, mut events: UnboundedReceiver<SessionEvent>) -> Lifecycle {
        if self.lifecycle.username().is_none() {
            self.fetch_username();
        }
        if let Some(ticket) = self.lifecycle.request_words(Trigger::Startup) {
            self.fetch_words(ticket);
        }

        let mut restart_at: Option<TokioInstant> = None;
        loop {
            let deadline = restart_at;
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, &mut restart_at),
                    None => break,
                },
                Some(msg) = self.internal_rx.recv() => self.handle_internal(msg),
                _ = sleep_until(deadline.unwrap_or_else(TokioInstant::now)), if deadline.is_some() => {
                    restart_at = None;
                    if let Some(ticket) = self.lifecycle.request_words(Trigger::AutoRestart) {
                        self.fetch_words(ticket);
                    }
                }
            }
        }

        self.lifecycle
    }

    fn handle_event(&mut self, event: SessionEvent, restart_at: &mut Option<TokioInstant>) {
        let ticket = match event {
            SessionEvent::Key(key) => {
                self.handle_key(key, restart_at);
                return;
            }
            SessionEvent::SetDifficulty(difficulty) => self.lifecycle.set_difficulty(difficulty),
            SessionEvent::SetWordCount(count) => self.lifecycle.set_word_count(count),
            SessionEvent::Refresh => self.lifecycle.request_words(Trigger::Refresh),
        };
        if let Some(ticket) = ticket {
            self.fetch_words(ticket);
        }
        if self.lifecycle.is_generating() {
            *restart_at = None;
        }
    }

    fn handle_key(&mut self, key: KeyEvent, restart_at: &mut Option<TokioInstant>) {
        let now = self.clock.now();
        let report = self.lifecycle.on_key(key, now);
        if report.outcome == KeyOutcome::Ignored {
            return;
        }

        let session = self.lifecycle.session();
        self.emit(RunnerUpdate::Key {
            outcome: report.outcome,
            word_index: session.word_index,
            char_index: session.char_index,
            total_words: session.len(),
            live_wpm: self.lifecycle.live_wpm(now),
        });

        if let Some(completion) = report.completion {
            match completion.submission.clone() {
                Some(score) => self.submit_score(score),
                // ask again; the score goes out once the name arrives
                None if self.profile.is_some() => {
                    self.unsubmitted = Some(completion.metrics);
                    self.fetch_username();
                }
                None => {}
            }
            self.emit(RunnerUpdate::Completed(completion));
            *restart_at = Some(TokioInstant::now() + self.restart_delay);
        }
    }

    fn handle_internal(&mut self, msg: Internal) {
        match msg {
            Internal::Words(ticket, words) => match self.lifecycle.words_ready(&ticket, words) {
                WordsOutcome::Accepted => {
                    let session = self.lifecycle.session();
                    self.emit(RunnerUpdate::Ready {
                        generation: session.generation,
                        difficulty: session.difficulty,
                        words: session.target_words().collect(),
                    });
                }
                WordsOutcome::Stale {
                    reissue: Some(ticket),
                } => self.fetch_words(ticket),
                WordsOutcome::Stale { reissue: None } | WordsOutcome::Empty => {}
            },
            Internal::Username(username) => {
                debug!("scores will be submitted as {username}");
                self.lifecycle.set_username(username.clone());
                if let Some(metrics) = self.unsubmitted.take() {
                    self.submit_score(ScoreSubmission {
                        difficulty: metrics.difficulty,
                        username,
                        wpm: metrics.wpm,
                    });
                }
            }
            Internal::Submitted(score, accepted) => {
                self.emit(RunnerUpdate::Submitted { score, accepted });
            }
        }
    }

    fn fetch_words(&self, ticket: WordTicket) {
        let supply = self.supply.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let words = supply
                .request_words(ticket.difficulty, ticket.word_count, ticket.prior.as_ref())
                .await;
            let _ = tx.send(Internal::Words(ticket, words));
        });
    }

    fn fetch_username(&self) {
        let Some(profile) = self.profile.clone() else {
            return;
        };
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            match profile.username().await {
                Ok(username) => {
                    let _ = tx.send(Internal::Username(username));
                }
                Err(err) => warn!("error fetching username: {err}"),
            }
        });
    }

    fn submit_score(&self, score: ScoreSubmission) {
        let Some(sink) = self.scores.clone() else {
            return;
        };
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let accepted = match sink.submit(&score).await {
                Ok(()) => {
                    debug!("leaderboard updated for {}", score.username);
                    true
                }
                Err(err) => {
                    warn!("error updating leaderboard: {err}");
                    false
                }
            };
            let _ = tx.send(Internal::Submitted(score, accepted));
        });
    }

    fn emit(&self, update: RunnerUpdate) {
        if let Some(updates) = &self.updates {
            let _ = updates.send(update);
        }
    }
}

/// What a terminal key means to the application
#[derive(Clone, Debug, PartialEq)]
pub enum TerminalInput {
    Session(SessionEvent),
    Quit,
}

/// Esc or ctrl+c quits, tab refreshes, F1-F4 pick a difficulty; everything
/// else goes to the typing session.
pub fn map_terminal_key(key: KeyEvent) -> TerminalInput {
    match key.code {
        KeyCode::Esc => TerminalInput::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => TerminalInput::Quit,
        KeyCode::Tab => TerminalInput::Session(SessionEvent::Refresh),
        KeyCode::F(n @ 1..=4) => {
            TerminalInput::Session(SessionEvent::SetDifficulty(Difficulty::ALL[n as usize - 1]))
        }
        _ => TerminalInput::Session(SessionEvent::Key(key)),
    }
}

/// Production event source: a reader thread forwarding crossterm keys until
/// quit is requested or the runner goes away.
pub fn spawn_terminal_events(tx: UnboundedSender<SessionEvent>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => match map_terminal_key(key) {
                TerminalInput::Quit => break,
                TerminalInput::Session(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            },
            Ok(_) => {}
            Err(_) => break,
        }
    })
}
