use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use typesto::api::ProfileSource;
use typesto::clock::ManualClock;
use typesto::difficulty::Difficulty;
use typesto::error::ApiError;
use typesto::leaderboard::LocalLeaderboard;
use typesto::lifecycle::Lifecycle;
use typesto::metrics::net_wpm;
use typesto::runtime::{Runner, RunnerUpdate, SessionEvent};
use typesto::session::SessionStatus;
use typesto::words::{WordPools, WordSupply};

fn press(tx: &UnboundedSender<SessionEvent>, code: KeyCode) {
    tx.send(SessionEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

fn type_words(tx: &UnboundedSender<SessionEvent>, words: &[String]) {
    for word in words {
        for c in word.chars() {
            press(tx, KeyCode::Char(c));
        }
        press(tx, KeyCode::Char(' '));
    }
}

async fn next_ready(rx: &mut UnboundedReceiver<RunnerUpdate>) -> (u64, Difficulty, Vec<String>) {
    loop {
        match rx.recv().await.expect("runner hung up") {
            RunnerUpdate::Ready {
                generation,
                difficulty,
                words,
            } => return (generation, difficulty, words),
            _ => continue,
        }
    }
}

fn runner(lifecycle: Lifecycle) -> Runner {
    let supply = WordSupply::new(WordPools::embedded().unwrap());
    Runner::new(lifecycle, supply)
}

// Full round trip without a terminal: startup words, typing, completion,
// local submission and the automatic restart into the next generation.
#[tokio::test(start_paused = true)]
async fn typing_a_session_completes_submits_and_restarts() {
    let mut lifecycle = Lifecycle::new(Difficulty::Easy, 25);
    lifecycle.set_username("ana");

    let clock = Arc::new(ManualClock::new());
    let board = Arc::new(LocalLeaderboard::new());
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let runner = runner(lifecycle)
        .with_clock(clock.clone())
        .with_scores(board.clone())
        .with_restart_delay(Duration::from_millis(1000))
        .with_updates(updates_tx);
    let handle = tokio::spawn(runner.run(events_rx));

    let (generation, difficulty, words) = next_ready(&mut updates_rx).await;
    assert_eq!(generation, 1);
    assert_eq!(difficulty, Difficulty::Easy);
    assert_eq!(words.len(), 25);

    // first key starts the timer; the last space lands a minute later
    let (last, rest) = words.split_last().unwrap();
    type_words(&events_tx, rest);
    for c in last.chars() {
        press(&events_tx, KeyCode::Char(c));
    }
    let last_len = last.chars().count();
    loop {
        if let RunnerUpdate::Key {
            word_index,
            char_index,
            ..
        } = updates_rx.recv().await.expect("runner hung up")
        {
            if (word_index, char_index) == (words.len() - 1, last_len) {
                break;
            }
        }
    }
    clock.advance(Duration::from_secs(60));
    press(&events_tx, KeyCode::Char(' '));

    let mut completion = None;
    let mut submitted = None;
    while completion.is_none() || submitted.is_none() {
        match updates_rx.recv().await.expect("runner hung up") {
            RunnerUpdate::Completed(done) => completion = Some(done),
            RunnerUpdate::Submitted { score, accepted } => submitted = Some((score, accepted)),
            _ => {}
        }
    }

    let done = completion.unwrap();
    let correct: usize = words.iter().map(|w| w.chars().count()).sum();
    assert_eq!(done.metrics.correct_chars, correct);
    assert_eq!(done.metrics.errors, 0);
    assert_eq!(done.metrics.accuracy, 100);
    assert_eq!(done.metrics.wpm, net_wpm(correct, 1.0));
    assert!(done.new_best);

    let (score, accepted) = submitted.unwrap();
    assert!(accepted);
    assert_eq!(score.username, "ana");
    assert_eq!(board.standings()[&Difficulty::Easy][0].wpm, done.metrics.wpm);

    // the restart timer fires on its own and fetches the next round
    let (generation, _, words) = next_ready(&mut updates_rx).await;
    assert_eq!(generation, 2);
    assert_eq!(words.len(), 25);

    drop(events_tx);
    let lifecycle = handle.await.unwrap();
    assert_eq!(lifecycle.status(), SessionStatus::Active);
    assert_eq!(lifecycle.session().generation, 2);
    assert_eq!(lifecycle.last_metrics().unwrap().wpm, done.metrics.wpm);
    assert_eq!(lifecycle.carry_over().unwrap().wpm, done.metrics.wpm);
}

#[tokio::test(start_paused = true)]
async fn difficulty_change_replaces_the_session() {
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(
        runner(Lifecycle::new(Difficulty::Medium, 30))
            .with_updates(updates_tx)
            .run(events_rx),
    );

    let (generation, difficulty, _) = next_ready(&mut updates_rx).await;
    assert_eq!((generation, difficulty), (1, Difficulty::Medium));

    events_tx
        .send(SessionEvent::SetDifficulty(Difficulty::Hard))
        .unwrap();
    let (generation, difficulty, words) = next_ready(&mut updates_rx).await;
    assert_eq!((generation, difficulty), (2, Difficulty::Hard));
    assert_eq!(words.len(), 30);

    events_tx.send(SessionEvent::SetWordCount(40)).unwrap();
    let (generation, _, words) = next_ready(&mut updates_rx).await;
    assert_eq!(generation, 3);
    assert_eq!(words.len(), 40);

    drop(events_tx);
    let lifecycle = handle.await.unwrap();
    assert_eq!(lifecycle.difficulty(), Difficulty::Hard);
    assert_eq!(lifecycle.word_count(), 40);
}

#[tokio::test(start_paused = true)]
async fn completion_without_username_is_not_submitted() {
    let board = Arc::new(LocalLeaderboard::new());
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(
        runner(Lifecycle::new(Difficulty::Easy, 25))
            .with_scores(board.clone())
            .with_updates(updates_tx)
            .run(events_rx),
    );

    let (_, _, words) = next_ready(&mut updates_rx).await;
    type_words(&events_tx, &words);

    let done = loop {
        match updates_rx.recv().await.expect("runner hung up") {
            RunnerUpdate::Completed(done) => break done,
            RunnerUpdate::Submitted { .. } => panic!("nothing should be submitted"),
            _ => {}
        }
    };
    assert!(done.submission.is_none());

    drop(events_tx);
    handle.await.unwrap();
    assert!(board.standings().values().all(Vec::is_empty));
}

/// Profile endpoint that fails once, then answers
#[derive(Default)]
struct FlakyProfile {
    calls: AtomicUsize,
}

#[async_trait]
impl ProfileSource for FlakyProfile {
    async fn username(&self) -> Result<String, ApiError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(ApiError::Status(503)),
            _ => Ok("ana".to_string()),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failed_profile_fetch_is_retried_on_completion() {
    let profile = Arc::new(FlakyProfile::default());
    let board = Arc::new(LocalLeaderboard::new());
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(
        runner(Lifecycle::new(Difficulty::Easy, 25))
            .with_profile(profile.clone())
            .with_scores(board.clone())
            .with_updates(updates_tx)
            .run(events_rx),
    );

    let mut submitted = Vec::new();
    for round in 1..=2u64 {
        let (generation, _, words) = next_ready(&mut updates_rx).await;
        assert_eq!(generation, round);
        type_words(&events_tx, &words);

        let score = loop {
            if let RunnerUpdate::Submitted { score, accepted } =
                updates_rx.recv().await.expect("runner hung up")
            {
                assert!(accepted);
                break score;
            }
        };
        submitted.push(score);
    }

    assert!(submitted.iter().all(|s| s.username == "ana"));
    assert_eq!(profile.calls.load(Ordering::SeqCst), 2);

    drop(events_tx);
    let lifecycle = handle.await.unwrap();
    assert_eq!(lifecycle.username(), Some("ana"));
    assert_eq!(board.standings()[&Difficulty::Easy].len(), 1);
}
