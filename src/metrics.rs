use crate::difficulty::Difficulty;
use crate::session::SessionSnapshot;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const CHARS_PER_WORD: f64 = 5.0;

fn elapsed_minutes(started_at: Option<Instant>, now: Instant) -> Option<f64> {
    let started_at = started_at?;
    let minutes = now.checked_duration_since(started_at)?.as_secs_f64() / 60.0;
    (minutes > 0.0).then_some(minutes)
}

/// Net words per minute: correct characters only, over the whole elapsed time.
pub fn net_wpm(correct_chars: usize, minutes: f64) -> u32 {
    if minutes <= 0.0 {
        return 0;
    }
    ((correct_chars as f64 / CHARS_PER_WORD) / minutes).round().max(0.0) as u32
}

/// Gross words per minute: every accepted keystroke counts.
pub fn gross_wpm(typed_chars: usize, minutes: f64) -> u32 {
    net_wpm(typed_chars, minutes)
}

/// Gross WPM less half a word per error, capped at 30% of gross.
pub fn adjusted_wpm(typed_chars: usize, errors: usize, minutes: f64) -> u32 {
    let gross = gross_wpm(typed_chars, minutes) as f64;
    let penalty = (errors as f64 * 0.5).min(gross * 0.3);
    (gross - penalty).round().max(0.0) as u32
}

pub fn accuracy(correct_chars: usize, errors: usize) -> u32 {
    let total = correct_chars + errors;
    if total == 0 {
        100
    } else {
        ((correct_chars as f64 / total as f64) * 100.0).round() as u32
    }
}

/// WPM while a session is still running; zero until the timer has started.
pub fn live_wpm(snapshot: &SessionSnapshot, now: Instant) -> u32 {
    elapsed_minutes(snapshot.started_at, now).map_or(0, |m| net_wpm(snapshot.correct_chars, m))
}

/// Figures computed once when the last word is finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalMetrics {
    pub generation: u64,
    pub difficulty: Difficulty,
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

impl FinalMetrics {
    pub fn compute(snapshot: &SessionSnapshot, completed_at: Instant) -> Self {
        let elapsed = snapshot
            .started_at
            .and_then(|s| completed_at.checked_duration_since(s))
            .unwrap_or_default();
        let typed = snapshot.correct_chars + snapshot.errors;

        let wpm = elapsed_minutes(snapshot.started_at, completed_at)
            .map_or(0, |m| net_wpm(snapshot.correct_chars, m));

        if let Some(m) = elapsed_minutes(snapshot.started_at, completed_at) {
            debug!(
                "wpm calculations: net={} gross={} adjusted={}",
                wpm,
                gross_wpm(typed, m),
                adjusted_wpm(typed, snapshot.errors, m)
            );
        }

        Self {
            generation: snapshot.generation,
            difficulty: snapshot.difficulty,
            wpm,
            accuracy: accuracy(snapshot.correct_chars, snapshot.errors),
            correct_chars: snapshot.correct_chars,
            errors: snapshot.errors,
            elapsed,
        }
    }
}

/// Carry-over summary of the previous completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            errors: 0,
        }
    }
}

impl SessionStats {
    /// No prior session to adapt to.
    pub fn is_first_session(&self) -> bool {
        self.wpm == 0 && self.errors == 0
    }
}

impl From<&FinalMetrics> for SessionStats {
    fn from(m: &FinalMetrics) -> Self {
        Self {
            wpm: m.wpm,
            accuracy: m.accuracy,
            errors: m.errors,
        }
    }
}

/// Best WPM seen in this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestWpm(u32);

impl BestWpm {
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns true when `wpm` sets a new best.
    pub fn record(&mut self, wpm: u32) -> bool {
        if wpm > self.0 {
            self.0 = wpm;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(started_at: Option<Instant>, correct: usize, errors: usize) -> SessionSnapshot {
        SessionSnapshot {
            generation: 1,
            difficulty: Difficulty::Medium,
            word_count: 10,
            started_at,
            correct_chars: correct,
            errors,
        }
    }

    #[test]
    fn one_minute_fifty_chars_is_ten_wpm() {
        let start = Instant::now();
        let metrics = FinalMetrics::compute(
            &snapshot(Some(start), 50, 0),
            start + Duration::from_secs(60),
        );
        assert_eq!(metrics.wpm, 10);
        assert_eq!(metrics.accuracy, 100);
        assert_eq!(metrics.elapsed, Duration::from_secs(60));
    }

    #[test]
    fn errors_only_lower_accuracy_not_net_wpm() {
        let start = Instant::now();
        let metrics = FinalMetrics::compute(
            &snapshot(Some(start), 50, 50),
            start + Duration::from_secs(60),
        );
        assert_eq!(metrics.wpm, 10);
        assert_eq!(metrics.accuracy, 50);
        assert_eq!(metrics.errors, 50);
    }

    #[test]
    fn nothing_typed_is_full_accuracy_and_zero_wpm() {
        let metrics = FinalMetrics::compute(&snapshot(None, 0, 0), Instant::now());
        assert_eq!(metrics.accuracy, 100);
        assert_eq!(metrics.wpm, 0);
        assert_eq!(metrics.elapsed, Duration::ZERO);
    }

    #[test]
    fn zero_elapsed_time_is_zero_wpm() {
        let start = Instant::now();
        let metrics = FinalMetrics::compute(&snapshot(Some(start), 10, 0), start);
        assert_eq!(metrics.wpm, 0);
    }

    #[test]
    fn live_wpm_waits_for_timer() {
        let now = Instant::now();
        assert_eq!(live_wpm(&snapshot(None, 40, 0), now), 0);
        assert_eq!(
            live_wpm(&snapshot(Some(now), 40, 0), now + Duration::from_secs(30)),
            16
        );
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        assert_eq!(accuracy(2, 1), 67);
        assert_eq!(accuracy(1, 2), 33);
        assert_eq!(accuracy(0, 0), 100);
        assert_eq!(accuracy(0, 4), 0);
    }

    #[test]
    fn gross_and_adjusted_variants() {
        assert_eq!(gross_wpm(60, 1.0), 12);
        // penalty 5 errors * 0.5 = 2.5, below 30% cap of 3.6
        assert_eq!(adjusted_wpm(60, 5, 1.0), 10);
        // cap kicks in
        assert_eq!(adjusted_wpm(60, 40, 1.0), 8);
    }

    #[test]
    fn first_session_detection() {
        assert!(SessionStats::default().is_first_session());
        assert!(!SessionStats {
            wpm: 0,
            accuracy: 80,
            errors: 3
        }
        .is_first_session());
        assert!(!SessionStats {
            wpm: 40,
            accuracy: 100,
            errors: 0
        }
        .is_first_session());
    }

    #[test]
    fn best_wpm_only_moves_up() {
        let mut best = BestWpm::default();
        assert!(best.record(40));
        assert!(!best.record(30));
        assert!(!best.record(40));
        assert!(best.record(41));
        assert_eq!(best.get(), 41);
    }
}
