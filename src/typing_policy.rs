use crate::session::Session;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use std::time::Instant;

/// A key event reduced to what the interpreter cares about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keystroke {
    /// Modifier chords and lone modifier presses
    Modifier,
    /// Key-up events; every key is judged on its press
    Release,
    Space,
    Backspace,
    Char(char),
    /// Function keys, arrows and anything else; starts the timer but is
    /// otherwise ignored
    Other,
}

impl From<&KeyEvent> for Keystroke {
    fn from(key: &KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Keystroke::Release;
        }
        let chord =
            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::META | KeyModifiers::SUPER;
        if key.modifiers.intersects(chord) {
            return Keystroke::Modifier;
        }
        match key.code {
            KeyCode::Modifier(_) => Keystroke::Modifier,
            KeyCode::Char(' ') => Keystroke::Space,
            KeyCode::Char(c) => Keystroke::Char(c),
            KeyCode::Backspace => Keystroke::Backspace,
            _ => Keystroke::Other,
        }
    }
}

impl From<KeyEvent> for Keystroke {
    fn from(key: KeyEvent) -> Self {
        Keystroke::from(&key)
    }
}

/// What a single keystroke did to the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Correct,
    Error,
    /// Typed past the end of the word, or after the last word
    Dropped,
    NextWord,
    /// Space before the word was fully typed
    SpaceSwallowed,
    Backspace,
    PreviousWord,
    /// Backspace at the very start
    NoOp,
}

/// Applies one keystroke to `session`. Counters never decrease and indices stay
/// within the current word.
pub fn apply_key(session: &mut Session, key: Keystroke, now: Instant) -> KeyOutcome {
    if matches!(key, Keystroke::Modifier | Keystroke::Release) {
        return KeyOutcome::Ignored;
    }

    if session.started_at.is_none() {
        debug!("timer started for session {}", session.generation);
        session.started_at = Some(now);
    }
    if key == Keystroke::Other {
        return KeyOutcome::Ignored;
    }

    let Some(word_len) = session.current_word().map(<[char]>::len) else {
        return KeyOutcome::Dropped;
    };

    match key {
        Keystroke::Space => advance_word(session, word_len),
        Keystroke::Backspace => backspace(session),
        Keystroke::Char(c) => write_char(session, c, word_len),
        Keystroke::Modifier | Keystroke::Release | Keystroke::Other => KeyOutcome::Ignored,
    }
}

fn advance_word(session: &mut Session, word_len: usize) -> KeyOutcome {
    if session.char_index == word_len {
        session.word_index += 1;
        session.char_index = 0;
        KeyOutcome::NextWord
    } else {
        KeyOutcome::SpaceSwallowed
    }
}

fn backspace(session: &mut Session) -> KeyOutcome {
    if session.char_index > 0 {
        session.char_index -= 1;
        KeyOutcome::Backspace
    } else if session.word_index > 0 {
        session.word_index -= 1;
        session.char_index = session.word_len(session.word_index);
        KeyOutcome::PreviousWord
    } else {
        KeyOutcome::NoOp
    }
}

fn write_char(session: &mut Session, c: char, word_len: usize) -> KeyOutcome {
    if session.char_index >= word_len {
        return KeyOutcome::Dropped;
    }
    let expected = session
        .current_word()
        .and_then(|w| w.get(session.char_index).copied());

    if expected == Some(c) {
        session.correct_chars += 1;
        session.char_index += 1;
        KeyOutcome::Correct
    } else {
        session.errors += 1;
        KeyOutcome::Error
    }
}
