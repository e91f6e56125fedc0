//! Event sources and the textual event protocol.

use crate::session::{PixelPoint, SessionEvent};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Stdin};
use thiserror::Error;

/// Blocking source of session events. Returning `None` ends the session.
pub trait EventSource {
    fn next_event(&mut self) -> Option<SessionEvent>;
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseEventError {
    #[error("empty event line")]
    Empty,
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    #[error("expected two numeric coordinates for {0:?}")]
    BadCoordinates(String),
}

/// Parse one event line: `press X Y`, `move X Y`, `release X Y`, `undo`,
/// or `quit`.
pub fn parse_event(line: &str) -> Result<SessionEvent, ParseEventError> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Err(ParseEventError::Empty);
    };
    let mut point = |command: &str| -> Result<PixelPoint, ParseEventError> {
        let bad = || ParseEventError::BadCoordinates(command.to_string());
        let x: f32 = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let y: f32 = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        Ok(PixelPoint::new(x, y))
    };
    match command {
        "press" => Ok(SessionEvent::Press(point(command)?)),
        "move" => Ok(SessionEvent::Move(point(command)?)),
        "release" => Ok(SessionEvent::Release(point(command)?)),
        "undo" => Ok(SessionEvent::Undo),
        "quit" => Ok(SessionEvent::Quit),
        other => Err(ParseEventError::UnknownEvent(other.to_string())),
    }
}

/// Reads event lines from a buffered reader, blocking per line. Blank lines
/// are ignored; malformed lines are skipped with a warning.
pub struct LineEvents<R> {
    reader: R,
}

impl<R: BufRead> LineEvents<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> EventSource for LineEvents<R> {
    fn next_event(&mut self) -> Option<SessionEvent> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("failed to read event line: {e}");
                    return None;
                }
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_event(&line) {
                Ok(event) => return Some(event),
                Err(e) => tracing::warn!("skipping event line: {e}"),
            }
        }
    }
}

/// Pointer events from standard input, one per line.
pub fn stdin_events() -> LineEvents<BufReader<Stdin>> {
    LineEvents::new(BufReader::new(std::io::stdin()))
}

/// Replays a fixed script of events. Used by tests and batch replays.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<SessionEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = SessionEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_command_forms() {
        assert_eq!(
            parse_event("press 10 10"),
            Ok(SessionEvent::Press(PixelPoint::new(10.0, 10.0)))
        );
        assert_eq!(
            parse_event("move 12.5 7"),
            Ok(SessionEvent::Move(PixelPoint::new(12.5, 7.0)))
        );
        assert_eq!(
            parse_event("release 50 60"),
            Ok(SessionEvent::Release(PixelPoint::new(50.0, 60.0)))
        );
        assert_eq!(parse_event("undo"), Ok(SessionEvent::Undo));
        assert_eq!(parse_event("quit\n"), Ok(SessionEvent::Quit));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_event(""), Err(ParseEventError::Empty));
        assert!(matches!(
            parse_event("hover 1 2"),
            Err(ParseEventError::UnknownEvent(_))
        ));
        assert!(matches!(
            parse_event("press 1"),
            Err(ParseEventError::BadCoordinates(_))
        ));
        assert!(matches!(
            parse_event("press x y"),
            Err(ParseEventError::BadCoordinates(_))
        ));
    }

    #[test]
    fn line_source_skips_blank_and_malformed_lines() {
        let input = "\npress 1 2\nnonsense\nrelease 3 4\n";
        let mut source = LineEvents::new(input.as_bytes());
        assert_eq!(
            source.next_event(),
            Some(SessionEvent::Press(PixelPoint::new(1.0, 2.0)))
        );
        assert_eq!(
            source.next_event(),
            Some(SessionEvent::Release(PixelPoint::new(3.0, 4.0)))
        );
        assert_eq!(source.next_event(), None);
    }
}
