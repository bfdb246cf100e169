//! Line store: the ordered lines of a clock and their event sequences.
//!
//! Each [`Line`] is anchored by a sentinel start time at position 0; user
//! events occupy positions `1..=len`. Lines are addressed by zero-based
//! index because the index doubles as the line's vector dimension.

use serde::Serialize;

use crate::error::{ClockError, Result};

/// Timestamp state of an event.
///
/// Every non-sentinel event is reset to [`EventTime::Unassigned`] before a
/// recomputation and must end up [`EventTime::Timed`] for it to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime<T> {
    Unassigned,
    Timed(T),
}

impl<T> EventTime<T> {
    /// The assigned time, if any.
    #[must_use]
    pub const fn timed(&self) -> Option<&T> {
        match self {
            Self::Unassigned => None,
            Self::Timed(time) => Some(time),
        }
    }

    #[must_use]
    pub const fn is_timed(&self) -> bool {
        matches!(self, Self::Timed(_))
    }
}

/// A named event on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T> {
    pub name: String,
    pub time: EventTime<T>,
}

/// Location of an event: line index and position within the line.
///
/// Position 0 is the line's sentinel, so events are always at 1 or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub index: usize,
}

/// One process's ordered sequence of events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<T> {
    start: T,
    events: Vec<Event<T>>,
}

impl<T> Line<T> {
    const fn new(start: T) -> Self {
        Self {
            start,
            events: Vec::new(),
        }
    }

    /// The sentinel's starting time.
    #[must_use]
    pub const fn start(&self) -> &T {
        &self.start
    }

    /// Events after the sentinel, in line order.
    #[must_use]
    pub fn events(&self) -> &[Event<T>] {
        &self.events
    }

    /// Number of events, sentinel excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time at `position` (0 = sentinel); `None` if unassigned or out of range.
    #[must_use]
    pub fn time_at(&self, position: usize) -> Option<&T> {
        if position == 0 {
            return Some(&self.start);
        }
        self.events
            .get(position - 1)
            .and_then(|event| event.time.timed())
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.events
            .iter()
            .position(|event| event.name == name)
            .map(|i| i + 1)
    }
}

/// Owns every line of a clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStore<T> {
    lines: Vec<Line<T>>,
}

impl<T: Clone> LineStore<T> {
    /// Store with `line_count` empty lines, each starting at `start`.
    #[must_use]
    pub fn with_lines(line_count: usize, start: &T) -> Self {
        Self {
            lines: (0..line_count).map(|_| Line::new(start.clone())).collect(),
        }
    }
}

impl<T> LineStore<T> {
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn lines(&self) -> &[Line<T>] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line<T>> {
        self.lines.get(index)
    }

    /// Total number of events across all lines, sentinels excluded.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lines.iter().map(Line::len).sum()
    }

    /// Find the line and position of the event called `name`.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<Position> {
        self.lines.iter().enumerate().find_map(|(line, l)| {
            l.position_of(name).map(|index| Position { line, index })
        })
    }

    /// Time stored at `line`/`position`, if both exist and it is assigned.
    #[must_use]
    pub fn time_at(&self, line: usize, position: usize) -> Option<&T> {
        self.lines.get(line).and_then(|l| l.time_at(position))
    }

    /// Every event name in the store, in line order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .flat_map(|line| line.events.iter().map(|event| event.name.as_str()))
    }

    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] if `index` is not a current line.
    pub fn validate_line_index(&self, index: usize) -> Result<()> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(ClockError::InvalidLineIndex {
                index,
                line_count: self.lines.len(),
            })
        }
    }

    /// # Errors
    ///
    /// [`ClockError::DuplicateEventName`] if any line already holds `name`.
    pub fn validate_fresh_name(&self, name: &str) -> Result<()> {
        if self.names().any(|existing| existing == name) {
            Err(ClockError::DuplicateEventName(name.to_string()))
        } else {
            Ok(())
        }
    }

    /// Append an unassigned event to the end of `line`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] or [`ClockError::DuplicateEventName`].
    pub fn append_event(&mut self, line: usize, name: impl Into<String>) -> Result<Position> {
        let name = name.into();
        self.validate_line_index(line)?;
        self.validate_fresh_name(&name)?;
        let target = &mut self.lines[line];
        target.events.push(Event {
            name,
            time: EventTime::Unassigned,
        });
        Ok(Position {
            line,
            index: target.events.len(),
        })
    }

    /// Remove every event called `name`; returns how many were removed.
    pub fn remove_events_by_name(&mut self, name: &str) -> usize {
        let mut removed = 0;
        for line in &mut self.lines {
            let before = line.events.len();
            line.events.retain(|event| event.name != name);
            removed += before - line.events.len();
        }
        removed
    }

    /// Append a new line whose sentinel starts at `start`.
    pub fn insert_line(&mut self, start: T) -> usize {
        self.lines.push(Line::new(start));
        self.lines.len() - 1
    }

    /// Remove and return line `index`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] if `index` is not a current line.
    pub fn remove_line(&mut self, index: usize) -> Result<Line<T>> {
        self.validate_line_index(index)?;
        Ok(self.lines.remove(index))
    }

    /// Replace the sentinel time of `line`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] if `line` is not a current line.
    pub fn set_start(&mut self, line: usize, start: T) -> Result<()> {
        self.validate_line_index(line)?;
        self.lines[line].start = start;
        Ok(())
    }

    /// Rewrite every sentinel time through `reshape`.
    pub fn reshape_starts(&mut self, mut reshape: impl FnMut(T) -> T) {
        self.lines = std::mem::take(&mut self.lines)
            .into_iter()
            .map(|Line { start, events }| Line {
                start: reshape(start),
                events,
            })
            .collect();
    }

    /// Assign `time` to the event at `line`/`position` (position ≥ 1).
    pub(crate) fn set_time(&mut self, line: usize, position: usize, time: T) {
        let Some(offset) = position.checked_sub(1) else {
            return;
        };
        if let Some(event) = self
            .lines
            .get_mut(line)
            .and_then(|l| l.events.get_mut(offset))
        {
            event.time = EventTime::Timed(time);
        }
    }

    /// Reset every non-sentinel event to [`EventTime::Unassigned`].
    pub fn clear_derived_times(&mut self) {
        for line in &mut self.lines {
            for event in &mut line.events {
                event.time = EventTime::Unassigned;
            }
        }
    }

    /// Names of events that still have no time.
    #[must_use]
    pub(crate) fn unassigned(&self) -> Vec<String> {
        self.lines
            .iter()
            .flat_map(|line| line.events.iter())
            .filter(|event| !event.time.is_timed())
            .map(|event| event.name.clone())
            .collect()
    }
}
