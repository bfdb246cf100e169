//! Transactional clock engine.
//!
//! Every mutation runs as snapshot → edit → clear derived times →
//! fixpoint adjustment → commit or roll back. Callers never observe a
//! partially timed clock: on any error the clock is deep-equal to its
//! state before the call.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use tracing::{debug, warn};

use crate::adjust::adjust;
use crate::error::{ClockError, Result};
use crate::relation::Relations;
use crate::store::{LineStore, Position};
use crate::strategy::{Scalar, Strategy, TimeOrder, Vector};

/// Number of lines a [`Clock::default`] starts with.
pub const DEFAULT_LINE_COUNT: usize = 3;

/// Engine computing Lamport timestamps.
pub type LamportClock = Clock<Scalar>;

/// Engine computing vector timestamps.
pub type VectorClock = Clock<Vector>;

/// A committed event as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedEvent<T> {
    pub name: String,
    pub time: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
}

/// Logical clock over a set of lines, generic over the timestamp discipline.
pub struct Clock<S: Strategy> {
    store: LineStore<S::Time>,
    relations: Relations,
    strategy: PhantomData<S>,
}

struct Snapshot<T> {
    store: LineStore<T>,
    relations: Relations,
}

impl<S: Strategy> Clock<S> {
    /// Clock with `line_count` lines, each holding only its sentinel at the
    /// strategy's default time.
    #[must_use]
    pub fn new(line_count: usize) -> Self {
        Self {
            store: LineStore::with_lines(line_count, &S::default_time(line_count)),
            relations: Relations::new(),
            strategy: PhantomData,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Committed events per line, sentinels excluded.
    #[must_use]
    pub fn time(&self) -> Vec<Vec<TimedEvent<S::Time>>> {
        self.store
            .lines()
            .iter()
            .map(|line| {
                line.events()
                    .iter()
                    .filter_map(|event| {
                        event.time.timed().map(|time| TimedEvent {
                            name: event.name.clone(),
                            time: time.clone(),
                            caused_by: self.relations.cause_of(&event.name).map(str::to_string),
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Line and position (≥ 1) of the event called `name`.
    #[must_use]
    pub fn locate_event(&self, name: &str) -> Option<Position> {
        self.store.locate(name)
    }

    /// The committed event called `name`.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<TimedEvent<S::Time>> {
        let at = self.store.locate(name)?;
        let time = self.store.time_at(at.line, at.index)?;
        Some(TimedEvent {
            name: name.to_string(),
            time: time.clone(),
            caused_by: self.relations.cause_of(name).map(str::to_string),
        })
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.store.line_count()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.store.event_count()
    }

    /// Starting time of `line`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] if `line` does not exist.
    pub fn starting_time(&self, line: usize) -> Result<&S::Time> {
        self.store.validate_line_index(line)?;
        self.store
            .time_at(line, 0)
            .ok_or(ClockError::InvalidLineIndex {
                index: line,
                line_count: self.store.line_count(),
            })
    }

    /// Causal relations as `(from, to)` pairs.
    #[must_use]
    pub fn relations(&self) -> Vec<(String, String)> {
        self.relations
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    /// Compare the timestamps of two events.
    ///
    /// # Errors
    ///
    /// [`ClockError::UnknownEventReference`] if either event is missing.
    pub fn order(&self, a: &str, b: &str) -> Result<TimeOrder> {
        let lookup = |name: &str| {
            self.event(name)
                .ok_or_else(|| ClockError::UnknownEventReference(name.to_string()))
        };
        let (a, b) = (lookup(a)?, lookup(b)?);
        Ok(S::compare(&a.time, &b.time))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Replace the starting time of `line`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] or [`ClockError::InconsistentSystem`].
    pub fn set_starting_time(&mut self, line: usize, value: S::Time) -> Result<()> {
        self.transact("set_starting_time", |store, _| {
            let value = S::widen(value, store.line_count());
            store.set_start(line, value)
        })
    }

    /// Append a line starting at `starting_time`, or at the default time.
    ///
    /// Existing starting times are widened to the new line count first.
    ///
    /// # Errors
    ///
    /// [`ClockError::InconsistentSystem`].
    pub fn add_line(&mut self, starting_time: Option<S::Time>) -> Result<()> {
        self.transact("add_line", |store, _| {
            let line_count = store.line_count() + 1;
            store.reshape_starts(|start| S::widen(start, line_count));
            let start = starting_time.unwrap_or_else(|| S::default_time(line_count));
            store.insert_line(S::widen(start, line_count));
            Ok(())
        })
    }

    /// Remove line `index`, or the last line when `None`.
    ///
    /// Relations touching the removed events are dropped and the remaining
    /// starting times lose the removed line's dimension.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`] or [`ClockError::InconsistentSystem`].
    pub fn remove_line(&mut self, index: Option<usize>) -> Result<()> {
        self.transact("remove_line", |store, relations| {
            let line_count = store.line_count();
            let index = match index.or_else(|| line_count.checked_sub(1)) {
                Some(index) => index,
                None => {
                    return Err(ClockError::InvalidLineIndex {
                        index: 0,
                        line_count,
                    });
                }
            };
            let removed = store.remove_line(index)?;
            let names: Vec<&str> = removed.events().iter().map(|e| e.name.as_str()).collect();
            relations.clear_references_to(&names);
            store.reshape_starts(|start| S::drop_line(start, index));
            Ok(())
        })
    }

    /// Append an event called `name` to `line`.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidLineIndex`], [`ClockError::DuplicateEventName`]
    /// or [`ClockError::InconsistentSystem`].
    pub fn add_event(&mut self, line: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.transact("add_event", |store, _| {
            store.append_event(line, name).map(|_| ())
        })
    }

    /// Remove the event called `name` and every relation touching it.
    ///
    /// An unknown name leaves the clock unchanged.
    ///
    /// # Errors
    ///
    /// [`ClockError::InconsistentSystem`].
    pub fn remove_event(&mut self, name: &str) -> Result<()> {
        self.transact("remove_event", |store, relations| {
            store.remove_events_by_name(name);
            relations.clear_references_to(&[name]);
            Ok(())
        })
    }

    /// Record that `from` caused `to`.
    ///
    /// # Errors
    ///
    /// [`ClockError::UnknownEventReference`], [`ClockError::SameLineRelation`]
    /// or [`ClockError::InconsistentSystem`] if `to` would have to be timed
    /// before its own cause.
    pub fn add_relation(&mut self, from: &str, to: &str) -> Result<()> {
        self.transact("add_relation", |store, relations| {
            relations.add_relation(store, from, to)
        })
    }

    /// Ensure `from` is not recorded as the cause of `to`.
    ///
    /// A different stored cause of `to` is left in place.
    ///
    /// # Errors
    ///
    /// [`ClockError::UnknownEventReference`] or [`ClockError::InconsistentSystem`].
    pub fn remove_relation(&mut self, from: &str, to: &str) -> Result<()> {
        self.transact("remove_relation", |store, relations| {
            relations.remove_relation(store, from, to).map(|_| ())
        })
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    fn snapshot(&self) -> Snapshot<S::Time> {
        Snapshot {
            store: self.store.clone(),
            relations: self.relations.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot<S::Time>) {
        self.store = snapshot.store;
        self.relations = snapshot.relations;
    }

    fn transact<F>(&mut self, operation: &'static str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut LineStore<S::Time>, &mut Relations) -> Result<()>,
    {
        let snapshot = self.snapshot();

        if let Err(err) = edit(&mut self.store, &mut self.relations) {
            self.restore(snapshot);
            debug!(operation, error = %err, "rejected");
            return Err(err);
        }

        self.store.clear_derived_times();
        match adjust::<S>(&mut self.store, &self.relations) {
            Ok(rounds) => {
                debug!(
                    operation,
                    strategy = %S::KIND,
                    lines = self.store.line_count(),
                    events = self.store.event_count(),
                    rounds,
                    "committed"
                );
                Ok(())
            }
            Err(stalled) => {
                warn!(
                    operation,
                    strategy = %S::KIND,
                    rounds = stalled.rounds,
                    pending = ?stalled.pending,
                    "rolled back: inconsistent system"
                );
                self.restore(snapshot);
                Err(ClockError::InconsistentSystem)
            }
        }
    }
}

impl<S: Strategy> Default for Clock<S> {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_COUNT)
    }
}

impl<S: Strategy> Clone for Clock<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            relations: self.relations.clone(),
            strategy: PhantomData,
        }
    }
}

impl<S: Strategy> PartialEq for Clock<S> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && self.relations == other.relations
    }
}

impl<S: Strategy> fmt::Debug for Clock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("strategy", &S::KIND)
            .field("store", &self.store)
            .field("relations", &self.relations)
            .finish()
    }
}
