//! Causal relations between events on different lines.
//!
//! Relations form a sparse edge set layered over the line structure: each
//! event has at most one cause, keyed by the caused event's name. The
//! distinct-line invariant is checked when an edge is created.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ClockError, Result};
use crate::store::{LineStore, Position};

/// Edge set mapping a caused event to the remote event that caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    causes: BTreeMap<String, String>,
}

impl Relations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The event that caused `name`, if any.
    #[must_use]
    pub fn cause_of(&self, name: &str) -> Option<&str> {
        self.causes.get(name).map(String::as_str)
    }

    /// `(from, to)` pairs, ordered by the caused event's name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.causes
            .iter()
            .map(|(to, from)| (from.as_str(), to.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    /// Record that `from` caused `to`, replacing any previous cause of `to`.
    ///
    /// # Errors
    ///
    /// - [`ClockError::UnknownEventReference`] if either event is missing.
    /// - [`ClockError::SameLineRelation`] if both events are on one line.
    pub fn add_relation<T>(&mut self, store: &LineStore<T>, from: &str, to: &str) -> Result<()> {
        let (from_at, to_at) = locate_pair(store, from, to)?;
        if from_at.line == to_at.line {
            return Err(ClockError::SameLineRelation {
                from: from.to_string(),
                to: to.to_string(),
                line: to_at.line,
            });
        }
        if let Some(previous) = self.causes.insert(to.to_string(), from.to_string()) {
            debug!(to, previous = %previous, from, "replaced cause");
        }
        Ok(())
    }

    /// Ensure `from` is no longer recorded as the cause of `to`.
    ///
    /// Returns `true` if an edge was removed. A stored cause other than
    /// `from` is left untouched.
    ///
    /// # Errors
    ///
    /// [`ClockError::UnknownEventReference`] if either event is missing.
    pub fn remove_relation<T>(
        &mut self,
        store: &LineStore<T>,
        from: &str,
        to: &str,
    ) -> Result<bool> {
        locate_pair(store, from, to)?;
        if self.cause_of(to) == Some(from) {
            self.causes.remove(to);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Drop every edge touching one of `names`.
    ///
    /// Edges whose cause was removed would dangle; edges whose caused event
    /// was removed have no owner left.
    pub fn clear_references_to<S: AsRef<str>>(&mut self, names: &[S]) {
        let removed = |name: &str| names.iter().any(|n| n.as_ref() == name);
        self.causes
            .retain(|to, from| !removed(to.as_str()) && !removed(from.as_str()));
    }
}

fn locate_pair<T>(store: &LineStore<T>, from: &str, to: &str) -> Result<(Position, Position)> {
    let from_at = store
        .locate(from)
        .ok_or_else(|| ClockError::UnknownEventReference(from.to_string()))?;
    let to_at = store
        .locate(to)
        .ok_or_else(|| ClockError::UnknownEventReference(to.to_string()))?;
    Ok((from_at, to_at))
}
