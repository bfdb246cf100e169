//! Fixpoint time adjustment.
//!
//! Causes may sit anywhere on another line, so one pass per line cannot
//! time every event. Instead each line keeps a cursor on its first untimed
//! event and rounds are repeated until every cursor has run off the end of
//! its line. A round that times nothing means the remaining events wait on
//! each other forever.
//!
//! The loop is bounded by the total event count: every productive round
//! times at least one event.

use tracing::trace;

use crate::relation::Relations;
use crate::store::{LineStore, Position};
use crate::strategy::Strategy;

/// Recomputation could not time every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stalled {
    /// Rounds run before progress stopped.
    pub rounds: usize,
    /// Events left without a time.
    pub pending: Vec<String>,
}

/// What an event waits on besides its line predecessor.
#[derive(Debug, Clone, Copy)]
enum Dependency {
    Local,
    Remote(Position),
    /// The recorded cause no longer exists; never becomes ready.
    Dangling,
}

/// Assign a time to every event of `store`.
///
/// Expects every sentinel to be defined and every other event cleared.
/// Returns the number of rounds on success.
///
/// # Errors
///
/// [`Stalled`] when a round makes no progress while events remain untimed.
/// The store is then partially timed and must be discarded by the caller.
pub fn adjust<S: Strategy>(
    store: &mut LineStore<S::Time>,
    relations: &Relations,
) -> Result<usize, Stalled> {
    let dependencies = dependencies(store, relations);
    let lengths: Vec<usize> = store.lines().iter().map(|line| line.len()).collect();
    let mut cursors = vec![1usize; lengths.len()];
    let mut rounds = 0;

    while cursors.iter().zip(&lengths).any(|(cursor, len)| cursor <= len) {
        rounds += 1;
        let mut timed = 0usize;

        for line in 0..lengths.len() {
            let cursor = cursors[line];
            if cursor > lengths[line] || store.time_at(line, cursor).is_some() {
                continue;
            }
            let Some(predecessor) = store.time_at(line, cursor - 1) else {
                continue;
            };

            let time = match dependencies[line][cursor - 1] {
                Dependency::Local => S::increase(line, predecessor),
                Dependency::Remote(at) => match store.time_at(at.line, at.index) {
                    Some(cause) => S::merge(line, cause, predecessor),
                    None => continue,
                },
                Dependency::Dangling => continue,
            };

            store.set_time(line, cursor, time);
            cursors[line] += 1;
            timed += 1;
        }

        trace!(round = rounds, timed, "fixpoint round");
        if timed == 0 {
            return Err(Stalled {
                rounds,
                pending: store.unassigned(),
            });
        }
    }

    Ok(rounds)
}

fn dependencies<T>(store: &LineStore<T>, relations: &Relations) -> Vec<Vec<Dependency>> {
    store
        .lines()
        .iter()
        .map(|line| {
            line.events()
                .iter()
                .map(|event| match relations.cause_of(&event.name) {
                    None => Dependency::Local,
                    Some(cause) => store
                        .locate(cause)
                        .map_or(Dependency::Dangling, Dependency::Remote),
                })
                .collect()
        })
        .collect()
}
