//! Timestamp disciplines.
//!
//! A [`Strategy`] is a stateless set of pure functions describing how a
//! logical time value is produced. The engine is generic over it, so the
//! same fixpoint machinery computes both Lamport ([`Scalar`]) and
//! per-line vector ([`Vector`]) timestamps.

mod scalar;
mod vector;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use scalar::Scalar;
pub use vector::{Vector, VectorTime};

/// Capability set shared by every timestamp discipline.
///
/// Strategies never read or write the clock; they only map timestamps to
/// timestamps.
pub trait Strategy {
    /// The logical time value carried by each event.
    type Time: Clone + PartialEq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;

    /// Runtime name of this discipline.
    const KIND: StrategyKind;

    /// Starting time of a line in a clock with `line_count` lines.
    fn default_time(line_count: usize) -> Self::Time;

    /// Time of an event whose only predecessor is the previous event on
    /// line `own`.
    fn increase(own: usize, predecessor: &Self::Time) -> Self::Time;

    /// Time of an event on line `own` caused by a remote event stamped
    /// `cause`, following a local event stamped `predecessor`.
    fn merge(own: usize, cause: &Self::Time, predecessor: &Self::Time) -> Self::Time;

    /// Compare two timestamps under this discipline's order.
    fn compare(a: &Self::Time, b: &Self::Time) -> TimeOrder;

    /// Reshape a starting time for a clock that now has `line_count` lines.
    fn widen(time: Self::Time, _line_count: usize) -> Self::Time {
        time
    }

    /// Reshape a starting time after line `index` was removed.
    fn drop_line(time: Self::Time, _index: usize) -> Self::Time {
        time
    }
}

/// Relative order of two timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOrder {
    Before,
    After,
    Equal,
    /// Neither timestamp dominates the other (vector time only).
    Concurrent,
}

impl fmt::Display for TimeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Equal => "equal",
            Self::Concurrent => "concurrent",
        })
    }
}

/// Runtime selector for a [`Strategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Lamport scalar counter.
    #[default]
    Scalar,
    /// One counter per line.
    Vector,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scalar" | "lamport" => Ok(Self::Scalar),
            "vector" => Ok(Self::Vector),
            other => Err(format!("unknown strategy '{other}' (expected scalar or vector)")),
        }
    }
}
