use std::fmt;

use thiserror::Error;

/// Errors raised by clock mutations and queries.
///
/// The first four variants are validation failures raised before any
/// structural change takes effect. [`ClockError::InconsistentSystem`] is
/// raised after the engine restored its pre-call snapshot. Either way the
/// clock is left exactly as it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("invalid line index {index} (clock has {line_count} lines)")]
    InvalidLineIndex { index: usize, line_count: usize },

    #[error("event name already exists: {0}")]
    DuplicateEventName(String),

    #[error("unknown event: {0}")]
    UnknownEventReference(String),

    #[error("events {from} and {to} are both on line {line}")]
    SameLineRelation {
        from: String,
        to: String,
        line: usize,
    },

    #[error("inconsistent system: causal relations can never be resolved")]
    InconsistentSystem,
}

impl ClockError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidLineIndex { .. } => ErrorCode::InvalidLineIndex,
            Self::DuplicateEventName(_) => ErrorCode::DuplicateEventName,
            Self::UnknownEventReference(_) => ErrorCode::UnknownEventReference,
            Self::SameLineRelation { .. } => ErrorCode::SameLineRelation,
            Self::InconsistentSystem => ErrorCode::InconsistentSystem,
        }
    }
}

/// Result type alias for clock operations.
pub type Result<T> = std::result::Result<T, ClockError>;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidLineIndex,
    DuplicateEventName,
    UnknownEventReference,
    SameLineRelation,
    InconsistentSystem,
    ScenarioParse,
    ScenarioStep,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidLineIndex => "E2001",
            Self::DuplicateEventName => "E2002",
            Self::UnknownEventReference => "E2003",
            Self::SameLineRelation => "E2004",
            Self::InconsistentSystem => "E3001",
            Self::ScenarioParse => "E4001",
            Self::ScenarioStep => "E4002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidLineIndex => "Invalid line index",
            Self::DuplicateEventName => "Duplicate event name",
            Self::UnknownEventReference => "Unknown event reference",
            Self::SameLineRelation => "Relation within a single line",
            Self::InconsistentSystem => "Inconsistent system",
            Self::ScenarioParse => "Scenario parse error",
            Self::ScenarioStep => "Scenario step failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidLineIndex => Some("Line indexes are zero-based and below the line count."),
            Self::DuplicateEventName => Some("Event names are unique across all lines; pick another."),
            Self::UnknownEventReference => None,
            Self::SameLineRelation => {
                Some("Events on one line are already ordered; relate events on different lines.")
            }
            Self::InconsistentSystem => {
                Some("Remove the relation that points into the future or closes a cycle.")
            }
            Self::ScenarioParse => Some("Check the command syntax and the JSON time literal."),
            Self::ScenarioStep => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
