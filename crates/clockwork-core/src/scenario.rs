//! Scripted clock operations.
//!
//! A scenario is a list of [`Op`]s replayed against a [`Clock`], loaded
//! either from TOML or from a one-command-per-line script:
//!
//! ```text
//! # two processes exchanging one message
//! event 0 send
//! event 1 recv
//! relate send recv
//! start 1 [0, 4]
//! ```
//!
//! Times are JSON literals (`3`, `[1, 0, 2]`) so one syntax serves every
//! strategy.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::Clock;
use crate::error::{ClockError, ErrorCode};
use crate::strategy::{Strategy, StrategyKind};

/// One public clock mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op<T> {
    SetStartingTime { line: usize, time: T },
    AddLine { start: Option<T> },
    RemoveLine { index: Option<usize> },
    AddEvent { line: usize, name: String },
    RemoveEvent { name: String },
    AddRelation { from: String, to: String },
    RemoveRelation { from: String, to: String },
}

impl<T> Op<T> {
    /// Apply this operation to `clock`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying clock operation reports.
    pub fn apply<S>(self, clock: &mut Clock<S>) -> Result<(), ClockError>
    where
        S: Strategy<Time = T>,
    {
        match self {
            Self::SetStartingTime { line, time } => clock.set_starting_time(line, time),
            Self::AddLine { start } => clock.add_line(start),
            Self::RemoveLine { index } => clock.remove_line(index),
            Self::AddEvent { line, name } => clock.add_event(line, name),
            Self::RemoveEvent { name } => clock.remove_event(&name),
            Self::AddRelation { from, to } => clock.add_relation(&from, &to),
            Self::RemoveRelation { from, to } => clock.remove_relation(&from, &to),
        }
    }
}

/// Renders the operation in script syntax.
impl<T: Serialize> fmt::Display for Op<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |time: &T| serde_json::to_string(time).map_err(|_| fmt::Error);
        match self {
            Self::SetStartingTime { line, time: t } => write!(f, "start {line} {}", time(t)?),
            Self::AddLine { start: None } => write!(f, "line"),
            Self::AddLine { start: Some(t) } => write!(f, "line {}", time(t)?),
            Self::RemoveLine { index: None } => write!(f, "remove-line"),
            Self::RemoveLine { index: Some(i) } => write!(f, "remove-line {i}"),
            Self::AddEvent { line, name } => write!(f, "event {line} {name}"),
            Self::RemoveEvent { name } => write!(f, "remove-event {name}"),
            Self::AddRelation { from, to } => write!(f, "relate {from} {to}"),
            Self::RemoveRelation { from, to } => write!(f, "unrelate {from} {to}"),
        }
    }
}

/// Errors raised while loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid scenario file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid time literal: {0}")]
    Json(#[from] serde_json::Error),

    #[error("step {step} failed: {source}")]
    Step {
        step: usize,
        #[source]
        source: ClockError,
    },
}

impl ScenarioError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } | Self::Toml(_) | Self::Json(_) => ErrorCode::ScenarioParse,
            Self::Step { .. } => ErrorCode::ScenarioStep,
        }
    }
}

/// Leading fields of a scenario file, readable before the strategy is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ScenarioHeader {
    pub strategy: Option<StrategyKind>,
    pub lines: Option<usize>,
}

impl ScenarioHeader {
    /// # Errors
    ///
    /// [`ScenarioError::Toml`] if `text` is not valid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }
}

/// A full scenario: optional clock shape plus the operations to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario<T> {
    pub strategy: Option<StrategyKind>,
    pub lines: Option<usize>,
    #[serde(default = "Vec::new")]
    pub ops: Vec<Op<T>>,
}

impl<T: DeserializeOwned> Scenario<T> {
    /// # Errors
    ///
    /// [`ScenarioError::Toml`] if `text` is not a valid scenario for `T`.
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }
}

/// Parse one script command; `line` is the 1-based source line for errors.
///
/// # Errors
///
/// [`ScenarioError::Parse`] for unknown commands or malformed arguments.
pub fn parse_command<T: DeserializeOwned>(text: &str, line: usize) -> Result<Op<T>, ScenarioError> {
    let parse_err = |message: String| ScenarioError::Parse { line, message };
    let text = text.trim();
    let (command, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(c, r)| (c, r.trim()));
    let args: Vec<&str> = rest.split_whitespace().collect();

    let index = |raw: &str| {
        raw.parse::<usize>()
            .map_err(|_| parse_err(format!("expected a line index, got '{raw}'")))
    };
    let time = |raw: &str| {
        serde_json::from_str::<T>(raw)
            .map_err(|err| parse_err(format!("invalid time literal '{raw}': {err}")))
    };
    let arity = |want: usize| {
        if args.len() == want {
            Ok(())
        } else {
            Err(parse_err(format!(
                "'{command}' takes {want} argument(s), got {}",
                args.len()
            )))
        }
    };

    match command {
        "event" => {
            arity(2)?;
            Ok(Op::AddEvent {
                line: index(args[0])?,
                name: args[1].to_string(),
            })
        }
        "remove-event" => {
            arity(1)?;
            Ok(Op::RemoveEvent {
                name: args[0].to_string(),
            })
        }
        "relate" => {
            arity(2)?;
            Ok(Op::AddRelation {
                from: args[0].to_string(),
                to: args[1].to_string(),
            })
        }
        "unrelate" => {
            arity(2)?;
            Ok(Op::RemoveRelation {
                from: args[0].to_string(),
                to: args[1].to_string(),
            })
        }
        "line" => Ok(Op::AddLine {
            start: if rest.is_empty() {
                None
            } else {
                Some(time(rest)?)
            },
        }),
        "remove-line" => match args.as_slice() {
            [] => Ok(Op::RemoveLine { index: None }),
            [raw] => Ok(Op::RemoveLine {
                index: Some(index(raw)?),
            }),
            _ => Err(parse_err("'remove-line' takes at most 1 argument".to_string())),
        },
        "start" => {
            let (raw_line, raw_time) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| parse_err("'start' takes a line index and a time".to_string()))?;
            Ok(Op::SetStartingTime {
                line: index(raw_line)?,
                time: time(raw_time.trim())?,
            })
        }
        "" => Err(parse_err("empty command".to_string())),
        other => Err(parse_err(format!("unknown command '{other}'"))),
    }
}

/// Parse a whole script, skipping blank lines and `#` comments.
///
/// # Errors
///
/// The first [`ScenarioError::Parse`] encountered.
pub fn parse_script<T: DeserializeOwned>(text: &str) -> Result<Vec<Op<T>>, ScenarioError> {
    text.lines()
        .enumerate()
        .filter(|(_, raw)| !is_blank(raw))
        .map(|(i, raw)| parse_command(raw, i + 1))
        .collect()
}

/// Returns `true` for lines a script ignores.
#[must_use]
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Apply `ops` in order, stopping at the first failure.
///
/// Returns the number of operations applied. On failure the clock holds
/// the state after the last successful step.
///
/// # Errors
///
/// [`ScenarioError::Step`] with the 1-based step that failed.
pub fn replay<S: Strategy>(clock: &mut Clock<S>, ops: Vec<Op<S::Time>>) -> Result<usize, ScenarioError> {
    let mut applied = 0;
    for (i, op) in ops.into_iter().enumerate() {
        let step = i + 1;
        let label = op.to_string();
        op.apply(clock)
            .map_err(|source| ScenarioError::Step { step, source })?;
        debug!(step, op = %label, "replayed");
        applied = step;
    }
    Ok(applied)
}
