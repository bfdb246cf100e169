//! `cw shell`: apply one-line commands read from stdin.
//!
//! Besides the script commands (`event`, `relate`, ...) the shell answers
//! three queries:
//!
//! - `show` renders the current timeline,
//! - `locate <name>` prints an event's position,
//! - `order <a> <b>` compares two events' timestamps.
//!
//! A failing command is reported on stderr and the session continues
//! unless `--strict` is set. The final timeline is rendered at end of input.

use crate::cmd::{ClockOverrides, ClockSettings};
use crate::output::{CliError, OutputMode, render_error_to, render_item_to};
use crate::timeline::TimelineView;
use anyhow::Context;
use clap::Args;
use clockwork_core::config::ClockConfig;
use clockwork_core::scenario::{self, ScenarioError, ScenarioHeader};
use clockwork_core::{
    Clock, ClockError, Position, Scalar, Strategy, StrategyKind, TimeOrder, Vector,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Stop at the first failing command with a non-zero exit code.
    #[arg(long)]
    pub strict: bool,
}

/// Run an interactive session over stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, output cannot be written, or
/// (with `--strict`) a command fails.
pub fn run_shell(
    args: &ShellArgs,
    overrides: ClockOverrides,
    project: &ClockConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let settings = ClockSettings::resolve(overrides, ScenarioHeader::default(), project);
    info!(strategy = %settings.strategy, lines = settings.lines, "starting shell");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    match settings.strategy {
        StrategyKind::Scalar => Session::<Scalar>::new(settings.lines, args.strict, output)
            .run(stdin.lock(), &mut out, &mut err),
        StrategyKind::Vector => Session::<Vector>::new(settings.lines, args.strict, output)
            .run(stdin.lock(), &mut out, &mut err),
    }
}

#[derive(Debug, Serialize)]
struct LocateView<'a> {
    name: &'a str,
    #[serde(flatten)]
    position: Position,
}

#[derive(Debug, Serialize)]
struct OrderView<'a> {
    a: &'a str,
    b: &'a str,
    order: TimeOrder,
}

enum Query<'a> {
    Show,
    Locate(&'a str),
    Order(&'a str, &'a str),
}

impl<'a> Query<'a> {
    /// Recognize a query; `None` means the text is a mutation command.
    fn parse(text: &'a str, line: usize) -> Option<Result<Self, ScenarioError>> {
        let mut words = text.split_whitespace();
        let command = words.next()?;
        let args: Vec<&str> = words.collect();
        let arity = |want: usize| ScenarioError::Parse {
            line,
            message: format!("'{command}' takes {want} argument(s), got {}", args.len()),
        };
        let query = match (command, args.as_slice()) {
            ("show", []) => Ok(Self::Show),
            ("show", _) => Err(arity(0)),
            ("locate", [name]) => Ok(Self::Locate(*name)),
            ("locate", _) => Err(arity(1)),
            ("order", [a, b]) => Ok(Self::Order(*a, *b)),
            ("order", _) => Err(arity(2)),
            _ => return None,
        };
        Some(query)
    }
}

struct Session<S: Strategy> {
    clock: Clock<S>,
    strict: bool,
    output: OutputMode,
    failures: usize,
}

impl<S: Strategy> Session<S> {
    fn new(lines: usize, strict: bool, output: OutputMode) -> Self {
        Self {
            clock: Clock::new(lines),
            strict,
            output,
            failures: 0,
        }
    }

    fn run(
        mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> anyhow::Result<()> {
        for (i, raw) in input.lines().enumerate() {
            let raw = raw.context("Failed to read command")?;
            if scenario::is_blank(&raw) {
                continue;
            }
            let line = i + 1;
            if let Err(cli_error) = self.execute(raw.trim(), line, out)? {
                self.failures += 1;
                render_error_to(self.output, &cli_error, err)?;
                if self.strict {
                    anyhow::bail!("line {line}: command failed");
                }
            }
        }

        info!(failures = self.failures, "shell input exhausted");
        self.render_timeline(out)
    }

    /// Outer `Err` is an I/O failure; inner `Err` is a command failure.
    fn execute(
        &mut self,
        text: &str,
        line: usize,
        out: &mut dyn Write,
    ) -> anyhow::Result<Result<(), CliError>> {
        match Query::parse(text, line) {
            Some(Ok(query)) => self.answer(&query, out),
            Some(Err(parse)) => Ok(Err(CliError::from(&parse))),
            None => match scenario::parse_command::<S::Time>(text, line) {
                Ok(op) => {
                    let label = op.to_string();
                    match op.apply(&mut self.clock) {
                        Ok(()) => {
                            debug!(line, op = %label, "applied");
                            Ok(Ok(()))
                        }
                        Err(source) => {
                            let mut failure = CliError::from(&source);
                            failure.message = format!("line {line}: {}", failure.message);
                            Ok(Err(failure))
                        }
                    }
                }
                Err(parse) => Ok(Err(CliError::from(&parse))),
            },
        }
    }

    fn answer(&self, query: &Query<'_>, out: &mut dyn Write) -> anyhow::Result<Result<(), CliError>> {
        match *query {
            Query::Show => {
                self.render_timeline(out)?;
            }
            Query::Locate(name) => {
                let Some(position) = self.clock.locate_event(name) else {
                    return Ok(Err(CliError::from(&ClockError::UnknownEventReference(
                        name.to_string(),
                    ))));
                };
                let view = LocateView { name, position };
                self.write(out, &view, |v, w| {
                    writeln!(w, "{} line {} position {}", v.name, v.position.line, v.position.index)
                })?;
            }
            Query::Order(a, b) => match self.clock.order(a, b) {
                Ok(order) => {
                    let view = OrderView { a, b, order };
                    self.write(out, &view, |v, w| writeln!(w, "{} {} {}", v.a, v.order, v.b))?;
                }
                Err(e) => return Ok(Err(CliError::from(&e))),
            },
        }
        Ok(Ok(()))
    }

    fn write<T: Serialize>(
        &self,
        out: &mut dyn Write,
        value: &T,
        human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    ) -> anyhow::Result<()> {
        if self.output.is_json() {
            serde_json::to_writer(&mut *out, value)?;
            writeln!(out)?;
        } else {
            human_fn(value, out)?;
        }
        Ok(())
    }

    fn render_timeline(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let view = TimelineView::capture(&self.clock)?;
        render_item_to(&view, self.output, out)?;
        Ok(())
    }
}
