//! `cw run`: replay a scenario file and render the resulting timeline.

use crate::cmd::{ClockOverrides, ClockSettings};
use crate::output::{CliError, OutputMode, render_error, render_item};
use crate::timeline::TimelineView;
use anyhow::Context;
use clap::Args;
use clockwork_core::config::ClockConfig;
use clockwork_core::scenario::{self, Op, Scenario, ScenarioError, ScenarioHeader};
use clockwork_core::{Clock, Scalar, Strategy, StrategyKind, Vector};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario file: TOML (`*.toml`) or a one-command-per-line script.
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Toml,
    Script,
}

impl SourceFormat {
    fn of(path: &Path) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
        {
            Self::Toml
        } else {
            Self::Script
        }
    }
}

/// Replay `args.file` and render the timeline.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any step
/// fails. The failure is rendered before returning.
pub fn run_run(
    args: &RunArgs,
    overrides: ClockOverrides,
    project: &ClockConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let format = SourceFormat::of(&args.file);

    let header = match format {
        SourceFormat::Toml => ScenarioHeader::from_toml(&text).or_else(|err| fail(output, &err))?,
        SourceFormat::Script => ScenarioHeader::default(),
    };
    let settings = ClockSettings::resolve(overrides, header, project);
    info!(
        file = %args.file.display(),
        strategy = %settings.strategy,
        lines = settings.lines,
        "running scenario"
    );

    let view = match settings.strategy {
        StrategyKind::Scalar => replay_file::<Scalar>(&text, format, settings.lines, output)?,
        StrategyKind::Vector => replay_file::<Vector>(&text, format, settings.lines, output)?,
    };
    render_item(&view, output)?;
    Ok(())
}

fn replay_file<S: Strategy>(
    text: &str,
    format: SourceFormat,
    lines: usize,
    output: OutputMode,
) -> anyhow::Result<TimelineView> {
    let parsed: Result<Vec<Op<S::Time>>, ScenarioError> = match format {
        SourceFormat::Toml => Scenario::<S::Time>::from_toml(text).map(|s| s.ops),
        SourceFormat::Script => scenario::parse_script(text),
    };
    let ops = parsed.or_else(|err| fail(output, &err))?;

    let mut clock = Clock::<S>::new(lines);
    let applied = scenario::replay(&mut clock, ops).or_else(|err| fail(output, &err))?;
    info!(applied, "scenario replayed");
    Ok(TimelineView::capture(&clock)?)
}

fn fail<T>(output: OutputMode, err: &ScenarioError) -> anyhow::Result<T> {
    render_error(output, &CliError::from(err))?;
    anyhow::bail!("scenario failed ({})", err.code())
}
