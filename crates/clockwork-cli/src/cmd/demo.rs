//! `cw demo`: step through the two-line message walkthrough.
//!
//! Two lines, `a` on line 0 and `b` on line 1; relating `a → b` raises
//! `b` past `a`, and removing the relation lowers it again.

use crate::cmd::{ClockOverrides, ClockSettings};
use crate::output::{OutputMode, Renderable, pretty_section, render};
use crate::timeline::TimelineView;
use clockwork_core::config::ClockConfig;
use clockwork_core::scenario::{Op, ScenarioError, ScenarioHeader};
use clockwork_core::{Clock, Scalar, Strategy, StrategyKind, Vector};
use serde::Serialize;
use std::io::{self, Write};

const DEMO_LINES: usize = 2;

#[derive(Debug, Serialize)]
pub struct DemoStep {
    pub step: usize,
    pub op: String,
    pub timeline: TimelineView,
}

fn demo_ops<T>() -> Vec<Op<T>> {
    vec![
        Op::AddEvent {
            line: 0,
            name: "a".to_string(),
        },
        Op::AddEvent {
            line: 1,
            name: "b".to_string(),
        },
        Op::AddRelation {
            from: "a".to_string(),
            to: "b".to_string(),
        },
        Op::RemoveRelation {
            from: "a".to_string(),
            to: "b".to_string(),
        },
    ]
}

/// Replay the walkthrough, capturing the timeline after every step.
///
/// # Errors
///
/// Returns an error if a step fails or a time cannot be captured.
pub fn demo_steps<S: Strategy>() -> anyhow::Result<Vec<DemoStep>> {
    let mut clock = Clock::<S>::new(DEMO_LINES);
    demo_ops::<S::Time>()
        .into_iter()
        .enumerate()
        .map(|(i, op)| -> anyhow::Result<DemoStep> {
            let label = op.to_string();
            op.apply(&mut clock)
                .map_err(|source| ScenarioError::Step { step: i + 1, source })?;
            Ok(DemoStep {
                step: i + 1,
                op: label,
                timeline: TimelineView::capture(&clock)?,
            })
        })
        .collect()
}

/// Run the demo. Only `--strategy` is honoured; the walkthrough always uses
/// two lines.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn run_demo(
    overrides: ClockOverrides,
    project: &ClockConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let settings = ClockSettings::resolve(overrides, ScenarioHeader::default(), project);
    let steps = match settings.strategy {
        StrategyKind::Scalar => demo_steps::<Scalar>()?,
        StrategyKind::Vector => demo_steps::<Vector>()?,
    };

    render(output, &steps, |steps, w| write_steps(steps, output, w))
}

fn write_steps(steps: &[DemoStep], output: OutputMode, w: &mut dyn Write) -> io::Result<()> {
    for step in steps {
        match output {
            OutputMode::Pretty => {
                pretty_section(w, &format!("Step {}: {}", step.step, step.op))?;
                step.timeline.render_human(w)?;
                writeln!(w)?;
            }
            OutputMode::Text | OutputMode::Json => {
                writeln!(w, "# step {}: {}", step.step, step.op)?;
                step.timeline.render_table(w)?;
            }
        }
    }
    Ok(())
}
