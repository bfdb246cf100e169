//! Strategy-independent view of a clock's committed timestamps.
//!
//! Times are captured both as JSON values (for `--format json`) and as
//! their display strings, so rendering never needs the strategy type.

use crate::output::{Renderable, pretty_kv, pretty_section};
use clockwork_core::{Clock, Strategy, StrategyKind};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub strategy: StrategyKind,
    pub lines: Vec<LineView>,
    pub relations: Vec<RelationView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub line: usize,
    pub start: Value,
    #[serde(skip)]
    pub start_display: String,
    pub events: Vec<EventView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub name: String,
    pub position: usize,
    pub time: Value,
    #[serde(skip)]
    pub time_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationView {
    pub from: String,
    pub to: String,
}

impl TimelineView {
    /// Capture the committed state of `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if a time value cannot be represented as JSON.
    pub fn capture<S: Strategy>(clock: &Clock<S>) -> serde_json::Result<Self> {
        let mut lines = Vec::with_capacity(clock.line_count());
        for (line, events) in clock.time().into_iter().enumerate() {
            let (start, start_display) = match clock.starting_time(line) {
                Ok(t) => (serde_json::to_value(t)?, t.to_string()),
                Err(_) => (Value::Null, String::new()),
            };
            let events = events
                .into_iter()
                .enumerate()
                .map(|(i, event)| {
                    Ok(EventView {
                        position: i + 1,
                        time: serde_json::to_value(&event.time)?,
                        time_display: event.time.to_string(),
                        name: event.name,
                        caused_by: event.caused_by,
                    })
                })
                .collect::<serde_json::Result<Vec<_>>>()?;
            lines.push(LineView {
                line,
                start,
                start_display,
                events,
            });
        }

        let relations = clock
            .relations()
            .into_iter()
            .map(|(from, to)| RelationView { from, to })
            .collect();

        Ok(Self {
            strategy: S::KIND,
            lines,
            relations,
        })
    }

    fn event_count(&self) -> usize {
        self.lines.iter().map(|l| l.events.len()).sum()
    }
}

impl Renderable for TimelineView {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(
            w,
            &format!(
                "Timeline ({}, {} lines, {} events)",
                self.strategy,
                self.lines.len(),
                self.event_count()
            ),
        )?;
        for line in &self.lines {
            pretty_kv(w, &format!("line {}", line.line), format!("start {}", line.start_display))?;
            for event in &line.events {
                match event.caused_by {
                    Some(ref cause) => writeln!(
                        w,
                        "  {:>3}  {:<16} {}  <- {cause}",
                        event.position, event.name, event.time_display
                    )?,
                    None => writeln!(
                        w,
                        "  {:>3}  {:<16} {}",
                        event.position, event.name, event.time_display
                    )?,
                }
            }
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        for line in &self.lines {
            for event in &line.events {
                writeln!(
                    w,
                    "{}  {}  {}  {}  {}",
                    line.line,
                    event.position,
                    event.name,
                    event.time_display,
                    event.caused_by.as_deref().unwrap_or("-")
                )?;
            }
        }
        Ok(())
    }

    fn table_headers() -> &'static [&'static str] {
        &["line", "pos", "name", "time", "cause"]
    }
}
