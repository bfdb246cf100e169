pub mod demo;
pub mod run;
pub mod shell;

use clockwork_core::StrategyKind;
use clockwork_core::config::ClockConfig;
use clockwork_core::scenario::ScenarioHeader;

/// Clock shape a command starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub strategy: StrategyKind,
    pub lines: usize,
}

/// Values given on the command line, which win over every other source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockOverrides {
    pub strategy: Option<StrategyKind>,
    pub lines: Option<usize>,
}

impl ClockSettings {
    /// Resolve flag > scenario header > project config.
    pub fn resolve(
        overrides: ClockOverrides,
        header: ScenarioHeader,
        project: &ClockConfig,
    ) -> Self {
        Self {
            strategy: overrides
                .strategy
                .or(header.strategy)
                .unwrap_or(project.strategy),
            lines: overrides.lines.or(header.lines).unwrap_or(project.lines),
        }
    }
}
