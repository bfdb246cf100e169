#![forbid(unsafe_code)]

mod cmd;
mod output;
mod timeline;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use clockwork_core::StrategyKind;
use clockwork_core::config;
use cmd::ClockOverrides;
use output::OutputMode;
use std::env;
use std::io;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "clockwork: Lamport and vector clocks over causally linked event lines",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Timestamp strategy: scalar (Lamport) or vector.
    #[arg(long, global = true, value_name = "STRATEGY")]
    strategy: Option<StrategyKind>,

    /// Number of lines the clock starts with.
    #[arg(long, global = true, value_name = "N")]
    lines: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn overrides(&self) -> ClockOverrides {
        ClockOverrides {
            strategy: self.strategy,
            lines: self.lines,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Replay",
        about = "Replay a scenario file",
        long_about = "Replay a TOML scenario or a one-command-per-line script and render the resulting timeline.",
        after_help = "EXAMPLES:\n    # Replay a TOML scenario\n    cw run exchange.toml\n\n    # Replay a script with vector clocks\n    cw run exchange.cw --strategy vector\n\n    # Emit machine-readable output\n    cw run exchange.toml --json"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        next_help_heading = "Replay",
        about = "Apply commands from stdin",
        long_about = "Read one command per line from stdin, reporting failures as they happen, and render the final timeline.",
        after_help = "EXAMPLES:\n    # Build a clock interactively\n    cw shell --lines 2\n\n    # Pipe a script and stop on the first error\n    cw shell --strict < exchange.cw"
    )]
    Shell(cmd::shell::ShellArgs),

    #[command(
        next_help_heading = "Replay",
        about = "Walk through a two-line message exchange",
        long_about = "Add one event on each of two lines, relate them, then remove the relation, printing the timeline after every step.",
        after_help = "EXAMPLES:\n    # Lamport walkthrough\n    cw demo\n\n    # Same steps with vector clocks\n    cw demo --strategy vector"
    )]
    Demo,

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cw completions bash\n\n    # Generate zsh completions\n    cw completions zsh"
    )]
    Completions {
        /// Target shell for completion script generation.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CLOCKWORK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "clockwork_core=debug,cw=debug,info"
        } else if verbose {
            "info"
        } else {
            "warn"
        })
    });

    let format = env::var("CLOCKWORK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "cw", &mut io::stdout());
        return Ok(());
    }

    let project_root = env::current_dir()?;
    let effective = config::resolve_config(&project_root, cli.json)?;
    let output = cli
        .format
        .unwrap_or_else(|| OutputMode::from_config(&effective.resolved_output));
    debug!(?output, clock = ?effective.project.clock, "resolved configuration");

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let overrides = cli.overrides();
    let clock = &effective.project.clock;
    match cli.command {
        Commands::Run(ref args) => cmd::run::run_run(args, overrides, clock, output),
        Commands::Shell(ref args) => cmd::shell::run_shell(args, overrides, clock, output),
        Commands::Demo => cmd::demo::run_demo(overrides, clock, output),
        Commands::Completions { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["cw", "demo", "--strategy", "vector", "--json"]);
        assert_eq!(cli.strategy, Some(StrategyKind::Vector));
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Demo));
    }

    #[test]
    fn lamport_is_accepted_as_a_strategy_alias() {
        let cli = Cli::parse_from(["cw", "--strategy", "lamport", "demo"]);
        assert_eq!(cli.strategy, Some(StrategyKind::Scalar));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let result = Cli::try_parse_from(["cw", "--strategy", "sundial", "demo"]);
        assert!(result.is_err());
    }

    #[test]
    fn format_flag_parses_value_enum() {
        let cli = Cli::parse_from(["cw", "--format", "text", "demo"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn overrides_carry_strategy_and_lines() {
        let cli = Cli::parse_from(["cw", "shell", "--lines", "5"]);
        assert_eq!(
            cli.overrides(),
            ClockOverrides {
                strategy: None,
                lines: Some(5)
            }
        );
    }

    #[test]
    fn run_requires_a_file() {
        assert!(Cli::try_parse_from(["cw", "run"]).is_err());
        let cli = Cli::parse_from(["cw", "run", "exchange.toml"]);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn shell_strict_flag_parses() {
        let cli = Cli::parse_from(["cw", "shell", "--strict"]);
        assert!(matches!(
            cli.command,
            Commands::Shell(cmd::shell::ShellArgs { strict: true })
        ));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["cw", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions {
                shell: clap_complete::Shell::Bash,
            }
        ));
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
