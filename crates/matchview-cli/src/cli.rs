//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use matchview_model::CandidateStatus;

#[derive(Parser)]
#[command(
    name = "matchview",
    version,
    about = "Schema match review - aggregate candidates and lay out the match grid",
    long_about = "Aggregate per-matcher schema match candidates and compute the review grid.\n\n\
                  Reads a JSON snapshot of scored candidates, matcher weights and\n\
                  source/target ontologies. Layouts are printed as JSON geometry."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Layout configuration file (default: the per-user layout.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print aggregated candidates and status counts.
    Summary(SummaryArgs),

    /// Compute the match grid layout and print it as JSON.
    Layout(LayoutArgs),

    /// Print the effective layout configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Only list candidates scoring at least this much.
    #[arg(long = "threshold", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Maximum number of candidate rows to print.
    #[arg(long = "limit", value_name = "N", default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args)]
pub struct LayoutArgs {
    /// Snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Focused cell as SOURCE:TARGET.
    #[arg(long = "focus", value_name = "SOURCE:TARGET", value_parser = parse_focus)]
    pub focus: Option<FocusArg>,

    /// Flip expansion of a source ontology node (column, category or id).
    #[arg(long = "toggle-source", value_name = "KEY")]
    pub toggle_source: Vec<String>,

    /// Flip expansion of a target ontology node (column, category or id).
    #[arg(long = "toggle-target", value_name = "KEY")]
    pub toggle_target: Vec<String>,

    /// Minimum aggregated score (default: from configuration).
    #[arg(long = "threshold", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Allowed statuses; repeat to allow several.
    #[arg(long = "status", value_enum)]
    pub status: Vec<StatusArg>,

    /// Zero-based page over the source columns.
    #[arg(long = "page", value_name = "N")]
    pub page: Option<usize>,

    /// Show a single source column; pagination is ignored.
    #[arg(long = "source", value_name = "COLUMN")]
    pub source: Option<String>,

    /// Restrict sources to these ontology nodes or columns.
    #[arg(long = "select-source", value_name = "KEY")]
    pub select_source: Vec<String>,

    /// Restrict targets to these ontology nodes or columns.
    #[arg(long = "select-target", value_name = "KEY")]
    pub select_target: Vec<String>,

    /// Pretty-print the JSON output.
    #[arg(long = "pretty")]
    pub pretty: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the configuration path.
    #[arg(long = "write")]
    pub write: bool,
}

/// Candidate status choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Idle,
    Accepted,
    Rejected,
    Discarded,
}

impl From<StatusArg> for CandidateStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Idle => CandidateStatus::Idle,
            StatusArg::Accepted => CandidateStatus::Accepted,
            StatusArg::Rejected => CandidateStatus::Rejected,
            StatusArg::Discarded => CandidateStatus::Discarded,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// A focused cell given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusArg {
    pub source: String,
    pub target: String,
}

/// Splits `SOURCE:TARGET` at the first colon.
pub fn parse_focus(raw: &str) -> Result<FocusArg, String> {
    match raw.split_once(':') {
        Some((source, target)) if !source.is_empty() && !target.is_empty() => Ok(FocusArg {
            source: source.to_string(),
            target: target.to_string(),
        }),
        _ => Err(format!("expected SOURCE:TARGET, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn focus_splits_at_first_colon() {
        let focus = parse_focus("gender:sex").expect("valid focus");
        assert_eq!((focus.source.as_str(), focus.target.as_str()), ("gender", "sex"));
        let focus = parse_focus("a:b:c").expect("valid focus");
        assert_eq!(focus.target, "b:c");
        assert!(parse_focus("gender").is_err());
        assert!(parse_focus(":sex").is_err());
    }

    #[test]
    fn layout_flags_parse() {
        let cli = Cli::try_parse_from([
            "matchview",
            "layout",
            "snapshot.json",
            "--focus",
            "gender:sex",
            "--toggle-target",
            "demographic",
            "--status",
            "idle",
            "--status",
            "accepted",
            "--page",
            "2",
        ])
        .expect("valid arguments");
        let Command::Layout(args) = cli.command else {
            panic!("expected layout command");
        };
        assert_eq!(args.focus.map(|focus| focus.source), Some("gender".to_string()));
        assert_eq!(args.toggle_target, vec!["demographic".to_string()]);
        assert_eq!(args.status.len(), 2);
        assert_eq!(args.page, Some(2));
    }
}
