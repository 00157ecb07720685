//! Schema match review CLI.

use clap::{ColorChoice, Parser};
use matchview_cli::logging::{LogConfig, LogFormat, init_logging};
use matchview_cli::settings::resolve_config;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{render_layout, run_config, run_layout, run_summary};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    std::process::exit(match run(&cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    });
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let (config, config_path) = resolve_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Summary(args) => {
            let report = run_summary(args, &config)?;
            print_summary(&report);
        }
        Command::Layout(args) => {
            let layout = run_layout(args, config)?;
            println!("{}", render_layout(&layout, args.pretty)?);
        }
        Command::Config(args) => {
            let rendered = run_config(args, &config, config_path.as_deref())?;
            if let Some(path) = &config_path {
                println!("# {}", path.display());
            }
            print!("{rendered}");
        }
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
