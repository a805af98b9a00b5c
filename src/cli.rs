// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `zpsexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "zpsexec",
    version,
    about = "Run a ZPS pipeline script as a chain of runner processes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline script (JSON).
    #[arg(long, value_name = "PATH")]
    pub script: PathBuf,

    /// Engine config file (TOML). Built-in defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override `[engine].shared_path` from the config.
    #[arg(long, value_name = "PATH")]
    pub shared_path: Option<PathBuf>,

    /// Task log file. Runner output goes to stdout when omitted.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Working directory for the runners (created if missing).
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub work: PathBuf,

    /// Task id; a random UUID is used when omitted.
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Environment override for every runner, as KEY=VALUE. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Script argument passed as `--global KEY=VALUE`. Repeatable.
    ///
    /// Values are parsed as JSON when possible (`n=3`, `flag=true`), otherwise
    /// taken as plain strings.
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ZPSEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and route the script, print the first command line, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
