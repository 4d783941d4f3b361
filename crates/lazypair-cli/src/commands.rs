//! CLI command definitions using clap

use crate::config::ColorChoice;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Lazypair: plan pairwise-covering runs for a list of parameters
#[derive(Parser, Debug)]
#[command(name = "lazypair")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan runs covering every pair of combined parameter values
    ///
    /// Each parameter is `name=size` (pairwise-combined) or `name~size`
    /// (each value once), e.g. `lazypair plan os=3 browser=4 locale~5`.
    Plan(PlanArgs),

    /// Show the effective session configuration
    Config(ConfigArgs),
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Parameters in encounter order
    #[arg(required = true, value_name = "PARAM")]
    pub params: Vec<ParamSpec>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: PlanFormat,

    /// Session configuration file (.yaml, .yml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop with an error after this many runs
    #[arg(long, default_value = "10000")]
    pub max_runs: u64,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Session configuration file to load instead of the defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Plan output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanFormat {
    /// One line per run
    #[default]
    Text,
    /// Runs and summary as JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Whether values are pairwise-combined
    pub combine: bool,
    /// Number of values
    pub size: u16,
}

impl FromStr for ParamSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, size, combine) = if let Some((name, size)) = s.split_once('=') {
            (name, size, true)
        } else if let Some((name, size)) = s.split_once('~') {
            (name, size, false)
        } else {
            return Err(format!("expected NAME=SIZE or NAME~SIZE, got '{s}'"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing parameter name in '{s}'"));
        }
        let size = size
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid size in '{s}': {e}"))?;
        Ok(Self {
            name: name.to_string(),
            combine,
            size,
        })
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.combine { '=' } else { '~' };
        write!(f, "{}{separator}{}", self.name, self.size)
    }
}
