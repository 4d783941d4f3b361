//! Lazypair CLI Library
//!
//! Command-line planner driving the lazypair engine over a declared
//! parameter list.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod planner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ParamSpec, PlanArgs, PlanFormat};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_json, render_text};
pub use planner::{plan, Plan};
