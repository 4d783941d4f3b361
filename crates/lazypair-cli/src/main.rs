//! Lazypair CLI: plan pairwise-covering test runs
//!
//! ## Usage
//!
//! ```bash
//! lazypair plan os=3 browser=4 locale~5   # One line per run
//! lazypair plan a=2 b=2 --format json     # Runs and summary as JSON
//! lazypair config --config lazypair.yaml  # Show effective configuration
//! ```

use clap::Parser;
use lazypair::SessionConfig;
use lazypair_cli::{
    plan, render_json, render_text, Cli, CliConfig, CliResult, Commands, ConfigArgs, PlanArgs,
    PlanFormat, Verbosity,
};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Plan(args) => run_plan(&config, &args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_session_config(path: Option<&Path>) -> CliResult<SessionConfig> {
    match path {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::default()),
    }
}

fn run_plan(config: &CliConfig, args: &PlanArgs) -> CliResult<()> {
    let session_config = load_session_config(args.config.as_deref())?;
    let plan = plan(&args.params, session_config, args.max_runs)?;
    if config.verbosity.is_quiet() {
        return Ok(());
    }
    let rendered = match args.format {
        PlanFormat::Text => render_text(&plan, config.color.should_color()),
        PlanFormat::Json => render_json(&plan)?,
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let session_config = load_session_config(args.config.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&session_config)?);
    } else {
        print!("{}", serde_yaml_ng::to_string(&session_config)?);
    }
    Ok(())
}
