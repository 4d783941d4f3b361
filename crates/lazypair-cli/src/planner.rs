//! Drives a session over a fixed parameter list

use crate::commands::ParamSpec;
use crate::error::{CliError, CliResult};
use lazypair::{Session, SessionConfig, SessionSummary};
use serde::Serialize;
use tracing::debug;

/// Planned runs for a parameter list
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Parameters in encounter order
    pub parameters: Vec<ParamSpec>,
    /// Picked index per parameter, one row per run
    pub runs: Vec<Vec<u16>>,
    /// Session state after the last run
    pub summary: SessionSummary,
}

/// Plan runs until the session completes or `max_runs` is reached
pub fn plan(params: &[ParamSpec], config: SessionConfig, max_runs: u64) -> CliResult<Plan> {
    if params.is_empty() {
        return Err(CliError::invalid_argument("at least one parameter is required"));
    }
    let mut session: Session<String> = Session::with_config(config);
    let mut runs = Vec::new();
    loop {
        if runs.len() as u64 >= max_runs {
            return Err(CliError::RunLimit { limit: max_runs });
        }
        session.start_new_run()?;
        let run = params
            .iter()
            .map(|param| session.pick(param.name.clone(), param.combine, param.size))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(run = runs.len() + 1, picks = ?run, "planned run");
        runs.push(run);
        if !session.has_pending_combinations()? {
            break;
        }
    }
    Ok(Plan {
        parameters: params.to_vec(),
        runs,
        summary: session.summary(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn params(specs: &[&str]) -> Vec<ParamSpec> {
        specs.iter().map(|spec| spec.parse().unwrap()).collect()
    }

    #[test]
    fn test_two_booleans() {
        let plan = plan(&params(&["a=2", "b=2"]), SessionConfig::default(), 100).unwrap();
        assert_eq!(plan.runs, vec![vec![0, 0], vec![1, 1], vec![0, 1], vec![1, 0]]);
        assert!(plan.summary.complete);
    }

    #[test]
    fn test_run_limit() {
        let err = plan(&params(&["a=5", "b=5"]), SessionConfig::default(), 3).unwrap_err();
        assert!(matches!(err, CliError::RunLimit { limit: 3 }));
    }

    #[test]
    fn test_invalid_domain_size_reported() {
        let err = plan(&params(&["a=0"]), SessionConfig::default(), 10).unwrap_err();
        assert!(matches!(err, CliError::Pairwise(_)));
    }

    #[test]
    fn test_empty_parameter_list() {
        assert!(plan(&[], SessionConfig::default(), 10).is_err());
    }
}
