//! Output formatting

use crate::error::CliResult;
use crate::planner::Plan;
use console::style;
use std::fmt::Write as _;

/// Render one line per run followed by the summary line
#[must_use]
pub fn render_text(plan: &Plan, use_color: bool) -> String {
    let mut out = String::new();
    for (number, run) in plan.runs.iter().enumerate() {
        let label = format!("run {}:", number + 1);
        if use_color {
            let _ = write!(out, "{}", style(label).cyan().bold());
        } else {
            out.push_str(&label);
        }
        for (param, index) in plan.parameters.iter().zip(run) {
            let _ = write!(out, " {}={index}", param.name);
        }
        out.push('\n');
    }
    let summary = plan.summary.to_string();
    if use_color {
        let _ = writeln!(out, "{}", style(summary).green());
    } else {
        let _ = writeln!(out, "{summary}");
    }
    if let Some((fewest, most)) = plan.summary.count_spread() {
        let _ = writeln!(out, "picks per value: {fewest}..={most}");
    }
    out
}

/// Render the whole plan as pretty JSON
pub fn render_json(plan: &Plan) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}
