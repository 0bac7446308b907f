//! The `pipal problems` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use pipal_client::load_config_from;
use pipal_core::model::ProblemMetadata;
use pipal_core::parser::LocalRegistry;

pub fn execute(problems_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let dir = problems_dir
        .or(config.problems_dir)
        .context("no problem directory; pass --problems-dir or set problems_dir in pipal.toml")?;

    let problems = LocalRegistry::new(dir).list()?;
    if problems.is_empty() {
        println!("No problems found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Problem", "Target", "Checks"]);
    for problem in &problems {
        table.add_row(vec![
            Cell::new(&problem.name),
            Cell::new(target(problem)),
            Cell::new(problem.checks.len()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn target(problem: &ProblemMetadata) -> String {
    match (&problem.function_name, &problem.script_name) {
        (Some(f), Some(s)) => format!("function {f}, program {s}"),
        (Some(f), None) => format!("function {f}"),
        (None, Some(s)) => format!("program {s}"),
        (None, None) => "-".to_string(),
    }
}
