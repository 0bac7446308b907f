//! The `pipal validate` command.

use std::path::PathBuf;

use anyhow::Result;

use pipal_core::parser::{load_problem_directory, parse_problem, validate_problem};

pub fn execute(path: PathBuf) -> Result<()> {
    let problems = if path.is_dir() {
        load_problem_directory(&path)?
    } else {
        vec![parse_problem(&path)?]
    };

    let mut total_warnings = 0;

    for problem in &problems {
        println!("Problem: {} ({} checks)", problem.name, problem.checks.len());

        let warnings = validate_problem(problem);
        for w in &warnings {
            let prefix = w
                .check
                .map(|index| format!("  [check #{index}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All problems valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
