//! The `pipal init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_once(Path::new("pipal.toml"), SAMPLE_CONFIG)?;
    write_once(Path::new("problems/hello/problem.toml"), EXAMPLE_PROBLEM)?;
    write_once(Path::new("solution.txt"), EXAMPLE_SOLUTION)?;

    println!("\nNext steps:");
    println!("  1. Run: pipal validate --problems problems");
    println!("  2. Run: pipal verify hello --env solution.txt");
    println!("  3. Edit solution.txt and verify again");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pipal configuration

base_url = "https://mastering-sqlalchemy.apps.pipal.in"
state_dir = ".pipal"

# Verify against problems on disk instead of the course server.
problems_dir = "problems"

# Limit for each command a check runs, in seconds.
# command_timeout_secs = 30
"#;

const EXAMPLE_PROBLEM: &str = r#"function_name = "greet"

[[checks]]
code = 'greet("world")'
expected = "Hello, world!"

[[checks]]
name = "greets anyone"
code = '''
name = "pipal";
result = greet(name)
'''
mode = "exec"
expected = "Hello, pipal!"
"#;

const EXAMPLE_SOLUTION: &str = r#"# Definitions checked by `pipal verify hello`.
fn greet(name) = "Hello, " + name + "!"
"#;
