//! The `pipal submit` command.

use std::path::PathBuf;

use anyhow::Result;

use pipal_client::load_config_from;

pub async fn execute(file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let assignment = super::client(&config)?.submit(&file).await?;
    println!("Assignment {assignment} is submitted successfully!");
    Ok(())
}
