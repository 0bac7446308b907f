//! The `pipal whoami` command.

use std::path::PathBuf;

use anyhow::Result;

use pipal_client::load_config_from;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let user = super::client(&config)?.whoami().await?;
    println!("Hello, {}!", user.name);
    Ok(())
}
