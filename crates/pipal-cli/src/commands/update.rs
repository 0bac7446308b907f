//! The `pipal update` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use pipal_client::{apply_updates, load_config_from, SyncState};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let client = super::client(&config)?;

    let before = SyncState::load(&config.state_dir)?;
    let after = apply_updates(&client, Path::new("."), &config.state_dir, |event| {
        println!("{event}")
    })
    .await?;

    if after.version == before.version {
        println!("Already up to date (version {}).", after.version);
    }
    Ok(())
}
