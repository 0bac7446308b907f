pub mod init;
pub mod login;
pub mod problems;
pub mod submit;
pub mod update;
pub mod validate;
pub mod verify;
pub mod whoami;

use anyhow::Result;

use pipal_client::{Credentials, PipalClient, PipalConfig};

/// Client authenticated with the saved credentials.
pub fn client(config: &PipalConfig) -> Result<PipalClient> {
    let credentials = Credentials::load(&config.state_dir)?;
    Ok(PipalClient::new(&config.base_url, credentials)?
        .with_problems_root(config.problems_root.clone()))
}
