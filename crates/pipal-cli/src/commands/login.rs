//! The `pipal login` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use pipal_client::{load_config_from, Credentials, PipalClient};

pub async fn execute(
    email: Option<String>,
    password: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let email = match email {
        Some(e) => e,
        None => prompt("Email")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    let credentials = Credentials::new(email, password);
    let client = PipalClient::new(&config.base_url, credentials.clone())?;
    let user = client.whoami().await?;
    println!("Hello, {}!", user.name);

    credentials.save(&config.state_dir)?;
    println!("Login successful!");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("failed to read {}", label.to_lowercase()))?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} is required", label.to_lowercase());
    }
    Ok(value)
}
