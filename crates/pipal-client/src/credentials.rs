//! Saved login credentials.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// File inside the state directory holding the credentials.
pub const LOGIN_FILE: &str = "login.json";

/// Username and password for the course server.
///
/// Note: Custom Debug impl masks the password to keep it out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(LOGIN_FILE)
    }

    /// Load saved credentials. Fails with [`ClientError::NotLoggedIn`] when
    /// nothing has been saved.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = Self::path(state_dir);
        if !path.exists() {
            return Err(ClientError::NotLoggedIn.into());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("failed to create {}", state_dir.display()))?;
        let path = Self::path(state_dir);
        std::fs::write(&path, serde_json::to_string(self)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
