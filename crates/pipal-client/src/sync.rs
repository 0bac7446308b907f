//! Version-tracked download of course files.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{PipalClient, Update};

/// File inside the state directory recording the last applied update.
pub const STATE_FILE: &str = "state.json";

/// The last update applied to this checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub version: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Load the recorded state. A missing file means nothing has been applied.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("failed to create {}", state_dir.display()))?;
        let path = state_dir.join(STATE_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Progress of [`apply_updates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Updating { version: u64 },
    Skipped { version: u64 },
    AlreadyExists(PathBuf),
    Saved(PathBuf),
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Updating { version } => write!(f, "updating to version {version}"),
            SyncEvent::Skipped { version } => write!(f, "already at version {version}"),
            SyncEvent::AlreadyExists(path) => write!(f, "already exists: {}", path.display()),
            SyncEvent::Saved(path) => write!(f, "saved {}", path.display()),
        }
    }
}

/// Download every update newer than the recorded state into `dest`.
///
/// Existing notebooks are never overwritten; learners edit them in place.
/// The state file is rewritten after each applied update.
pub async fn apply_updates(
    client: &PipalClient,
    dest: &Path,
    state_dir: &Path,
    mut on_event: impl FnMut(&SyncEvent),
) -> Result<SyncState> {
    let mut state = SyncState::load(state_dir)?;
    let updates = client.updates().await?;

    for Update { version, files } in updates {
        if version <= state.version {
            on_event(&SyncEvent::Skipped { version });
            continue;
        }
        on_event(&SyncEvent::Updating { version });
        tracing::info!(version, files = files.len(), "applying update");

        for file in &files {
            let relative = Path::new(file);
            if !is_safe_relative(relative) {
                tracing::warn!("skipping unsafe path from server: {file}");
                continue;
            }
            let path = dest.join(relative);
            if path.exists() && is_notebook(&path) {
                on_event(&SyncEvent::AlreadyExists(relative.to_path_buf()));
                continue;
            }

            let text = client.fetch_file(file).await?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            on_event(&SyncEvent::Saved(relative.to_path_buf()));
        }

        state = SyncState {
            version,
            updated_at: Some(Utc::now()),
        };
        state.save(state_dir)?;
    }

    Ok(state)
}

fn is_notebook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ipynb")
}

fn is_safe_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
