//! pipal configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Course server used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://mastering-sqlalchemy.apps.pipal.in";

/// Name of the per-project config file.
pub const CONFIG_FILE: &str = "pipal.toml";

/// Top-level pipal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipalConfig {
    /// Course server URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Directory for credentials and sync state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Local problem directory. Problems are fetched from the server when unset.
    #[serde(default)]
    pub problems_dir: Option<PathBuf>,
    /// Where the files of server-hosted problems live locally.
    #[serde(default = "default_problems_root")]
    pub problems_root: PathBuf,
    /// Limit for each command a check spawns. No limit when unset.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(".pipal")
}
fn default_problems_root() -> PathBuf {
    PathBuf::from("problems")
}

impl Default for PipalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            state_dir: default_state_dir(),
            problems_dir: None,
            problems_root: default_problems_root(),
            command_timeout_secs: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

impl PipalConfig {
    fn resolve(mut self) -> Self {
        self.base_url = resolve_env_vars(&self.base_url);
        self.state_dir = resolve_path(&self.state_dir);
        self.problems_dir = self.problems_dir.as_deref().map(resolve_path);
        self.problems_root = resolve_path(&self.problems_root);
        self
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `pipal.toml` in the current directory
/// 2. `~/.config/pipal/config.toml`
///
/// `PIPAL_BASE_URL` overrides `base_url`.
pub fn load_config() -> Result<PipalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PipalConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PipalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PipalConfig::default(),
    };

    if let Ok(url) = std::env::var("PIPAL_BASE_URL") {
        config.base_url = url;
    }

    Ok(config.resolve())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pipal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PIPAL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_PIPAL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_PIPAL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_PIPAL_UNSET_VAR}/x"), "/x");
        assert_eq!(resolve_env_vars("open ${brace"), "open ${brace");
        std::env::remove_var("_PIPAL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = PipalConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.state_dir, PathBuf::from(".pipal"));
        assert_eq!(config.problems_root, PathBuf::from("problems"));
        assert!(config.problems_dir.is_none());
        assert!(config.command_timeout_secs.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let config: PipalConfig = toml::from_str(
            r#"
problems_dir = "course/problems"
command_timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(config.problems_dir, Some(PathBuf::from("course/problems")));
        assert_eq!(config.command_timeout_secs, Some(30));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn load_explicit_path_resolves_vars() {
        std::env::set_var("_PIPAL_TEST_STATE", "/tmp/pipal-state");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "state_dir = \"${_PIPAL_TEST_STATE}\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/tmp/pipal-state"));
        std::env::remove_var("_PIPAL_TEST_STATE");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/pipal.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
