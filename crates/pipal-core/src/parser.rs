//! Problem file parser and local registry.
//!
//! A problem lives in its own directory as `problem.toml` or `problem.json`;
//! that directory is the problem's root.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::error::RegistryError;
use crate::model::{CheckSpec, EvalMode, ProblemMetadata};
use crate::traits::ProblemRegistry;

/// File names a problem directory may use, in lookup order.
pub const PROBLEM_FILES: [&str; 2] = ["problem.toml", "problem.json"];

/// Serialization of a problem file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemFormat {
    Toml,
    Json,
}

impl ProblemFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(ProblemFormat::Toml),
            "json" => Some(ProblemFormat::Json),
            _ => None,
        }
    }
}

/// Parse a problem file. The name defaults to the containing directory's
/// name, and that directory becomes the problem root.
pub fn parse_problem(path: &Path) -> Result<ProblemMetadata> {
    let format = ProblemFormat::from_path(path)
        .with_context(|| format!("unrecognized problem file type: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read problem file: {}", path.display()))?;

    let mut metadata = parse_problem_str(&content, format)
        .with_context(|| format!("failed to parse problem file: {}", path.display()))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if metadata.name.is_empty() {
        if let Some(dir_name) = dir.file_name() {
            metadata.name = dir_name.to_string_lossy().into_owned();
        }
    }
    metadata.root = Some(dir.to_path_buf());
    Ok(metadata)
}

/// Parse problem metadata from a string.
pub fn parse_problem_str(content: &str, format: ProblemFormat) -> Result<ProblemMetadata> {
    let metadata = match format {
        ProblemFormat::Toml => toml::from_str(content).context("invalid TOML")?,
        ProblemFormat::Json => serde_json::from_str(content).context("invalid JSON")?,
    };
    Ok(metadata)
}

/// The problem file inside `dir`, if any.
pub fn find_problem_file(dir: &Path) -> Option<PathBuf> {
    PROBLEM_FILES
        .iter()
        .map(|file| dir.join(file))
        .find(|path| path.is_file())
}

/// Load every problem under `dir`, sorted by name.
///
/// Each immediate subdirectory holding a problem file is one problem.
/// Problems that fail to parse are skipped with a warning.
pub fn load_problem_directory(dir: &Path) -> Result<Vec<ProblemMetadata>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut problems = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(file) = find_problem_file(&path) else {
            continue;
        };
        match parse_problem(&file) {
            Ok(problem) => problems.push(problem),
            Err(e) => tracing::warn!("skipping {}: {e:#}", file.display()),
        }
    }

    problems.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(problems)
}

/// A warning from problem validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// Problem name.
    pub problem: String,
    /// 1-based check index, when the warning concerns one check.
    pub check: Option<usize>,
    pub message: String,
}

/// Validate a problem for common authoring mistakes.
pub fn validate_problem(metadata: &ProblemMetadata) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |check: Option<usize>, message: String| {
        warnings.push(ValidationWarning {
            problem: metadata.name.clone(),
            check,
            message,
        })
    };

    match (&metadata.function_name, &metadata.script_name) {
        (None, None) => warn(
            None,
            "no function_name or script_name, verification is not supported".into(),
        ),
        (Some(_), Some(_)) => warn(
            None,
            "both function_name and script_name are set, both must exist to pass".into(),
        ),
        _ => {}
    }

    if metadata.checks.is_empty() {
        warn(None, "problem has no checks".into());
    }

    let mut seen = HashSet::new();
    for (i, raw) in metadata.checks.iter().enumerate() {
        let index = i + 1;
        let spec = match CheckSpec::from_json(raw) {
            Ok(spec) => spec,
            Err(e) => {
                warn(Some(index), e.to_string());
                continue;
            }
        };

        let name = spec.display_name().to_string();
        if !seen.insert(name.clone()) {
            warn(Some(index), format!("duplicate check name: {name}"));
        }

        if let CheckSpec::Function(f) = &spec {
            if f.mode == EvalMode::Exec && !f.code.contains("result") {
                warn(
                    Some(index),
                    "exec-mode check never assigns `result`".into(),
                );
            }
        }
    }

    warnings
}

/// A registry reading problems from `<dir>/<name>/problem.{toml,json}`.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    dir: PathBuf,
}

impl LocalRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All problems in the registry.
    pub fn list(&self) -> Result<Vec<ProblemMetadata>> {
        load_problem_directory(&self.dir)
    }
}

#[async_trait]
impl ProblemRegistry for LocalRegistry {
    async fn fetch(&self, name: &str) -> Result<ProblemMetadata, RegistryError> {
        // names are single path components
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." || name == "." {
            return Err(RegistryError::UnknownProblem(name.to_string()));
        }

        let dir = self.dir.join(name);
        let file = find_problem_file(&dir)
            .ok_or_else(|| RegistryError::UnknownProblem(name.to_string()))?;
        tracing::debug!(problem = name, file = %file.display(), "loading local problem");

        let mut metadata = parse_problem(&file).map_err(|e| RegistryError::Malformed {
            name: name.to_string(),
            reason: format!("{e:#}"),
        })?;
        metadata.name = name.to_string();
        Ok(metadata)
    }
}
