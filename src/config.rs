//! Compiler configuration.
//!
//! Defaults match the conventional project layout (`app/` sources,
//! `.ignite/` output). A project can override them in the `compiler` section
//! of its `ignite.json`:
//!
//! ```json
//! { "name": "my-app", "compiler": { "screensDir": "screens", "debounceMs": 250 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{IgniteError, Result};

pub const PROJECT_FILE: &str = "ignite.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    #[serde(skip)]
    pub project_root: PathBuf,
    /// Screen sources, relative to the project root.
    pub screens_dir: String,
    /// Generated output, relative to the project root.
    pub output_dir: String,
    /// Source file extension, without the dot.
    pub extension: String,
    pub debounce_ms: u64,
    /// Directory or file names skipped during discovery and watching.
    pub ignore: Vec<String>,
    /// Parse generated modules back and report syntax errors.
    pub validate_output: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            screens_dir: "app".to_string(),
            output_dir: ".ignite".to_string(),
            extension: "ignite".to_string(),
            debounce_ms: 100,
            ignore: vec!["node_modules".to_string()],
            validate_output: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    compiler: Option<CompilerConfig>,
}

impl CompilerConfig {
    /// Defaults rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Read overrides from `<project_root>/ignite.json` when it exists.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let root = project_root.as_ref();
        let path = root.join(PROJECT_FILE);
        if !path.is_file() {
            return Ok(Self::new(root));
        }

        let text = fs::read_to_string(&path).map_err(|e| IgniteError::io(&path, e))?;
        let project: ProjectFile =
            serde_json::from_str(&text).map_err(|source| IgniteError::Config {
                path: path.clone(),
                source,
            })?;

        let mut config = project.compiler.unwrap_or_default();
        config.project_root = root.to_path_buf();
        Ok(config)
    }

    pub fn screens_path(&self) -> PathBuf {
        self.project_root.join(&self.screens_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.project_root.join(&self.output_dir)
    }

    /// Root of generated screen modules, `<output>/screens`.
    pub fn screens_output_path(&self) -> PathBuf {
        self.output_path().join("screens")
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CompilerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.screens_path(), tmp.path().join("app"));
        assert_eq!(config.screens_output_path(), tmp.path().join(".ignite/screens"));
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert!(config.validate_output);
    }

    #[test]
    fn test_overrides_from_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(PROJECT_FILE),
            r#"{ "name": "demo", "compiler": { "screensDir": "screens", "debounceMs": 250 } }"#,
        )
        .unwrap();

        let config = CompilerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.screens_dir, "screens");
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.output_dir, ".ignite");
        assert_eq!(config.project_root, tmp.path());
    }

    #[test]
    fn test_project_file_without_compiler_section() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(PROJECT_FILE), r#"{ "name": "demo" }"#).unwrap();
        let config = CompilerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.screens_dir, "app");
    }

    #[test]
    fn test_malformed_project_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(PROJECT_FILE), "{ not json").unwrap();
        let err = CompilerConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, IgniteError::Config { .. }));
    }
}
