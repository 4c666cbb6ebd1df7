//! Error types for the Ignite compiler.
//!
//! Structural anomalies in source files are not errors (see
//! [`crate::ir::ParseDiagnostic`]); everything here aborts a compile pass.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IgniteError>;

#[derive(Debug, Error)]
pub enum IgniteError {
    #[error("screens directory not found: {}", .0.display())]
    ScreensDirMissing(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid compiler config in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("cannot compile {file}: {message}")]
    Generate { file: String, message: String },
}

impl IgniteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IgniteError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_path() {
        let err = IgniteError::ScreensDirMissing(PathBuf::from("/tmp/project/app"));
        assert_eq!(
            err.to_string(),
            "screens directory not found: /tmp/project/app"
        );

        let err = IgniteError::io(
            "out/router.js",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out/router.js"));
        assert!(err.to_string().contains("denied"));
    }
}
