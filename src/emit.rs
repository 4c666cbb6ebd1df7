//! Output writing.
//!
//! Generated files are only rewritten when their content hash changes, so an
//! unchanged tree leaves modification times alone and does not retrigger
//! downstream bundlers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::error::{IgniteError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write `content` to `path`, creating parent directories. Skips the write
/// when the file already holds the same bytes.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = fs::read_to_string(path) {
        if content_hash(&existing) == content_hash(content) {
            tracing::trace!(path = %path.display(), "output unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IgniteError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| IgniteError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output");
    Ok(WriteOutcome::Written)
}
