//! Per-file outcome of a directory scan.

use std::path::PathBuf;

#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    /// Served from the catalog. `errors` counts validation findings that
    /// make some criteria misbehave; they do not prevent loading.
    Loaded { document_id: String, errors: usize },
    /// Parsed, but not served: its ids collide with an earlier document.
    Rejected { document_id: String, reason: String },
    /// Not a definition file (dotfile, other extension).
    Skipped { reason: String },
    /// Unreadable, malformed YAML, or unknown `kind`.
    Failed { error: String },
}

impl LoadResult {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }

    /// Loaded with validation errors, rejected, or failed outright.
    pub fn needs_attention(&self) -> bool {
        match &self.status {
            LoadStatus::Loaded { errors, .. } => *errors > 0,
            LoadStatus::Skipped { .. } => false,
            LoadStatus::Rejected { .. } | LoadStatus::Failed { .. } => true,
        }
    }
}
