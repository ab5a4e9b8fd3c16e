//! Core [`RuleLoader`] struct: filesystem-backed definition loading with optional hot-reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{Result, RuleError};
use crate::schema::{DefinitionDocument, DefinitionEnvelope};
use crate::validation::{validate_document, ValidationResult};

use super::catalog::RuleCatalog;
use super::error::{LoadResult, LoadStatus};
use super::watcher::handle_fs_event;

/// Parse a YAML definition document via two-pass deserialization.
///
/// First pass: deserialize as [`DefinitionEnvelope`] to read the `kind` field.
/// Second pass: reconstruct and deserialize into the kind-specific type.
pub fn parse_document(contents: &str) -> Result<DefinitionDocument> {
    let envelope: DefinitionEnvelope = serde_yaml::from_str(contents)?;

    if envelope.metadata.id.is_empty() {
        return Err(RuleError::Validation(
            "document metadata.id must not be empty".to_string(),
        ));
    }

    envelope.parse_full().map_err(|e| {
        RuleError::Validation(format!(
            "failed to parse document '{}': {}",
            envelope.metadata.id, e
        ))
    })
}

/// Log validation findings for a loaded document.
pub(super) fn report_findings(path: &Path, doc: &DefinitionDocument) -> ValidationResult {
    let result = validate_document(doc);
    let id = &doc.metadata().id;
    for e in &result.errors {
        warn!(
            document_id = %id,
            path = %path.display(),
            at = %e.path,
            suggestion = e.suggestion.as_deref().unwrap_or(""),
            "{}",
            e.message
        );
    }
    for w in &result.warnings {
        debug!(document_id = %id, path = %path.display(), at = %w.path, "{}", w.message);
    }
    result
}

/// Filesystem-backed definition loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and keeps
/// the parsed documents in a shared [`RuleCatalog`].
pub struct RuleLoader {
    /// Root directory containing definition YAML files.
    rules_dir: PathBuf,
    catalog: Arc<RuleCatalog>,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            catalog: Arc::new(RuleCatalog::new()),
            _watcher: None,
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Files are visited in path
    /// order so rule order across documents is stable. Parse errors are
    /// reported per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        let loaded = results.iter().filter(|r| r.is_loaded()).count();
        info!(
            path = %self.rules_dir.display(),
            loaded,
            files = results.len(),
            "rule definitions loaded"
        );
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let mut paths = match fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };
        paths.sort();

        for path in paths {
            let hidden = is_hidden(&path);
            if path.is_dir() {
                if !hidden {
                    self.scan_dir_recursive(&path, results)?;
                }
                continue;
            }
            let status = match skip_reason(&path) {
                Some(reason) => LoadStatus::Skipped {
                    reason: reason.to_string(),
                },
                None => self.load_into_catalog(&path),
            };
            results.push(LoadResult { path, status });
        }
        Ok(())
    }

    fn load_into_catalog(&self, path: &Path) -> LoadStatus {
        match self.load_file(path) {
            Ok(doc) => {
                let document_id = doc.metadata().id.clone();
                let errors = report_findings(path, &doc).errors.len();
                let kind = doc.kind();
                match self.catalog.upsert(Some(path), doc) {
                    None => {
                        info!(document_id = %document_id, kind = %kind, path = %path.display(), "loaded definitions");
                        LoadStatus::Loaded { document_id, errors }
                    }
                    Some(reason) => LoadStatus::Rejected { document_id, reason },
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load definition file");
                LoadStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Parse a single YAML file into a [`DefinitionDocument`].
    pub fn load_file(&self, path: &Path) -> Result<DefinitionDocument> {
        let contents = fs::read_to_string(path)?;
        parse_document(&contents)
    }

    /// Start a filesystem watcher with 500ms poll interval.
    ///
    /// On file create/modify the document is re-parsed and upserted.
    /// On file delete its document is removed from the catalog.
    /// Parse errors are logged as warnings; the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);

        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => handle_fs_event(&event, &catalog),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            }
        })?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Shared catalog of loaded definitions.
    pub fn catalog(&self) -> Arc<RuleCatalog> {
        Arc::clone(&self.catalog)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Why a file is not a definition document, if it is not one.
/// Dotfiles cover editor swap and temp files.
pub(super) fn skip_reason(path: &Path) -> Option<&'static str> {
    if is_hidden(path) {
        return Some("dotfile");
    }
    let yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "yml" || e == "yaml");
    if yaml {
        None
    } else {
        Some("not a YAML file")
    }
}
