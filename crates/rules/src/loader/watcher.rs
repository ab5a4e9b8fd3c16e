//! Hot reload: applies notify events to the [`RuleCatalog`].

use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::catalog::RuleCatalog;
use super::core::{parse_document, report_findings, skip_reason};

pub(super) fn handle_fs_event(event: &Event, catalog: &RuleCatalog) {
    let changed = matches!(
        event.kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    );
    let removed = matches!(event.kind, EventKind::Remove(RemoveKind::File));
    if !changed && !removed {
        return;
    }

    for path in event.paths.iter().filter(|p| skip_reason(p).is_none()) {
        if changed {
            reload(path, catalog);
        } else if let Some(doc) = catalog.remove_path(path) {
            info!(document_id = %doc.metadata().id, path = %path.display(), "definitions removed");
        }
    }
}

/// Re-read one file. On failure the previously loaded version stays served.
fn reload(path: &Path, catalog: &RuleCatalog) {
    let doc = match std::fs::read_to_string(path)
        .map_err(Into::into)
        .and_then(|contents| parse_document(&contents))
    {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "hot reload failed, keeping previous definitions");
            return;
        }
    };
    report_findings(path, &doc);
    let document_id = doc.metadata().id.clone();
    let kind = doc.kind();
    // collisions are logged by the catalog
    if catalog.upsert(Some(path), doc).is_none() {
        info!(document_id = %document_id, kind = %kind, path = %path.display(), "definitions reloaded");
    }
}
