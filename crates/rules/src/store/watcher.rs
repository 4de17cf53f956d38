//! Filesystem event handler for the notify watcher (hot-reload).

use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::resolver::Resolver;
use crate::rule::{Rule, RuleSpec};

use super::core::read_specs;

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, store_path: &Path, resolver: &Resolver) {
    let touches_store = event
        .paths
        .iter()
        .any(|p| p.file_name().is_some() && p.file_name() == store_path.file_name());
    if !touches_store {
        return;
    }

    match &event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Create(CreateKind::Any)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Name(_))
        | EventKind::Modify(ModifyKind::Any) => {
            if let Err(e) = reload(store_path, resolver) {
                warn!(
                    path = %store_path.display(),
                    error = %e,
                    "failed to reload implications, keeping previous version"
                );
            }
        }
        EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
            info!(path = %store_path.display(), "implications file removed, keeping active implications");
        }
        _ => {}
    }
}

/// Re-read the file and install its rules.
///
/// Returns `Ok(false)` when the file holds exactly the active rules, which
/// is what our own `save` produces.
pub(super) fn reload(store_path: &Path, resolver: &Resolver) -> Result<bool> {
    let rules: Vec<Rule> = read_specs(store_path)?.iter().map(RuleSpec::build).collect();

    if rules == *resolver.rules() {
        debug!(path = %store_path.display(), "implications file unchanged");
        return Ok(false);
    }

    resolver.replace_rules(rules)?;
    info!(path = %store_path.display(), "hot-reloaded implications");
    Ok(true)
}
