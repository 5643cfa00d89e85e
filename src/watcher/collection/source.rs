use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use notify::{
    event::{CreateKind, ModifyKind, RemoveKind, RenameMode},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Moved,
    Deleted,
}

/// A filesystem change as reported by the OS, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    /// Absolute path. For moves this is the destination.
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub is_dir: bool,
    /// When the notification was observed.
    pub timestamp: DateTime<Utc>,
}

/// Subscription to changes under a root. Watches are released when this is dropped, which
/// happens on every exit path of the watcher.
pub struct NotifySource {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl NotifySource {
    /// Starts delivering changes under `root` into `sender`. Notifications arrive on a thread
    /// owned by `notify`, so the channel is the only thing shared with the async side.
    pub fn subscribe(
        root: &Path,
        sender: mpsc::Sender<RawChange>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            match event {
                Ok(event) => {
                    let timestamp = clock.time();
                    for change in convert_event(&event, timestamp) {
                        if let Err(e) = sender.blocking_send(change) {
                            debug!("Change receiver is closed, dropping {:?}", e.0);
                        }
                    }
                }
                Err(e) => warn!("Filesystem notification error {e:?}"),
            }
        })
        .context("Failed to create filesystem watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {root:?}"))?;

        Ok(Self {
            _watcher: watcher,
            root: root.to_path_buf(),
        })
    }
}

impl Drop for NotifySource {
    fn drop(&mut self) {
        debug!("Releasing filesystem watch on {:?}", self.root);
    }
}

/// Converts a `notify` event into changes. Access, metadata and the source half of a rename are
/// not changes and produce nothing. A rename yields exactly one change for its destination.
pub fn convert_event(event: &Event, timestamp: DateTime<Utc>) -> Vec<RawChange> {
    let all = &event.paths[..];
    let (kind, is_dir, paths) = match event.kind {
        EventKind::Create(CreateKind::Folder) => (ChangeKind::Created, Some(true), all),
        EventKind::Create(CreateKind::File) => (ChangeKind::Created, Some(false), all),
        EventKind::Create(_) => (ChangeKind::Created, None, all),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            (ChangeKind::Modified, None, all)
        }
        // A paired rename is also reported as a separate `To` event, which records the move.
        EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Both)) => return vec![],
        EventKind::Modify(ModifyKind::Name(_)) => (ChangeKind::Moved, None, all),
        EventKind::Remove(RemoveKind::Folder) => (ChangeKind::Deleted, Some(true), all),
        // Removed paths can't be inspected anymore.
        EventKind::Remove(_) => (ChangeKind::Deleted, Some(false), all),
        EventKind::Modify(_) | EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            return vec![]
        }
    };

    paths
        .iter()
        .map(|path| RawChange {
            path: path.clone(),
            kind,
            is_dir: is_dir.unwrap_or_else(|| path.is_dir()),
            timestamp,
        })
        .collect()
}
