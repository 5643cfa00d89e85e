use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use crate::watcher::storage::entities::ActivityKind;

use super::source::{ChangeKind, RawChange};

/// Path segments that are noise: build artifacts, caches, tool state.
pub const DEFAULT_IGNORED_SEGMENTS: &[&str] = &[
    ".git",
    "node_modules",
    ".venv",
    "__pycache__",
    ".cursor",
    ".idea",
    "dist",
    "build",
    ".next",
    ".turbo",
    ".cache",
    "vendor",
    ".DS_Store",
];

/// Projects never recorded by default. The tool's own checkout lives here when it is developed
/// inside the watched root.
pub const DEFAULT_IGNORED_PROJECTS: &[&str] = &["dev-activity"];

/// Only creations, content changes and moves of files represent work done. Deletions and
/// anything happening to directories are dropped.
pub fn qualifying_kind(change: &RawChange) -> Option<ActivityKind> {
    if change.is_dir {
        return None;
    }
    match change.kind {
        ChangeKind::Created => Some(ActivityKind::Created),
        ChangeKind::Modified => Some(ActivityKind::Modified),
        ChangeKind::Moved => Some(ActivityKind::Moved),
        ChangeKind::Deleted => None,
    }
}

/// Decides which qualifying changes are noise.
#[derive(Debug, Default, Clone)]
pub struct ChangeFilter {
    ignored_segments: HashSet<OsString>,
    ignored_projects: HashSet<Arc<str>>,
    excluded_paths: Vec<PathBuf>,
}

impl ChangeFilter {
    pub fn new(
        ignored_segments: impl IntoIterator<Item = impl Into<OsString>>,
        ignored_projects: impl IntoIterator<Item = impl Into<Arc<str>>>,
        excluded_paths: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            ignored_segments: ignored_segments.into_iter().map(Into::into).collect(),
            ignored_projects: ignored_projects.into_iter().map(Into::into).collect(),
            excluded_paths: excluded_paths
                .into_iter()
                .map(|v| normalize_path(&v))
                .collect(),
        }
    }

    /// True if any segment of the path relative to the root is ignored.
    pub fn is_ignored_path(&self, relative: &Path) -> bool {
        relative.components().any(|v| match v {
            Component::Normal(segment) => self.ignored_segments.contains(segment),
            _ => false,
        })
    }

    pub fn is_ignored_project(&self, project: &str) -> bool {
        self.ignored_projects.contains(project)
    }

    /// True for files the tool writes itself and anything inside its folders. Recording those
    /// would feed back into the log.
    pub fn is_excluded_path(&self, path: &Path) -> bool {
        self.excluded_paths.iter().any(|v| path.starts_with(v))
    }
}

/// Resolves symlinks so paths compare the same way the OS reports them. Files that don't exist
/// yet are resolved through their parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(v) = path.canonicalize() {
        return v;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|v| v.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use chrono::Utc;
    use tempfile::tempdir;

    use crate::watcher::{
        collection::source::{ChangeKind, RawChange},
        storage::entities::ActivityKind,
    };

    use super::{qualifying_kind, ChangeFilter, DEFAULT_IGNORED_SEGMENTS};

    fn change(kind: ChangeKind, is_dir: bool) -> RawChange {
        RawChange {
            path: PathBuf::from("/dev/proj/a.rs"),
            kind,
            is_dir,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_qualifying_kinds() {
        assert_eq!(
            qualifying_kind(&change(ChangeKind::Created, false)),
            Some(ActivityKind::Created)
        );
        assert_eq!(
            qualifying_kind(&change(ChangeKind::Modified, false)),
            Some(ActivityKind::Modified)
        );
        assert_eq!(
            qualifying_kind(&change(ChangeKind::Moved, false)),
            Some(ActivityKind::Moved)
        );
        assert_eq!(qualifying_kind(&change(ChangeKind::Deleted, false)), None);
        assert_eq!(qualifying_kind(&change(ChangeKind::Created, true)), None);
        assert_eq!(qualifying_kind(&change(ChangeKind::Moved, true)), None);
    }

    #[test]
    fn test_ignored_segments() {
        let filter = ChangeFilter::new(
            DEFAULT_IGNORED_SEGMENTS.iter().copied(),
            Vec::<String>::new(),
            vec![],
        );

        assert!(filter.is_ignored_path(Path::new("proj/.git/index")));
        assert!(filter.is_ignored_path(Path::new("proj/web/node_modules/x/index.js")));
        assert!(!filter.is_ignored_path(Path::new("proj/src/build.rs")));
        assert!(!filter.is_ignored_path(Path::new("proj/.github/workflows/ci.yml")));
    }

    #[test]
    fn test_ignored_projects() {
        let filter = ChangeFilter::new(Vec::<String>::new(), ["dev-activity"], vec![]);

        assert!(filter.is_ignored_project("dev-activity"));
        assert!(!filter.is_ignored_project("alpha"));
    }

    #[test]
    fn test_excluded_paths_are_normalized() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let filter = ChangeFilter::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            vec![dir.path().join(".").join("activity.jsonl")],
        );

        assert!(filter.is_excluded_path(&root.join("activity.jsonl")));
        assert!(!filter.is_excluded_path(&root.join("activity.jsonl.bak")));
        assert!(!filter.is_excluded_path(&root.join("other.jsonl")));
    }

    #[test]
    fn test_excluded_folders_cover_their_contents() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let logs = root.join("state").join("logs");
        let filter = ChangeFilter::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            vec![logs.clone()],
        );

        assert!(filter.is_excluded_path(&logs.join("watch.2024-05-01")));
        assert!(!filter.is_excluded_path(&root.join("state").join("logs-old").join("a.rs")));
        assert!(!filter.is_excluded_path(&root.join("state").join("main.rs")));
    }
}
