use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Result};

/// Project used for changes made directly inside the watched root.
pub const ROOT_PROJECT: &str = "_root";

/// Maps changed paths to the project they belong to. A project is the first folder beneath the
/// watched root.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    root: PathBuf,
}

impl PathClassifier {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classify(&self, path: &Path) -> Result<Arc<str>> {
        classify(&self.root, path)
    }
}

/// Returns the project of `path`. Only valid for paths under `root`, anything else is an error.
///
/// - `root/proj/src/main.rs` is `proj`.
/// - `root/notes.txt` and `root` itself are [ROOT_PROJECT].
///
/// Names are compared as is, so `Proj` and `proj` are different projects.
pub fn classify(root: &Path, path: &Path) -> Result<Arc<str>> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| anyhow!("{path:?} is not under the watched root {root:?}"))?;

    let mut components = relative
        .components()
        .filter(|v| !matches!(v, Component::CurDir));

    match (components.next(), components.next()) {
        (None, _) | (Some(Component::Normal(_)), None) => Ok(ROOT_PROJECT.into()),
        (Some(Component::Normal(first)), Some(_)) => Ok(first.to_string_lossy().into()),
        (Some(other), _) => bail!("Can't classify {path:?}, unexpected component {other:?}"),
    }
}
