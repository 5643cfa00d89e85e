use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};

const APPLICATION_NAME: &str = "dev-activity";

pub const LOG_FILENAME: &str = "activity.jsonl";
pub const GRAPH_FILENAME: &str = "activity-graph.html";
/// Diagnostics of the tool, inside the application directory.
pub const LOGS_DIRNAME: &str = "logs";

/// Returns the application directory, creating it when missing. Tries $XDG_STATE_HOME, then
/// $HOME/.local/state, and %APPDATA% on Windows.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = application_default_path()?;
    ensure_dir(&path)?;
    Ok(path)
}

fn application_default_path() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let mut path = PathBuf::from(
            env::var("APPDATA").map_err(|_| anyhow!("APPDATA should be present on Windows"))?,
        );
        path.push(APPLICATION_NAME);
        Ok(path)
    }
    #[cfg(not(windows))]
    {
        let mut path = env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                env::var("HOME").map(|home| {
                    let mut path = PathBuf::from(home);
                    path.push(".local/state");
                    path
                })
            })
            .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
        path.push(APPLICATION_NAME);
        Ok(path)
    }
}

/// The folder watched when nothing was passed on the command line. `DEV_FOLDER` is handled by
/// clap, so this is only the `~/dev` fallback.
pub fn default_watch_root() -> Result<PathBuf> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map_err(|_| anyhow!("Can't locate home directory, pass the folder to watch explicitly"))?;
    Ok(PathBuf::from(home).join("dev"))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(v) => Err(v).with_context(|| format!("Failed to create directory {path:?}")),
    }
}
