use std::{path::Path, process::Stdio};

use anyhow::{Context, Result};
use tracing::debug;

/// Hands the file over to whatever the desktop uses to open it. Doesn't wait for the viewer.
pub fn open_in_browser(path: &Path) -> Result<()> {
    let mut command = opener_command(path);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    debug!("Opening {path:?} with {command:?}");
    #[allow(clippy::zombie_processes)]
    let _ = command
        .spawn()
        .with_context(|| format!("Failed to open {path:?}"))?;
    Ok(())
}

fn opener_command(path: &Path) -> std::process::Command {
    #[cfg(target_os = "macos")]
    {
        let mut command = std::process::Command::new("open");
        command.arg(path);
        command
    }
    #[cfg(windows)]
    {
        let mut command = std::process::Command::new("cmd");
        // The empty argument is the window title `start` expects before the path.
        command.args(["/C", "start", ""]).arg(path);
        command
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    {
        let mut command = std::process::Command::new("xdg-open");
        command.arg(path);
        command
    }
}
