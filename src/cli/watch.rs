use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::{
    utils::dir::{default_watch_root, GRAPH_FILENAME, LOGS_DIRNAME, LOG_FILENAME},
    watcher::{
        collection::filter::{DEFAULT_IGNORED_PROJECTS, DEFAULT_IGNORED_SEGMENTS},
        start_watcher, WatchConfig,
    },
};

#[derive(Debug, Parser)]
pub struct WatchCommand {
    #[arg(
        env = "DEV_FOLDER",
        help = "Folder with projects, every direct child is a project. Defaults to ~/dev"
    )]
    path: Option<PathBuf>,
    #[arg(long, help = "Activity log to append to. Defaults to activity.jsonl in the application directory")]
    log_file: Option<PathBuf>,
    #[arg(
        long = "ignore",
        value_name = "SEGMENT",
        help = "Additional path segment to ignore, on top of .git, node_modules and similar folders"
    )]
    ignored_segments: Vec<String>,
    #[arg(
        long = "ignore-project",
        value_name = "PROJECT",
        help = "Additional project that is never recorded, on top of dev-activity"
    )]
    ignored_projects: Vec<String>,
}

impl WatchCommand {
    fn into_config(self, application_path: &Path) -> Result<WatchConfig> {
        let root = match self.path {
            Some(v) => v,
            None => default_watch_root()?,
        };
        let log_path = self
            .log_file
            .unwrap_or_else(|| application_path.join(LOG_FILENAME));
        let ignored_segments = DEFAULT_IGNORED_SEGMENTS
            .iter()
            .map(|v| v.to_string())
            .chain(self.ignored_segments)
            .collect();

        let ignored_projects = DEFAULT_IGNORED_PROJECTS
            .iter()
            .map(|v| v.to_string())
            .chain(self.ignored_projects)
            .collect();

        // Diagnostics are written for every record, watching them would never settle down.
        let excluded_paths = vec![
            log_path.clone(),
            application_path.join(GRAPH_FILENAME),
            application_path.join(LOGS_DIRNAME),
        ];

        Ok(WatchConfig {
            root,
            log_path,
            ignored_segments,
            ignored_projects,
            excluded_paths,
        })
    }
}

/// Command to process `watch` command. Runs in the foreground until Ctrl+C.
pub async fn process_watch_command(command: WatchCommand, application_path: &Path) -> Result<()> {
    let config = command.into_config(application_path)?;
    start_watcher(config).await
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;

    use super::WatchCommand;

    #[test]
    fn test_watch_config() {
        let command = WatchCommand::try_parse_from([
            "watch",
            "/home/user/code",
            "--ignore",
            "target",
            "--ignore-project",
            "scratch",
        ])
        .unwrap();

        let config = command.into_config(Path::new("/state")).unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user/code"));
        assert_eq!(config.log_path, PathBuf::from("/state/activity.jsonl"));
        assert!(config.ignored_segments.iter().any(|v| v == ".git"));
        assert!(config.ignored_segments.iter().any(|v| v == "target"));
        assert_eq!(
            config.ignored_projects,
            vec!["dev-activity".to_string(), "scratch".to_string()]
        );
        assert_eq!(
            config.excluded_paths,
            vec![
                PathBuf::from("/state/activity.jsonl"),
                PathBuf::from("/state/activity-graph.html"),
                PathBuf::from("/state/logs"),
            ]
        );
    }

    #[test]
    fn test_explicit_log_file() {
        let command =
            WatchCommand::try_parse_from(["watch", "/code", "--log-file", "/tmp/log.jsonl"])
                .unwrap();

        let config = command.into_config(Path::new("/state")).unwrap();

        assert_eq!(config.log_path, PathBuf::from("/tmp/log.jsonl"));
        assert!(config.excluded_paths.contains(&PathBuf::from("/tmp/log.jsonl")));
        assert!(config.excluded_paths.contains(&PathBuf::from("/state/logs")));
        assert_eq!(config.ignored_projects, vec!["dev-activity".to_string()]);
    }
}
