pub mod graph;
pub mod output;
pub mod process;
pub mod range;
pub mod summary;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use graph::{process_graph_command, GraphCommand};
use summary::{process_summary_command, SummaryCommand};
use tracing::level_filters::LevelFilter;
use watch::{process_watch_command, WatchCommand};

use crate::{
    utils::{
        dir::{create_application_default_path, ensure_dir, LOG_FILENAME},
        logging::{enable_logging, CLI_PREFIX, WATCH_PREFIX},
    },
    watcher::storage::activity_log::ActivityLogImpl,
};

#[derive(Parser, Debug)]
#[command(name = "dev-activity", version, long_about = None)]
#[command(about = "Records activity in a folder of projects and draws it as a calendar", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print diagnostics to the console as well")]
    log: bool,
    #[arg(
        long,
        help = "Level of diagnostics. Defaults to $RUST_LOG and then to debug"
    )]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Watch a folder of projects and record every change into the activity log")]
    Watch {
        #[command(flatten)]
        command: WatchCommand,
    },
    #[command(about = "Render the activity log as a calendar page")]
    Graph {
        #[command(flatten)]
        command: GraphCommand,
    },
    #[command(about = "Print how activity is split between projects")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let application_path = match args.dir {
        Some(dir) => {
            ensure_dir(&dir)?;
            dir
        }
        None => create_application_default_path()?,
    };

    let logging_level = match (args.log_filter, args.log) {
        (Some(v), _) => Some(v),
        (None, true) => Some(LevelFilter::TRACE),
        (None, false) => None,
    };
    let prefix = match args.commands {
        Commands::Watch { .. } => WATCH_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &application_path, logging_level, args.log)?;

    match args.commands {
        Commands::Watch { command } => process_watch_command(command, &application_path).await,
        Commands::Graph { command } => process_graph_command(command, &application_path).await,
        Commands::Summary { command } => {
            process_summary_command(command, &application_path).await
        }
    }
}

/// The log passed on the command line, or the one in the application directory.
fn log_storage(log_file: Option<PathBuf>, application_path: &Path) -> ActivityLogImpl {
    ActivityLogImpl::new(log_file.unwrap_or_else(|| application_path.join(LOG_FILENAME)))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Args;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }
}
