use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use collection::{
    classifier::PathClassifier,
    collector::DataCollectionModule,
    filter::{normalize_path, ChangeFilter},
    source::{NotifySource, RawChange},
};
use futures::Stream;
use processing::{log_append::LogAppender, ProcessingModule};
use storage::{
    activity_log::{ActivityLogImpl, ActivityStorage},
    entities::ActivityRecordEntity,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::utils::clock::{Clock, DefaultClock};

pub mod collection;
pub mod processing;
pub mod shutdown;
pub mod storage;

/// Capacity of the channels between modules. Bursts like a `git checkout` produce thousands of
/// notifications, the notify thread blocks only once this fills up.
const CHANNEL_CAPACITY: usize = 1024;

/// Everything the watcher needs to know. Passed in explicitly, nothing is read from globals.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub root: PathBuf,
    pub log_path: PathBuf,
    pub ignored_segments: Vec<String>,
    pub ignored_projects: Vec<String>,
    /// Files and folders the tool writes itself. The log is always added.
    pub excluded_paths: Vec<PathBuf>,
}

/// Represents the starting point for the watcher. Runs until a shutdown signal arrives or the log
/// stops accepting records, in which case the error is returned.
pub async fn start_watcher(config: WatchConfig) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let (_, result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        run_pipeline(config, DefaultClock, shutdown_token),
    );

    result
}

/// Subscribes to `config.root` and appends every qualifying change to the log. Restarting is
/// stateless: the log is reopened in append mode and the subscription is made anew.
pub async fn run_pipeline(
    config: WatchConfig,
    clock: impl Clock,
    shutdown_token: CancellationToken,
) -> Result<()> {
    // Whatever way this returns, detect_shutdown has to stop waiting.
    let _shutdown_guard = shutdown_token.clone().drop_guard();

    let root = validate_root(&config.root)?;

    let storage = ActivityLogImpl::new(config.log_path.clone());
    let appender = storage.open_appender().await?;

    let (change_sender, change_receiver) = mpsc::channel::<RawChange>(CHANNEL_CAPACITY);
    let (record_sender, record_receiver) = mpsc::channel::<ActivityRecordEntity>(CHANNEL_CAPACITY);

    // Dropped at the end of this scope, which releases the OS watches.
    let _source = NotifySource::subscribe(&root, change_sender, Box::new(clock))?;

    info!("Watching {root:?}, activity logged to {:?}", storage.path());
    println!("Watching {} - activity logged to {}", root.display(), storage.path().display());
    println!("Press Ctrl+C to stop.");

    let collector = create_collector(
        ReceiverStream::new(change_receiver),
        record_sender,
        root,
        &config,
        &shutdown_token,
    );
    let processor = ProcessingModule::new(
        record_receiver,
        LogAppender::new(appender),
        shutdown_token.clone(),
    );

    let (collection_result, processing_result) = tokio::join!(collector.run(), processor.run());

    if let Err(e) = &collection_result {
        error!("Collection module got an error {e:?}");
    }
    if let Err(e) = &processing_result {
        error!("Processing module got an error {e:?}");
    }

    processing_result?;
    collection_result
}

fn create_collector<S: Stream<Item = RawChange> + Unpin>(
    changes: S,
    next: mpsc::Sender<ActivityRecordEntity>,
    root: PathBuf,
    config: &WatchConfig,
    shutdown_token: &CancellationToken,
) -> DataCollectionModule<S> {
    let excluded_paths = config
        .excluded_paths
        .iter()
        .chain(std::iter::once(&config.log_path))
        .cloned();

    DataCollectionModule::new(
        changes,
        next,
        PathClassifier::new(root),
        ChangeFilter::new(
            config.ignored_segments.iter().cloned(),
            config.ignored_projects.iter().cloned(),
            excluded_paths,
        ),
        shutdown_token.clone(),
    )
}

/// The root has to be an existing directory. Returns it with symlinks resolved, which is how the
/// OS reports changed paths.
fn validate_root(root: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(root)
        .with_context(|| format!("Watched folder {root:?} does not exist"))?;
    if !metadata.is_dir() {
        bail!("Watched folder {root:?} is not a directory");
    }
    Ok(normalize_path(root))
}
