use anyhow::Result;
use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::watcher::storage::entities::ActivityRecordEntity;

use super::{
    classifier::PathClassifier,
    filter::{qualifying_kind, ChangeFilter},
    source::RawChange,
};

/// Turns raw changes into activity records. Holds no state besides its configuration, every
/// change is handled on its own.
pub struct DataCollectionModule<S> {
    changes: S,
    next: mpsc::Sender<ActivityRecordEntity>,
    classifier: PathClassifier,
    filter: ChangeFilter,
    shutdown: CancellationToken,
}

impl<S: Stream<Item = RawChange> + Unpin> DataCollectionModule<S> {
    pub fn new(
        changes: S,
        next: mpsc::Sender<ActivityRecordEntity>,
        classifier: PathClassifier,
        filter: ChangeFilter,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            changes,
            next,
            classifier,
            filter,
            shutdown,
        }
    }

    fn to_record(&self, change: RawChange) -> Option<ActivityRecordEntity> {
        let event_kind = qualifying_kind(&change)?;

        if self.filter.is_excluded_path(&change.path) {
            trace!("Skipping own file {:?}", change.path);
            return None;
        }

        let Ok(relative) = change.path.strip_prefix(self.classifier.root()) else {
            warn!("Received change outside of the watched root {:?}", change.path);
            return None;
        };
        if self.filter.is_ignored_path(relative) {
            trace!("Skipping ignored path {:?}", change.path);
            return None;
        }

        let project = match self.classifier.classify(&change.path) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to classify change {e:?}");
                return None;
            }
        };
        if self.filter.is_ignored_project(&project) {
            trace!("Skipping ignored project {project}");
            return None;
        }

        Some(ActivityRecordEntity {
            timestamp: change.timestamp,
            project,
            event_kind,
        })
    }

    async fn forward(&self, change: RawChange) -> Result<()> {
        debug!("Received change {:?}", change);
        if let Some(record) = self.to_record(change) {
            self.next
                .send(record)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        }
        Ok(())
    }

    /// Executes the collector event loop. Stops on cancellation or when the source is closed.
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                // Returning drops the sender, which lets the processing module drain and stop.
                _ = self.shutdown.cancelled() => {
                    info!("Stopping collection");
                    return self.drain().await;
                }
                change = self.changes.next() => {
                    let Some(change) = change else {
                        info!("Change source closed");
                        return Ok(());
                    };
                    self.forward(change).await?;
                }
            }
        }
    }

    /// Forwards changes that were already delivered before the shutdown, without waiting for
    /// new ones.
    async fn drain(&mut self) -> Result<()> {
        let mut drained = 0usize;
        while let Some(Some(change)) = self.changes.next().now_or_never() {
            self.forward(change).await?;
            drained += 1;
        }
        if drained > 0 {
            info!("Forwarded {drained} changes received before shutdown");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use futures::stream;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;
    use tokio_util::sync::CancellationToken;

    use crate::watcher::{
        collection::{
            classifier::{PathClassifier, ROOT_PROJECT},
            filter::{ChangeFilter, DEFAULT_IGNORED_SEGMENTS},
            source::{ChangeKind, RawChange},
        },
        storage::entities::ActivityKind,
    };

    use super::DataCollectionModule;

    const ROOT: &str = "/home/user/dev";

    fn change(path: &str, kind: ChangeKind) -> RawChange {
        RawChange {
            path: Path::new(ROOT).join(path),
            kind,
            is_dir: false,
            timestamp: Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_collector_filters_and_classifies() -> Result<()> {
        let changes = vec![
            change("alpha/src/main.rs", ChangeKind::Modified),
            change("alpha/.git/index", ChangeKind::Modified),
            change("beta/old.rs", ChangeKind::Deleted),
            change("notes.txt", ChangeKind::Created),
            change("dev-activity/activity.jsonl", ChangeKind::Modified),
            change("beta/new.rs", ChangeKind::Moved),
            RawChange {
                is_dir: true,
                ..change("gamma", ChangeKind::Created)
            },
            RawChange {
                path: PathBuf::from("/elsewhere/x.rs"),
                ..change("", ChangeKind::Created)
            },
        ];
        let (sender, mut receiver) = mpsc::channel(16);
        let collector = DataCollectionModule::new(
            stream::iter(changes),
            sender,
            PathClassifier::new(ROOT.into()),
            ChangeFilter::new(
                DEFAULT_IGNORED_SEGMENTS.iter().copied(),
                ["dev-activity"],
                vec![],
            ),
            CancellationToken::new(),
        );

        collector.run().await?;

        let mut records = vec![];
        while let Some(record) = receiver.recv().await {
            records.push(record);
        }
        let summary = records
            .iter()
            .map(|v| (v.project.to_string(), v.event_kind))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("alpha".to_string(), ActivityKind::Modified),
                (ROOT_PROJECT.to_string(), ActivityKind::Created),
                ("beta".to_string(), ActivityKind::Moved),
            ]
        );
        assert!(records
            .iter()
            .all(|v| v.timestamp == Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap()));
        Ok(())
    }

    #[tokio::test]
    async fn test_collector_stops_on_cancel() -> Result<()> {
        let (sender, _receiver) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let collector = DataCollectionModule::new(
            stream::pending::<RawChange>(),
            sender,
            PathClassifier::new(ROOT.into()),
            ChangeFilter::default(),
            shutdown.clone(),
        );

        shutdown.cancel();

        collector.run().await
    }

    #[tokio::test]
    async fn test_collector_forwards_buffered_changes_on_cancel() -> Result<()> {
        let (change_sender, change_receiver) = mpsc::channel(8);
        change_sender.send(change("alpha/a.rs", ChangeKind::Modified)).await?;
        change_sender.send(change("alpha/.git/index", ChangeKind::Modified)).await?;
        change_sender.send(change("beta/b.rs", ChangeKind::Created)).await?;
        let (sender, mut receiver) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let collector = DataCollectionModule::new(
            ReceiverStream::new(change_receiver),
            sender,
            PathClassifier::new(ROOT.into()),
            ChangeFilter::new(
                DEFAULT_IGNORED_SEGMENTS.iter().copied(),
                Vec::<String>::new(),
                vec![],
            ),
            shutdown.clone(),
        );

        shutdown.cancel();
        // The source is still open, so only the buffered changes can end the run.
        collector.run().await?;

        let mut projects = vec![];
        while let Some(record) = receiver.recv().await {
            projects.push(record.project.to_string());
        }
        assert_eq!(projects, vec!["alpha", "beta"]);
        drop(change_sender);
        Ok(())
    }

    #[tokio::test]
    async fn test_collector_fails_when_processor_is_gone() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let collector = DataCollectionModule::new(
            stream::iter(vec![change("alpha/a.rs", ChangeKind::Created)]),
            sender,
            PathClassifier::new(ROOT.into()),
            ChangeFilter::default(),
            CancellationToken::new(),
        );

        assert!(collector.run().await.is_err());
    }
}
