use anyhow::Result;

use crate::watcher::storage::{activity_log::ActivityAppender, entities::ActivityRecordEntity};

use super::module::EventProcessor;

/// Bridges [ProcessingModule](super::ProcessingModule) and the activity log. Owns the only
/// append handle of the process, so appends never interleave.
pub struct LogAppender<A: ActivityAppender> {
    appender: A,
}

impl<A: ActivityAppender> LogAppender<A> {
    pub fn new(appender: A) -> Self {
        Self { appender }
    }
}

impl<A: ActivityAppender> EventProcessor for LogAppender<A> {
    async fn process_next(&mut self, record: &ActivityRecordEntity) -> Result<()> {
        self.appender.append(record).await
    }

    async fn finalize(&mut self) -> Result<()> {
        self.appender.flush().await
    }
}
