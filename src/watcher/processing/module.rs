use anyhow::Result;

use crate::watcher::storage::entities::ActivityRecordEntity;

/// Final consumer of activity records. An error from `process_next` stops the watcher.
pub trait EventProcessor {
    fn process_next(
        &mut self,
        record: &ActivityRecordEntity,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
