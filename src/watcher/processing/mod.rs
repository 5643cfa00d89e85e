use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::storage::entities::ActivityRecordEntity;

pub mod log_append;
pub mod module;

/// Represents the consumer of records. Records are handled one at a time in arrival order.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<ActivityRecordEntity>,
    processor: Processor,
    shutdown: CancellationToken,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(
        receiver: Receiver<ActivityRecordEntity>,
        processor: P,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            processor,
            shutdown,
        }
    }

    /// Runs until every sender is dropped. A record that can't be persisted stops the whole
    /// watcher, losing history silently is worse than exiting.
    pub async fn run(mut self) -> Result<()> {
        while let Some(record) = self.receiver.recv().await {
            debug!("Processing record {:?}", record);
            if let Err(e) = self.processor.process_next(&record).await {
                error!("Error processing record {:?}: {e:?}", record);
                self.shutdown.cancel();
                self.receiver.close();
                return Err(e.context("Failed to append to the activity log"));
            }
            info!("Processed record {:?}", record);
        }

        self.receiver.close();
        self.processor.finalize().await
    }
}
