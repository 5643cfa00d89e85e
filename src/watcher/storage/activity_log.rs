use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::{fs::operations::read_unterminated_tail, utils::dir::ensure_dir};

use super::entities::ActivityRecordEntity;

/// Interface for abstracting storage of activity records.
pub trait ActivityStorage {
    type Appender: ActivityAppender;

    /// Opens the log for appending, creating it when missing. Safe to call after a crash: a
    /// record cut off in the middle is sealed so new records start on a fresh line.
    fn open_appender(&self) -> impl Future<Output = Result<Self::Appender>>;

    /// Reads every well formed record in the order they were written.
    fn read_all(&self) -> impl Future<Output = Result<ActivityLogContents>> + Send;
}

pub trait ActivityAppender {
    fn append(&mut self, record: &ActivityRecordEntity) -> impl Future<Output = Result<()>>;
    fn flush(&mut self) -> impl Future<Output = Result<()>>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ActivityLogContents {
    pub records: Vec<ActivityRecordEntity>,
    /// Lines that couldn't be parsed and were skipped.
    pub malformed_lines: usize,
}

/// The main realization of [ActivityStorage]: a single newline delimited JSON file.
pub struct ActivityLogImpl {
    log_path: PathBuf,
}

impl ActivityLogImpl {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    async fn read_all_inner(&self) -> Result<ActivityLogContents> {
        async fn extract(path: &Path) -> std::result::Result<ActivityLogContents, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            // Anything appended after this point belongs to the next read.
            let snapshot_len = file.metadata().await?.len();
            let mut lines = BufReader::new(file.try_clone().await?)
                .take(snapshot_len)
                .split(b'\n');
            let mut contents = ActivityLogContents::default();
            let mut line_number = 0usize;
            while let Some(line) = lines.next_segment().await? {
                line_number += 1;
                let line = line.trim_ascii();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_slice::<ActivityRecordEntity>(line) {
                    Ok(v) => contents.records.push(v),
                    Err(e) => {
                        // Usually a record cut off by a crash. Keep going.
                        warn!(
                            "Skipping line {line_number} in {:?}, illegal record {}: {e}",
                            path,
                            String::from_utf8_lossy(line)
                        );
                        contents.malformed_lines += 1;
                    }
                }
            }

            file.unlock_async().await?;

            Ok(contents)
        }

        match extract(&self.log_path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(ActivityLogContents::default())
                } else {
                    Err(e).with_context(|| {
                        format!("Failed to read activity log {:?}", self.log_path)
                    })
                }
            }
        }
    }
}

impl ActivityStorage for ActivityLogImpl {
    type Appender = ActivityLogFile<File>;

    async fn open_appender(&self) -> Result<Self::Appender> {
        if let Some(parent) = self.log_path.parent().filter(|v| !v.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let mut file = File::options()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.log_path)
            .await
            .with_context(|| format!("Failed to open activity log {:?}", self.log_path))?;

        seal_torn_tail(&mut file)
            .await
            .with_context(|| format!("Failed to prepare activity log {:?}", self.log_path))?;

        Ok(ActivityLogFile::new(file))
    }

    async fn read_all(&self) -> Result<ActivityLogContents> {
        self.read_all_inner().await
    }
}

/// Terminates a record that was cut off by a crash, so the next append starts a new line.
async fn seal_torn_tail(file: &mut File) -> Result<()> {
    file.lock_exclusive()?;
    let result = async {
        let tail = read_unterminated_tail(file, &mut vec![0; 1024]).await?;
        if !tail.is_empty() {
            warn!(
                "Activity log ends with an unterminated record, sealing it: {}",
                String::from_utf8_lossy(&tail)
            );
            file.write_all(b"\n").await?;
            file.flush().await?;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;
    file.unlock_async().await?;
    result
}

/// Append handle of the activity log. Every record is a single write of one complete line.
pub struct ActivityLogFile<F> {
    file: F,
}

impl<F: AsyncWrite + AsyncFileExt + Unpin> ActivityAppender for ActivityLogFile<F> {
    async fn append(&mut self, record: &ActivityRecordEntity) -> Result<()> {
        let mut buffer = serde_json::to_vec(record)?;
        buffer.push(b'\n');
        self.append_inner(&buffer).await
    }

    async fn flush(&mut self) -> Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}

impl<F: AsyncWrite + AsyncFileExt + Unpin> ActivityLogFile<F> {
    fn new(file: F) -> Self {
        Self { file }
    }

    async fn append_inner(&mut self, line: &[u8]) -> Result<()> {
        // Semi-safe acquire-release for a file
        self.file.lock_exclusive()?;
        let result = Self::append_with_file(&mut self.file, line).await;
        self.file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut F, line: &[u8]) -> Result<()> {
        file.write_all(line).await?;
        // Tokio finishes writes in the background; flushing makes sure the line reached the OS
        // before the lock is released.
        file.flush().await?;
        Ok(())
    }
}
