//! Batch consumers used by the `load` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use airq_ingest::BatchConsumer;
use airq_model::Batch;

/// Appends each batch to a newline-delimited JSON file.
///
/// A batch is committed once its lines are written and synced to disk; the
/// consume call resolves only after that, so a returned `Ok` means durable.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    file: File,
    batches: usize,
    records: usize,
}

impl JsonLinesStore {
    /// Opens `path` for appending, creating it if needed. With `truncate`,
    /// existing contents are discarded first.
    pub async fn open(path: impl AsRef<Path>, truncate: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut open = OpenOptions::new();
        open.create(true);
        if truncate {
            open.write(true).truncate(true);
        } else {
            open.append(true);
        }
        let file = open
            .open(&path)
            .await
            .with_context(|| format!("open store {}", path.display()))?;
        Ok(Self {
            path,
            file,
            batches: 0,
            records: 0,
        })
    }

    /// Whether a store exists at `path` and holds at least one byte.
    pub async fn has_data(path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.len() > 0),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("inspect store {}", path.display()))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Batches committed so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Records committed so far.
    pub fn records(&self) -> usize {
        self.records
    }

    async fn commit(&mut self, batch: Batch) -> Result<()> {
        let mut buf = Vec::new();
        for record in &batch {
            serde_json::to_writer(&mut buf, record).context("serialize record")?;
            buf.push(b'\n');
        }
        self.file
            .write_all(&buf)
            .await
            .with_context(|| format!("write batch to {}", self.path.display()))?;
        self.file.flush().await.context("flush store")?;
        self.file.sync_data().await.context("sync store")?;

        self.batches += 1;
        self.records += batch.len();
        debug!(
            batch = self.batches,
            size = batch.len(),
            bytes = buf.len(),
            "committed batch"
        );
        Ok(())
    }
}

impl BatchConsumer for JsonLinesStore {
    type Error = anyhow::Error;

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        self.commit(batch).await
    }
}

/// Counts batches without persisting anything (`--dry-run`).
#[derive(Debug, Default)]
pub struct CountingSink {
    batches: usize,
    records: usize,
}

impl CountingSink {
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn records(&self) -> usize {
        self.records
    }
}

impl BatchConsumer for CountingSink {
    type Error = anyhow::Error;

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        self.batches += 1;
        self.records += batch.len();
        Ok(())
    }
}
