use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use pursuit_core::{LogRecord, LOG_HEADER};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only CSV log of tracking frames.
///
/// The header is written on creation; the writer is flushed on `finish` and on drop.
pub struct TrackingLog<W: Write = File> {
    writer: Option<Writer<W>>,
    path: Option<PathBuf>,
    rows: usize,
}

impl TrackingLog<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut log = Self::from_writer(file)?;
        log.path = Some(path.to_path_buf());
        Ok(log)
    }
}

impl<W: Write> TrackingLog<W> {
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer
            .write_record(LOG_HEADER)
            .context("failed to write log header")?;
        Ok(Self {
            writer: Some(writer),
            path: None,
            rows: 0,
        })
    }

    fn writer(&mut self) -> Result<&mut Writer<W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("tracking log already closed"))
    }

    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.writer()?
            .serialize(record)
            .context("failed to append log row")?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn finish(&mut self) -> Result<usize> {
        self.writer()?
            .flush()
            .context("failed to flush tracking log")?;
        if let Some(path) = &self.path {
            log::info!("Saved {} rows to {}", self.rows, path.display());
        }
        Ok(self.rows)
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer
            .take()
            .ok_or_else(|| anyhow::anyhow!("tracking log already closed"))?
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush tracking log: {}", e.error()))
    }
}

impl<W: Write> Drop for TrackingLog<W> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                log::warn!("Tracking log flush on close failed: {}", e);
            }
        }
    }
}
