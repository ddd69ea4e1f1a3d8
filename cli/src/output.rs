use anyhow::{Context, Result};
use orgmaps_core::OrganizationRecord;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes one JSON object per line and flushes after each record.
pub struct JsonLinesSink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    written: usize,
}

impl JsonLinesSink {
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        let writer: Box<dyn AsyncWrite + Send + Unpin> = match path {
            Some(path) => Box::new(
                tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdout()),
        };
        Ok(Self { writer, written: 0 })
    }

    pub async fn write(&mut self, record: &OrganizationRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to encode record")?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}
