use anyhow::{Context, Result};
use park_proto::OverlayFrame;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Appends one JSON line per frame for an external renderer to pick up.
pub struct OverlaySink {
    out: BufWriter<fs::File>,
    written: u64,
}

impl OverlaySink {
    pub async fn create(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let f = fs::File::create(path).await.with_context(|| format!("create overlay file {}", path))?;
        Ok(Self { out: BufWriter::new(f), written: 0 })
    }

    pub async fn write(&mut self, frame: &OverlayFrame) -> Result<()> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.out.flush().await?;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}
