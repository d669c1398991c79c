use anyhow::{Context, Result};
use park_proto::FrameDetections;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, warn};

/// Tracker output feed: JSON Lines, one frame per line.
pub enum FrameSource {
    File { reader: BufReader<File>, follow: bool },
    Stdin(BufReader<Stdin>),
}

impl FrameSource {
    /// `-` reads from stdin.
    pub fn open(path: &str, follow: bool) -> Result<Self> {
        if path == "-" { Ok(Self::stdin()) } else { Self::file(path, follow) }
    }

    pub fn file(path: &str, follow: bool) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("open frame feed {}", path))?;
        Ok(Self::File { reader: BufReader::new(File::from_std(f)), follow })
    }

    pub fn stdin() -> Self {
        Self::Stdin(BufReader::new(tokio::io::stdin()))
    }

    /// Next well-formed frame, or `None` at end of feed.
    /// Malformed lines are logged and skipped.
    pub async fn next_frame(&mut self) -> Result<Option<FrameDetections>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = match self {
                FrameSource::File { reader, follow } => {
                    let n = reader.read_line(&mut line).await?;
                    if n == 0 && *follow {
                        // tailing a feed that is still being written
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                        continue;
                    }
                    n
                }
                FrameSource::Stdin(r) => r.read_line(&mut line).await?,
            };
            if n == 0 {
                return Ok(None);
            }
            match parse_frame_line(&line) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => continue,
                Err(e) => warn!("source: skipping malformed line: {:#}", e),
            }
        }
    }
}

pub fn parse_frame_line(line: &str) -> Result<Option<FrameDetections>> {
    let s = line.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let frame: FrameDetections = serde_json::from_str(s).context("parse frame json")?;
    debug!("source: frame {} with {} detections", frame.frame, frame.detections.len());
    Ok(Some(frame))
}
