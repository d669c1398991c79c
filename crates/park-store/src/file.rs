use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::OccupancyStore;

/// One JSON document per zone under `dir`, `<dir>/<zone>.json`.
///
/// Writes go to a temp file that is renamed over the document, so a reader never
/// sees a half-written zone.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create store dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Zone names become file names, so path separators and dot names are refused.
    pub fn validate_key(zone: &str) -> Result<()> {
        anyhow::ensure!(!zone.is_empty(), "empty zone name");
        anyhow::ensure!(zone != "." && zone != "..", "invalid zone name: {}", zone);
        anyhow::ensure!(
            !zone.contains(['/', '\\', '\0']),
            "zone name not usable as a document key: {}",
            zone
        );
        Ok(())
    }

    pub fn doc_path(&self, zone: &str) -> Result<PathBuf> {
        Self::validate_key(zone)?;
        Ok(self.dir.join(format!("{}.json", zone)))
    }

    fn load_doc(path: &Path) -> Result<Option<Map<String, Value>>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        match serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))? {
            Value::Object(m) => Ok(Some(m)),
            other => anyhow::bail!("{} is not a JSON object: {}", path.display(), other),
        }
    }
}

impl OccupancyStore for FileStore {
    fn check_key(&self, zone: &str) -> Result<()> {
        Self::validate_key(zone)
    }

    fn read(&mut self, zone: &str) -> Result<Option<bool>> {
        let path = self.doc_path(zone)?;
        Ok(Self::load_doc(&path)?.and_then(|m| m.get("occupied").and_then(Value::as_bool)))
    }

    fn merge_write(&mut self, zone: &str, occupied: bool) -> Result<()> {
        let path = self.doc_path(zone)?;
        let mut doc = Self::load_doc(&path)?.unwrap_or_default();
        doc.insert("occupied".into(), Value::Bool(occupied));
        let ts_ms = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        doc.insert("updated_unix_ms".into(), Value::from(ts_ms as i64));

        let tmp = path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
            f.write_all(&serde_json::to_vec_pretty(&Value::Object(doc))?)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path).with_context(|| format!("replace {}", path.display()))?;
        debug!("store: wrote {} occupied={}", path.display(), occupied);
        Ok(())
    }
}
