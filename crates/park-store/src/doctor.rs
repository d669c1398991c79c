use anyhow::Result;
use std::path::Path;

pub fn check_store_dir(dir: &str) -> Result<()> {
    anyhow::ensure!(!dir.trim().is_empty(), "store.dir is empty");
    let p = Path::new(dir);
    if p.exists() {
        anyhow::ensure!(p.is_dir(), "store.dir is not a dir: {}", dir);
        let md = std::fs::metadata(p)?;
        anyhow::ensure!(!md.permissions().readonly(), "store.dir is read-only: {}", dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_in_place_of_dir_fails() {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        let f = std::env::temp_dir().join(format!("park-doctor-{}-{}", std::process::id(), nanos));
        std::fs::write(&f, b"x").unwrap();
        assert!(check_store_dir(f.to_str().unwrap()).is_err());
        std::fs::remove_file(f).ok();
    }

    #[test]
    fn missing_dir_is_fine() {
        assert!(check_store_dir("/nonexistent/park-store-doctor").is_ok());
        assert!(check_store_dir("  ").is_err());
    }
}
