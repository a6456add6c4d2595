use crate::error::Result;
use std::path::Path;

pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_exists_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data").join("raw").join("nyc");

        ensure_dir_exists(&dir).unwrap();
        ensure_dir_exists(&dir).unwrap();

        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_exists_over_file_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("nyc");
        std::fs::write(&blocker, b"not a directory").unwrap();

        assert!(ensure_dir_exists(&blocker.join("inner")).is_err());
    }

    #[test]
    fn test_size_in_mb() {
        assert_eq!(size_in_mb(0), 0.0);
        assert_eq!(size_in_mb(1024 * 1024), 1.0);
        assert_eq!(size_in_mb(3 * 1024 * 1024 / 2), 1.5);
    }

    #[test]
    fn test_file_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("listings.csv");
        std::fs::write(&path, b"id,name\n").unwrap();
        assert_eq!(file_size(&path).unwrap(), 8);
    }
}
