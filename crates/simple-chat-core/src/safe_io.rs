//! Atomic file writes: temp file, fsync, rename.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Atomically write bytes to a file.
///
/// The target is either fully replaced or left as it was. The temp file sits
/// next to the target (`.tmp` extension) so the rename stays on one filesystem.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }

    file.sync_all()?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greeting.prompt");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("greeting.tmp").exists());
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("x.chat");
        assert!(atomic_write(&path, b"[]").is_err());
    }
}
