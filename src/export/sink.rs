//! Destinations for finished exports.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where a finished export file is delivered.
pub trait SaveSink {
    /// Deliver `bytes` as `file_name`. A failed save must leave nothing
    /// behind under that name.
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Saves into a directory.
///
/// Bytes go to a hidden temporary file first and are renamed into place, so
/// a failure never leaves a partial file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file name '{}'", file_name),
            ));
        }
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{}.partial", file_name));
        let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, self.dir.join(file_name)));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

/// Keeps saved files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RefCell<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved file, in save order.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.borrow().clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.borrow().iter().map(|(name, _)| name.clone()).collect()
    }
}

impl SaveSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        self.files
            .borrow_mut()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("buildfolio-sink-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = scratch_dir("write");
        let sink = DirectorySink::new(&dir);
        sink.save("out.pdf", b"%PDF-1.7").unwrap();
        assert_eq!(fs::read(dir.join("out.pdf")).unwrap(), b"%PDF-1.7");
        assert!(!dir.join(".out.pdf.partial").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_sink_rejects_paths() {
        let dir = scratch_dir("reject");
        let sink = DirectorySink::new(&dir);
        assert!(sink.save("../escape.pdf", b"x").is_err());
        assert!(sink.save("", b"x").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.save("a.html", b"1").unwrap();
        sink.save("b.pdf", b"2").unwrap();
        assert_eq!(sink.file_names(), vec!["a.html", "b.pdf"]);
        assert_eq!(sink.files()[1].1, b"2");
    }
}
