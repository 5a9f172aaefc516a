use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use album_core::ResourceUrl;

use crate::{AtomicFileWriter, PersistError};

pub const LEDGER_FILENAME: &str = "failed_downloads.txt";

/// URLs whose download ended in failure, with the reason for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLedger {
    entries: Vec<(ResourceUrl, String)>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, url: ResourceUrl, reason: impl Into<String>) {
        self.entries.push((url, reason.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &ResourceUrl) -> bool {
        self.entries.iter().any(|(entry, _)| entry == url)
    }

    pub fn entries(&self) -> &[(ResourceUrl, String)] {
        &self.entries
    }

    /// Writes the ledger, one URL per line sorted, replacing the previous run's file.
    /// An empty ledger writes nothing and removes a stale file, so the file on disk
    /// always lists exactly the unresolved URLs of the latest run.
    pub fn persist(&self, run_dir: &Path) -> Result<Option<PathBuf>, PersistError> {
        if self.entries.is_empty() {
            match fs::remove_file(run_dir.join(LEDGER_FILENAME)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return Ok(None);
        }

        let mut urls: Vec<&ResourceUrl> = self.entries.iter().map(|(url, _)| url).collect();
        urls.sort();
        urls.dedup();
        let writer = AtomicFileWriter::new(run_dir.to_path_buf());
        writer
            .write_lines(LEDGER_FILENAME, urls.iter().map(|url| url.as_str()))
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> ResourceUrl {
        ResourceUrl::new(s).unwrap()
    }

    #[test]
    fn empty_ledger_writes_nothing_and_clears_stale_file() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join(LEDGER_FILENAME);
        fs::write(&stale, "https://i/old.jpg\n").unwrap();

        let written = FailureLedger::new().persist(temp.path()).unwrap();
        assert!(written.is_none());
        assert!(!stale.exists());
    }

    #[test]
    fn writes_one_sorted_url_per_line() {
        let temp = TempDir::new().unwrap();
        let mut ledger = FailureLedger::new();
        ledger.record(url("https://i/b.jpg"), "http status 500");
        ledger.record(url("https://i/a.jpg"), "timeout");

        let path = ledger.persist(temp.path()).unwrap().unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "https://i/a.jpg\nhttps://i/b.jpg\n"
        );
        assert!(ledger.contains(&url("https://i/a.jpg")));
        assert_eq!(ledger.len(), 2);
    }
}
