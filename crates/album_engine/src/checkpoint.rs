//! Append-only record of discovered image URLs (`scraped_urls.txt`).
//!
//! One URL per line. Lines are only ever appended; a trailing fragment without a
//! newline (a crash mid-append) is ignored on load and cut off before the next
//! append so it cannot merge with new lines.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use album_core::ResourceUrl;
use album_logging::album_warn;
use thiserror::Error;

pub const CHECKPOINT_FILENAME: &str = "scraped_urls.txt";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    known: HashSet<ResourceUrl>,
    ordered: Vec<ResourceUrl>,
    /// Length of the file up to and including its last complete line.
    valid_len: u64,
    file: Option<File>,
}

impl CheckpointStore {
    /// Opens the checkpoint of a run directory, loading whatever is already there.
    pub fn open(run_dir: &Path) -> Result<Self, CheckpointError> {
        Self::open_path(run_dir.join(CHECKPOINT_FILENAME))
    }

    pub fn open_path(path: PathBuf) -> Result<Self, CheckpointError> {
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        let valid_len = raw
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        if valid_len < raw.len() {
            album_warn!(
                "Ignoring {} trailing bytes of a truncated line in {:?}",
                raw.len() - valid_len,
                path
            );
        }

        let mut known = HashSet::new();
        let mut ordered = Vec::new();
        for line in raw[..valid_len].split(|b| *b == b'\n') {
            let Ok(text) = std::str::from_utf8(line) else {
                continue;
            };
            if let Some(url) = ResourceUrl::new(text.trim()) {
                if known.insert(url.clone()) {
                    ordered.push(url);
                }
            }
        }

        Ok(Self {
            path,
            known,
            ordered,
            valid_len: valid_len as u64,
            file: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URLs loaded from disk plus everything appended since, in file order.
    pub fn load(&self) -> &[ResourceUrl] {
        &self.ordered
    }

    pub fn contains(&self, url: &ResourceUrl) -> bool {
        self.known.contains(url)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Appends the URLs not yet recorded as one write and syncs before returning.
    /// Returns the URLs that were actually appended.
    pub fn append(&mut self, urls: &[ResourceUrl]) -> Result<Vec<ResourceUrl>, CheckpointError> {
        let mut batch_seen = HashSet::new();
        let fresh: Vec<ResourceUrl> = urls
            .iter()
            .filter(|url| !self.known.contains(*url) && batch_seen.insert(*url))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Ok(fresh);
        }

        let mut buf = String::new();
        for url in &fresh {
            buf.push_str(url.as_str());
            buf.push('\n');
        }

        self.write_durably(buf.as_bytes())
            .map_err(|source| CheckpointError::Io {
                path: self.path.clone(),
                source,
            })?;

        for url in &fresh {
            self.known.insert(url.clone());
            self.ordered.push(url.clone());
        }
        Ok(fresh)
    }

    fn write_durably(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            if file.metadata()?.len() > self.valid_len {
                file.set_len(self.valid_len)?;
            }
            self.file = Some(file);
        }
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("checkpoint file not open"));
        };
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_data()?;
        self.valid_len += bytes.len() as u64;
        Ok(())
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
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = CheckpointStore::open(temp.path()).unwrap();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn truncated_last_line_is_dropped_and_cut_before_append() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CHECKPOINT_FILENAME);
        fs::write(&path, "https://i/a.jpg\n\nhttps://i/b.jpg\nhttps://i/c.j").unwrap();

        let mut store = CheckpointStore::open(temp.path()).unwrap();
        assert_eq!(store.load(), &[url("https://i/a.jpg"), url("https://i/b.jpg")]);

        store.append(&[url("https://i/c.jpg")]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "https://i/a.jpg\n\nhttps://i/b.jpg\nhttps://i/c.jpg\n");
    }

    #[test]
    fn invalid_utf8_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CHECKPOINT_FILENAME);
        fs::write(&path, b"https://i/a.jpg\n\xff\xfe\nhttps://i/b.jpg\n").unwrap();
        let store = CheckpointStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 2);
    }
}
