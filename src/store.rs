//! Persisted list of slideshow image URLs.
//!
//! The store is a single JSON document, `{ "tweets": [ {"url": ...}, ... ] }`,
//! grown by the ingestion run and read by the slideshow.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub tweets: Vec<StoreEntry>,
}

/// Handle on the store file.
#[derive(Debug, Clone)]
pub struct ImageStore {
    path: PathBuf,
}

impl ImageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing file is an empty store.
    pub fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }

        let json = fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&json)
            .map_err(|e| FrameError::Parse(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(
            "Loaded image store with {} entries from {}",
            document.tweets.len(),
            self.path.display()
        );
        Ok(document)
    }

    /// Append `urls` to the stored list and rewrite the file.
    ///
    /// Existing entries are never removed. URLs already stored, or repeated
    /// within `urls`, are skipped. Returns how many entries were added.
    pub fn append<I, S>(&self, urls: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut document = self.load()?;
        let mut seen: HashSet<String> = document.tweets.iter().map(|e| e.url.clone()).collect();

        let before = document.tweets.len();
        for url in urls {
            let url = url.into();
            if seen.insert(url.clone()) {
                document.tweets.push(StoreEntry { url });
            }
        }
        let added = document.tweets.len() - before;

        if added > 0 {
            self.save(&document)?;
        }
        tracing::info!(
            "Appended {} entries to {} ({} total)",
            added,
            self.path.display(),
            document.tweets.len()
        );
        Ok(added)
    }

    /// Rewrite the whole document via a temp file and rename.
    fn save(&self, document: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| FrameError::Parse(format!("serialize store: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ImageStore {
        ImageStore::new(dir.path().join("tweets.json"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = store_in(&dir).load().expect("load");
        assert!(doc.tweets.is_empty());
    }

    #[test]
    fn append_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"tweets": [{"url": "https://pbs.twimg.com/a.jpg"}, {"url": "https://pbs.twimg.com/b.jpg"}]}"#,
        )
        .unwrap();

        let added = store
            .append(["https://pbs.twimg.com/c.jpg", "https://pbs.twimg.com/d.jpg"])
            .expect("append");
        assert_eq!(added, 2);

        let urls: Vec<String> = store.load().unwrap().tweets.into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://pbs.twimg.com/a.jpg",
                "https://pbs.twimg.com/b.jpg",
                "https://pbs.twimg.com/c.jpg",
                "https://pbs.twimg.com/d.jpg",
            ]
        );
    }

    #[test]
    fn append_skips_urls_already_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(["https://pbs.twimg.com/a.jpg"]).unwrap();

        let added = store
            .append(["https://pbs.twimg.com/a.jpg", "https://pbs.twimg.com/b.jpg", "https://pbs.twimg.com/b.jpg"])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.load().unwrap().tweets.len(), 2);
        assert!(!dir.path().join("tweets.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(FrameError::Parse(_))));
        assert!(store.append(["https://pbs.twimg.com/a.jpg"]).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "not json");
    }
}
