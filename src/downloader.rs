use crate::{
    config::{AppConfig, USER_AGENT},
    index::{Index, IndexEntry, IndexLoadError},
    logging::SessionLog,
};
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

const CONNECTIVITY_URL: &str = "http://www.google.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded,
    AlreadyExists,
    Offline,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing,
}

pub struct Downloader {
    agent: ureq::Agent,
    probe: ureq::Agent,
    download_dir: PathBuf,
    extension: String,
}

impl Downloader {
    pub fn new(config: &AppConfig) -> Self {
        // Fetches run to completion; only the connectivity probe may time out.
        let agent = ureq::AgentBuilder::new().build();
        let probe = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(5))
            .timeout_write(Duration::from_secs(5))
            .build();
        Self {
            agent,
            probe,
            download_dir: config.download_dir.clone(),
            extension: config.macro_extension.clone(),
        }
    }

    // Cache wins over the network unconditionally; no cache and no network
    // degrades to an empty catalog.
    pub fn load_catalog(&self, cache_file: &Path, index_url: &str, log: &SessionLog) -> Index {
        if cache_file.exists() {
            return match Index::load(cache_file) {
                Ok(index) => index,
                Err(IndexLoadError::Malformed(err)) => {
                    log.warn(&format!(
                        "cached index at {} is malformed: {err}",
                        cache_file.display()
                    ));
                    Index::new()
                }
                Err(err) => {
                    log.warn(&format!(
                        "failed to read cached index at {}: {err}",
                        cache_file.display()
                    ));
                    Index::new()
                }
            };
        }

        match self.fetch_index(index_url) {
            Ok(index) => {
                if let Err(err) = persist_cache(&index, cache_file) {
                    log.warn(&format!("failed to cache index: {err:#}"));
                }
                index
            }
            Err(err) => {
                log.warn(&format!("failed to fetch index: {err:#}"));
                Index::new()
            }
        }
    }

    pub fn fetch(&self, entry: &IndexEntry) -> Result<FetchOutcome> {
        let path = self.macro_path(&entry.name);
        if path.exists() {
            return Ok(FetchOutcome::AlreadyExists);
        }
        if !self.online() {
            return Ok(FetchOutcome::Offline);
        }

        fs::create_dir_all(&self.download_dir).context("create download dir")?;
        let response = match self
            .agent
            .get(&entry.link)
            .set("User-Agent", USER_AGENT)
            .call()
        {
            Ok(response) => response,
            Err(_) => return Ok(FetchOutcome::Failed),
        };

        let mut reader = response.into_reader();
        let mut file = File::create(&path).context("create macro file")?;
        io::copy(&mut reader, &mut file).context("write macro file")?;
        Ok(FetchOutcome::Downloaded)
    }

    pub fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let path = self.macro_path(name);
        if !path.exists() {
            return Ok(DeleteOutcome::Missing);
        }
        fs::remove_file(&path).context("remove macro file")?;
        Ok(DeleteOutcome::Deleted)
    }

    pub fn online(&self) -> bool {
        self.probe
            .get(CONNECTIVITY_URL)
            .set("User-Agent", USER_AGENT)
            .call()
            .is_ok()
    }

    fn fetch_index(&self, url: &str) -> Result<Index> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .context("fetch index")?;
        let raw = response.into_string().context("read index body")?;
        let entries: Vec<IndexEntry> = serde_json::from_str(&raw).context("parse index")?;
        Ok(Index::from_entries(entries))
    }

    fn macro_path(&self, name: &str) -> PathBuf {
        self.download_dir.join(format!("{name}.{}", self.extension))
    }
}

fn persist_cache(index: &Index, cache_file: &Path) -> Result<()> {
    if let Some(parent) = cache_file.parent() {
        fs::create_dir_all(parent).context("create cache dir")?;
    }
    index.save(cache_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(download_dir: &Path) -> AppConfig {
        AppConfig {
            source_dir: PathBuf::new(),
            work_dir: PathBuf::new(),
            index_path: PathBuf::new(),
            cache_dir: PathBuf::new(),
            download_dir: download_dir.to_path_buf(),
            // unroutable: every network attempt fails fast
            index_url: "http://127.0.0.1:1/indexes.json".to_string(),
            macro_base_url: "http://127.0.0.1:1/Macros/".to_string(),
            macro_extension: "re".to_string(),
        }
    }

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            name: name.to_string(),
            tags: vec!["wave".to_string()],
            no_noclip_used: true,
            creator: "X".to_string(),
            date: "2025-01-01 00:00:00".to_string(),
            size: "100 bytes".to_string(),
            link: format!("http://127.0.0.1:1/Macros/{name}.re"),
        }
    }

    #[test]
    fn fetch_is_a_noop_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.re"), b"original").unwrap();
        let downloader = Downloader::new(&config(dir.path()));

        let outcome = downloader.fetch(&entry("foo")).unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyExists);
        assert_eq!(fs::read(dir.path().join("foo.re")).unwrap(), b"original");
    }

    #[test]
    fn delete_removes_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.re"), b"x").unwrap();
        let downloader = Downloader::new(&config(dir.path()));

        assert_eq!(downloader.delete("foo").unwrap(), DeleteOutcome::Deleted);
        assert!(!dir.path().join("foo.re").exists());
    }

    #[test]
    fn delete_missing_leaves_filesystem_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(&config(dir.path()));

        assert_eq!(downloader.delete("foo").unwrap(), DeleteOutcome::Missing);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn load_catalog_prefers_cache_over_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("cache").join("indexes.json");
        fs::create_dir_all(cache_file.parent().unwrap()).unwrap();
        Index::from_entries(vec![entry("foo")])
            .save(&cache_file)
            .unwrap();
        let downloader = Downloader::new(&config(dir.path()));
        let log = SessionLog::new(dir.path().join("session.log"));

        let catalog = downloader.load_catalog(&cache_file, "http://127.0.0.1:1/indexes.json", &log);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].name, "foo");
    }

    #[test]
    fn load_catalog_degrades_to_empty_without_cache_or_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("cache").join("indexes.json");
        let downloader = Downloader::new(&config(dir.path()));
        let log = SessionLog::new(dir.path().join("session.log"));

        let catalog = downloader.load_catalog(&cache_file, "http://127.0.0.1:1/indexes.json", &log);

        assert!(catalog.is_empty());
        assert!(!cache_file.exists());
    }

    #[test]
    fn load_catalog_survives_malformed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("indexes.json");
        fs::write(&cache_file, "[{ truncated").unwrap();
        let downloader = Downloader::new(&config(dir.path()));
        let log = SessionLog::new(dir.path().join("session.log"));

        let catalog = downloader.load_catalog(&cache_file, "http://127.0.0.1:1/indexes.json", &log);

        assert!(catalog.is_empty());
        // the malformed cache is left for the next successful fetch to replace
        assert!(cache_file.exists());
    }
}
