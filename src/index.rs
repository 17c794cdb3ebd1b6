use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

// Must match the encoding of links already in the published catalog.
const LINK_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub tags: Vec<String>,
    #[serde(rename = "no noclip used")]
    pub no_noclip_used: bool,
    pub creator: String,
    pub date: String,
    pub size: String,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum IndexLoadError {
    #[error("read index: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed index data: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, IndexLoadError> {
        let raw = fs::read_to_string(path)?;
        let entries: Vec<IndexEntry> = serde_json::from_str(&raw)?;
        Ok(Self { entries })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.entries).context("serialize index")?;
        fs::write(path, raw).context("write index")?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    // Replace, never merge: at most one entry per name after every upsert.
    pub fn upsert(&mut self, entry: IndexEntry) {
        self.entries.retain(|existing| existing.name != entry.name);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn macro_link(base_url: &str, file_name: &str) -> String {
    let encoded = utf8_percent_encode(file_name, LINK_KEEP);
    if base_url.ends_with('/') {
        format!("{base_url}{encoded}")
    } else {
        format!("{base_url}/{encoded}")
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNIT: f64 = 1024.0;
    let kb = bytes as f64 / UNIT;
    let mb = kb / UNIT;
    let gb = mb / UNIT;

    if gb >= 1.0 {
        format!("{gb:.2} GB")
    } else if mb >= 1.0 {
        format!("{mb:.2} MB")
    } else if kb >= 1.0 {
        format!("{kb:.2} KB")
    } else {
        format!("{bytes} bytes")
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|tag| tag.to_string()).collect()
}
