use crate::index::{format_size, macro_link, Index, IndexEntry};
use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::{macros::format_description, OffsetDateTime};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInput {
    pub tags: Vec<String>,
    pub no_noclip_used: bool,
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexerStep {
    ConfirmOverwrite { file_name: String },
    CollectInput { file_name: String },
    Finished,
}

#[derive(Debug)]
pub struct IndexerSession {
    work_dir: PathBuf,
    files: Vec<String>,
    cursor: usize,
    overwrite_accepted: bool,
    index: Index,
    macro_base_url: String,
}

impl IndexerSession {
    pub fn start(work_dir: &Path, index: Index, macro_base_url: &str) -> Result<Self> {
        fs::create_dir_all(work_dir).context("create working dir")?;
        let files = list_macro_files(work_dir)?;
        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            files,
            cursor: 0,
            overwrite_accepted: false,
            index,
            macro_base_url: macro_base_url.to_string(),
        })
    }

    pub fn step(&self) -> IndexerStep {
        let Some(file_name) = self.files.get(self.cursor) else {
            return IndexerStep::Finished;
        };
        if !self.overwrite_accepted && self.index.contains(&base_name(file_name)) {
            IndexerStep::ConfirmOverwrite {
                file_name: file_name.clone(),
            }
        } else {
            IndexerStep::CollectInput {
                file_name: file_name.clone(),
            }
        }
    }

    pub fn accept_overwrite(&mut self) {
        self.overwrite_accepted = true;
    }

    pub fn skip_current(&mut self) {
        self.advance();
    }

    // On failure the cursor stays put; the driver decides to retry or skip.
    pub fn commit_current(&mut self, input: MacroInput) -> Result<()> {
        let Some(file_name) = self.files.get(self.cursor) else {
            bail!("no file left to commit");
        };
        let entry = build_entry(&self.work_dir.join(file_name), input, &self.macro_base_url)?;
        self.index.upsert(entry);
        self.advance();
        Ok(())
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.files.len())
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn into_index(self) -> Index {
        self.index
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.overwrite_accepted = false;
    }
}

// Size and date come from the live file at confirmation time, not from the
// earlier directory walk.
fn build_entry(path: &Path, input: MacroInput, macro_base_url: &str) -> Result<IndexEntry> {
    let file_name = path
        .file_name()
        .context("macro file name")?
        .to_string_lossy()
        .to_string();
    let size = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    Ok(IndexEntry {
        name: base_name(&file_name),
        tags: input.tags,
        no_noclip_used: input.no_noclip_used,
        creator: input.creator,
        date: timestamp()?,
        size: format_size(size),
        link: macro_link(macro_base_url, &file_name),
    })
}

fn base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string())
}

fn timestamp() -> Result<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .context("format entry date")
}

fn list_macro_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.context("list working dir")?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().to_string());
    }
    Ok(files)
}
