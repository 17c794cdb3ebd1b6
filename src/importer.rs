use anyhow::{Context, Result};
use std::{fs, path::Path};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Copied,
    Skipped,
    Failed(String),
}

impl SyncOutcome {
    pub fn describe(&self, file_name: &str) -> String {
        match self {
            SyncOutcome::Copied => format!("Copied {file_name} successfully."),
            SyncOutcome::Skipped => format!("Skipped {file_name} (already up to date)."),
            SyncOutcome::Failed(reason) => {
                format!("Failed to copy {file_name}. Reason: {reason}")
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub file_name: String,
    pub outcome: SyncOutcome,
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

// One entry's failure never aborts the rest; every outcome is reported
// through `report` as it happens.
pub fn sync_dir(
    source: &Path,
    dest: &Path,
    report: &mut dyn FnMut(SyncEvent),
) -> Result<SyncSummary> {
    fs::create_dir_all(source).context("create source dir")?;
    fs::create_dir_all(dest).context("create destination dir")?;

    let mut names = Vec::new();
    for entry in WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.context("list source dir")?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    let total = names.len();
    let mut summary = SyncSummary::default();
    for (index, file_name) in names.into_iter().enumerate() {
        let outcome = match copy_if_changed(&source.join(&file_name), &dest.join(&file_name)) {
            Ok(outcome) => outcome,
            Err(err) => SyncOutcome::Failed(err.to_string()),
        };
        match outcome {
            SyncOutcome::Copied => summary.copied += 1,
            SyncOutcome::Skipped => summary.skipped += 1,
            SyncOutcome::Failed(_) => summary.failed += 1,
        }
        report(SyncEvent {
            file_name,
            outcome,
            done: index + 1,
            total,
        });
    }

    Ok(summary)
}

fn copy_if_changed(source: &Path, dest: &Path) -> std::io::Result<SyncOutcome> {
    if let Ok(existing) = fs::metadata(dest) {
        if existing.len() == fs::metadata(source)?.len() {
            return Ok(SyncOutcome::Skipped);
        }
    }
    fs::copy(source, dest)?;
    Ok(SyncOutcome::Copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run_sync(source: &Path, dest: &Path) -> (SyncSummary, Vec<SyncEvent>) {
        let mut events = Vec::new();
        let summary = sync_dir(source, dest, &mut |event| events.push(event)).unwrap();
        (summary, events)
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&source).unwrap();
        (dir, source, dest)
    }

    #[test]
    fn copies_new_file_byte_for_byte() {
        let (_dir, source, dest) = setup();
        fs::write(source.join("a.re"), vec![7u8; 100]).unwrap();

        let (summary, events) = run_sync(&source, &dest);

        assert_eq!(summary.copied, 1);
        assert_eq!(fs::read(dest.join("a.re")).unwrap(), vec![7u8; 100]);
        assert_eq!(events[0].outcome, SyncOutcome::Copied);
        assert_eq!(
            events[0].outcome.describe(&events[0].file_name),
            "Copied a.re successfully."
        );
    }

    #[test]
    fn skips_same_size_file_without_touching_it() {
        let (_dir, source, dest) = setup();
        fs::create_dir_all(&dest).unwrap();
        fs::write(source.join("a.re"), vec![1u8; 64]).unwrap();
        fs::write(dest.join("a.re"), vec![2u8; 64]).unwrap();

        let (summary, events) = run_sync(&source, &dest);

        assert_eq!(summary.skipped, 1);
        assert_eq!(events[0].outcome, SyncOutcome::Skipped);
        // same size means the destination stays byte-for-byte unchanged
        assert_eq!(fs::read(dest.join("a.re")).unwrap(), vec![2u8; 64]);
    }

    #[test]
    fn recopies_when_sizes_differ() {
        let (_dir, source, dest) = setup();
        fs::create_dir_all(&dest).unwrap();
        fs::write(source.join("a.re"), vec![1u8; 64]).unwrap();
        fs::write(dest.join("a.re"), vec![2u8; 10]).unwrap();

        let (summary, _) = run_sync(&source, &dest);

        assert_eq!(summary.copied, 1);
        assert_eq!(fs::read(dest.join("a.re")).unwrap(), vec![1u8; 64]);
    }

    #[test]
    fn one_failure_does_not_abort_the_rest() {
        let (_dir, source, dest) = setup();
        // a directory entry cannot be copied as a file and must fail alone
        fs::create_dir_all(source.join("a_folder")).unwrap();
        fs::write(source.join("b.re"), vec![3u8; 20]).unwrap();

        let (summary, events) = run_sync(&source, &dest);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.copied, 1);
        assert_eq!(events.len(), 2);
        assert!(events[0].outcome.is_failure());
        assert_eq!(events[1].outcome, SyncOutcome::Copied);
        assert!(dest.join("b.re").exists());
    }

    #[test]
    fn creates_missing_destination_dir() {
        let (_dir, source, dest) = setup();
        fs::write(source.join("a.re"), b"x").unwrap();

        let (summary, _) = run_sync(&source, &dest);

        assert_eq!(summary.copied, 1);
        assert!(dest.is_dir());
    }

    #[test]
    fn events_carry_running_progress() {
        let (_dir, source, dest) = setup();
        fs::write(source.join("a.re"), b"a").unwrap();
        fs::write(source.join("b.re"), b"b").unwrap();

        let (_, events) = run_sync(&source, &dest);

        assert_eq!(events.len(), 2);
        assert_eq!((events[0].done, events[0].total), (1, 2));
        assert_eq!((events[1].done, events[1].total), (2, 2));
    }
}
