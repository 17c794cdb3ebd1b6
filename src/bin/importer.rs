use anyhow::Result;
use macrodex::{
    config::AppConfig,
    importer::{self, SyncEvent, SyncSummary},
    logging::SessionLog,
};
use std::{sync::mpsc, thread};

enum SyncMessage {
    Progress(SyncEvent),
    Finished(Result<SyncSummary, String>),
}

fn main() -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let log = SessionLog::new(AppConfig::log_path()?);
    log.info(&format!(
        "importer session: {} -> {}",
        config.source_dir.display(),
        config.work_dir.display()
    ));
    println!(
        "Importing macros from {} into {}",
        config.source_dir.display(),
        config.work_dir.display()
    );

    // The copy loop runs on a worker; the channel is the only shared state.
    let (tx, rx) = mpsc::channel();
    let source = config.source_dir.clone();
    let dest = config.work_dir.clone();
    thread::spawn(move || {
        let result = importer::sync_dir(&source, &dest, &mut |event| {
            let _ = tx.send(SyncMessage::Progress(event));
        });
        let _ = tx.send(SyncMessage::Finished(
            result.map_err(|err| format!("{err:#}")),
        ));
    });

    for message in rx {
        match message {
            SyncMessage::Progress(event) => {
                let line = event.outcome.describe(&event.file_name);
                println!("[{}/{}] {line}", event.done, event.total);
                if event.outcome.is_failure() {
                    log.error(&line);
                } else {
                    log.info(&line);
                }
            }
            SyncMessage::Finished(Ok(summary)) => {
                let line = format!(
                    "Done: {} copied, {} skipped, {} failed.",
                    summary.copied, summary.skipped, summary.failed
                );
                println!("{line}");
                log.info(&line);
            }
            SyncMessage::Finished(Err(err)) => {
                eprintln!("Import failed: {err}");
                log.error(&format!("import failed: {err}"));
            }
        }
    }

    Ok(())
}
