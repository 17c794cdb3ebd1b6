use anyhow::Result;
use macrodex::{
    config::AppConfig,
    index::{split_tags, Index, IndexLoadError},
    indexer::{IndexerSession, IndexerStep, MacroInput},
    logging::SessionLog,
    prompt::{prompt_line, prompt_yes_no},
};

fn main() -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let log = SessionLog::new(AppConfig::log_path()?);

    let index = match Index::load(&config.index_path) {
        Ok(index) => index,
        Err(IndexLoadError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Index::new(),
        Err(IndexLoadError::Malformed(err)) => {
            println!(
                "Warning: {} contains invalid JSON. Starting with an empty index.",
                config.index_path.display()
            );
            log.warn(&format!(
                "malformed index at {}: {err}",
                config.index_path.display()
            ));
            Index::new()
        }
        Err(err) => {
            println!(
                "Warning: could not read {}. Starting with an empty index.",
                config.index_path.display()
            );
            log.warn(&format!(
                "failed to read index at {}: {err}",
                config.index_path.display()
            ));
            Index::new()
        }
    };

    let mut session = IndexerSession::start(&config.work_dir, index, &config.macro_base_url)?;
    let (_, total) = session.progress();
    println!(
        "Indexing {total} file(s) in {}",
        config.work_dir.display()
    );

    loop {
        match session.step() {
            IndexerStep::ConfirmOverwrite { file_name } => {
                println!("Processing file: {file_name}");
                let overwrite = prompt_yes_no(
                    &format!("File {file_name} already exists in indexes. Overwrite?"),
                    false,
                )?;
                if overwrite {
                    session.accept_overwrite();
                } else {
                    println!("Skipped {file_name}.");
                    session.skip_current();
                }
            }
            IndexerStep::CollectInput { file_name } => {
                println!("Input for {file_name}");
                let tags = split_tags(&prompt_line("Enter tags separated by spaces: ")?);
                let no_noclip_used = prompt_yes_no("No noclip used?", false)?;
                let creator = prompt_line("Enter creator: ")?;
                let input = MacroInput {
                    tags,
                    no_noclip_used,
                    creator,
                };
                if let Err(err) = session.commit_current(input) {
                    let line = format!("Failed to index {file_name}. Reason: {err:#}");
                    println!("{line}");
                    log.error(&line);
                    session.skip_current();
                }
            }
            IndexerStep::Finished => break,
        }
    }

    let index = session.into_index();
    index.save(&config.index_path)?;
    println!("Indexes saved to {}", config.index_path.display());
    log.info(&format!(
        "indexer session saved {} entries to {}",
        index.len(),
        config.index_path.display()
    ));
    Ok(())
}
