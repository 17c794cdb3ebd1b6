use anyhow::Result;
use macrodex::{
    config::AppConfig,
    downloader::{DeleteOutcome, Downloader, FetchOutcome},
    index::IndexEntry,
    logging::SessionLog,
    prompt::prompt_line,
};

fn main() -> Result<()> {
    let config = AppConfig::load_or_create()?;
    let log = SessionLog::new(AppConfig::log_path()?);
    let downloader = Downloader::new(&config);

    let catalog = downloader.load_catalog(&config.cache_file(), &config.index_url, &log);
    if catalog.is_empty() {
        println!("No macros in the catalog.");
    } else {
        render(catalog.entries());
    }

    loop {
        let input = prompt_line("macro> ")?;
        match parse_command(&input) {
            Command::Quit => break,
            Command::List => render(catalog.entries()),
            Command::Fetch(number) => match pick(catalog.entries(), number) {
                Some(entry) => {
                    let line = fetch_status(&downloader, entry)?;
                    println!("{line}");
                    log.info(&line);
                }
                None => println!("No macro numbered {number}."),
            },
            Command::Delete(number) => match pick(catalog.entries(), number) {
                Some(entry) => {
                    let line = match downloader.delete(&entry.name)? {
                        DeleteOutcome::Deleted => format!("{} deleted successfully.", entry.name),
                        DeleteOutcome::Missing => format!("{} does not exist.", entry.name),
                    };
                    println!("{line}");
                    log.info(&line);
                }
                None => println!("No macro numbered {number}."),
            },
            Command::Empty => {}
            Command::Unknown => {
                println!("Commands: <number> download, d <number> delete, l list, q quit");
            }
        }
    }

    Ok(())
}

enum Command {
    Fetch(usize),
    Delete(usize),
    List,
    Quit,
    Empty,
    Unknown,
}

fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }
    if let Ok(number) = input.parse::<usize>() {
        return Command::Fetch(number);
    }
    match input.to_lowercase().as_str() {
        "l" | "list" => Command::List,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.strip_prefix("d ").map(str::trim) {
            Some(rest) => match rest.parse::<usize>() {
                Ok(number) => Command::Delete(number),
                Err(_) => Command::Unknown,
            },
            None => Command::Unknown,
        },
    }
}

fn pick(entries: &[IndexEntry], number: usize) -> Option<&IndexEntry> {
    number.checked_sub(1).and_then(|index| entries.get(index))
}

fn render(entries: &[IndexEntry]) {
    for (number, entry) in entries.iter().enumerate() {
        println!(
            "  [{}] {} - Creator: {}, Size: {}",
            number + 1,
            entry.name,
            entry.creator,
            entry.size
        );
    }
}

fn fetch_status(downloader: &Downloader, entry: &IndexEntry) -> Result<String> {
    let line = match downloader.fetch(entry)? {
        FetchOutcome::Downloaded => format!("{} downloaded successfully.", entry.name),
        FetchOutcome::AlreadyExists => format!("{} already exists.", entry.name),
        FetchOutcome::Offline => "Connect to the internet to download macros.".to_string(),
        FetchOutcome::Failed => format!("Failed to download {}.", entry.name),
    };
    Ok(line)
}
