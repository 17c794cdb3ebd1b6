use std::{fs, io::Write, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

// Logging must never interrupt a session; write failures are swallowed.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn info(&self, message: &str) {
        let _ = append_log_file(&self.path, LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        let _ = append_log_file(&self.path, LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        let _ = append_log_file(&self.path, LogLevel::Error, message);
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn append_log_file(path: &PathBuf, level: LogLevel, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "[{label}] {message}")
}
