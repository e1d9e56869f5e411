use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Every checked and delivered path
    Trace,
    /// Debug messages
    Debug,
    /// Watch start and stop (default)
    Info,
    /// Warnings and errors
    Warn,
    /// Error messages only
    Error,
}

impl From<LogLevel> for coursebook_watch::LogLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::Trace,
            LogLevel::Debug => Self::Debug,
            LogLevel::Info => Self::Info,
            LogLevel::Warn => Self::Warn,
            LogLevel::Error => Self::Error,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "coursebook-watch")]
#[command(about = "Print the paths of files that change under the given roots")]
#[command(version)]
pub struct Cli {
    /// Paths to watch (overrides `source` from the config file)
    pub sources: Vec<PathBuf>,

    /// Glob of paths to ignore, may be repeated (added to the config file list)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Poll the filesystem instead of using native notifications
    #[arg(long)]
    pub poll: bool,

    /// Watcher log level (overrides the config file)
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// TOML config file with source, exclude, use_polling and log_level
    #[arg(short = 'C', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
