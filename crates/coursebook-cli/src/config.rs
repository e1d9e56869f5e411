use crate::cli::Cli;
use anyhow::{Context, Result};
use coursebook_watch::{LogLevel, WatchOptions};
use serde::Deserialize;
use std::path::Path;

/// Contents of the optional TOML config file.
///
/// ```toml
/// source = ["./docs", "./src"]
/// exclude = "**/*.log"
/// use_polling = false
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Watch options, see [`WatchOptions`].
    #[serde(flatten)]
    pub watch: WatchOptions,

    /// Watcher log level.
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

/// Settings after merging the config file with command-line flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: WatchOptions,
    pub log_level: LogLevel,
}

impl CliConfig {
    /// Load the config file, or start from defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply command-line overrides.
    ///
    /// Sources on the command line replace the configured ones, excludes are
    /// appended, and polling is on if either side asks for it.
    pub fn merge(self, cli: &Cli) -> Settings {
        let mut options = self.watch;
        if !cli.sources.is_empty() {
            options.source = cli.sources.clone();
        }
        options.exclude.extend(cli.exclude.iter().cloned());
        options.use_polling |= cli.poll;

        let log_level = cli
            .log_level
            .map(LogLevel::from)
            .or(self.log_level)
            .unwrap_or_default();

        Settings { options, log_level }
    }
}
