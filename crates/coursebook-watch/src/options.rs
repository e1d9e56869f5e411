//! User-facing watch options and their validated form.

use crate::{
    error::{Error, Result},
    filter::ExcludePatterns,
};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Options accepted by [`Watcher`](crate::Watcher).
///
/// `source` and `exclude` accept either a single value or a list when
/// deserialized, so `source = "./docs"` and `source = ["./a", "./b"]` are
/// both valid TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatchOptions {
    /// Root paths to watch.
    #[serde(default, deserialize_with = "one_or_many")]
    pub source: Vec<PathBuf>,
    /// Glob patterns of paths to suppress.
    #[serde(default, deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
    /// Poll the filesystem instead of using native events.
    #[serde(default, alias = "usePolling")]
    pub use_polling: bool,
}

impl WatchOptions {
    /// Options watching a single root.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::with_sources([source])
    }

    /// Options watching several roots.
    pub fn with_sources<I, P>(sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            source: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the exclude patterns.
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable polling mode.
    pub fn with_polling(mut self, use_polling: bool) -> Self {
        self.use_polling = use_polling;
        self
    }

    /// Validate and default the options.
    pub fn resolve(self) -> Result<ResolvedWatchConfig> {
        if self.source.is_empty() || self.source.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(Error::config("Source is required"));
        }

        let exclude = ExcludePatterns::compile(self.exclude)?;
        Ok(ResolvedWatchConfig {
            source: self.source,
            exclude,
            use_polling: self.use_polling,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Validated, fully defaulted options. Immutable once built.
#[derive(Debug, Clone)]
pub struct ResolvedWatchConfig {
    source: Vec<PathBuf>,
    exclude: ExcludePatterns,
    use_polling: bool,
}

impl ResolvedWatchConfig {
    /// Roots to watch, never empty.
    pub fn source(&self) -> &[PathBuf] {
        &self.source
    }

    /// Compiled exclude patterns.
    pub fn exclude(&self) -> &ExcludePatterns {
        &self.exclude
    }

    /// Whether polling mode was requested.
    pub fn use_polling(&self) -> bool {
        self.use_polling
    }

    /// Roots joined with commas, for log messages.
    pub fn source_display(&self) -> String {
        self.source
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_source_is_rejected() {
        let err = WatchOptions::default().resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.message(), "Source is required");
    }

    #[test]
    fn empty_source_path_is_rejected() {
        let err = WatchOptions::new("").resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = WatchOptions::with_sources(["./a", ""]).resolve().unwrap_err();
        assert_eq!(err.message(), "Source is required");
    }

    #[test]
    fn defaults_are_applied() {
        let config = WatchOptions::new("./test").resolve().unwrap();
        assert_eq!(config.source(), [PathBuf::from("./test")]);
        assert!(config.exclude().is_empty());
        assert!(!config.use_polling());
    }

    #[test]
    fn provided_values_are_kept() {
        let config = WatchOptions::with_sources(["./test1", "./test2"])
            .with_exclude(["**/*.log", "node_modules/**"])
            .with_polling(true)
            .resolve()
            .unwrap();

        assert_eq!(config.source().len(), 2);
        assert_eq!(config.exclude().patterns(), ["**/*.log", "node_modules/**"]);
        assert!(config.use_polling());
        assert_eq!(config.source_display(), "./test1,./test2");
    }

    #[test]
    fn invalid_exclude_pattern_is_rejected() {
        let err = WatchOptions::new("./test")
            .with_exclude(["{unclosed"])
            .resolve()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn deserializes_single_values() {
        let options: WatchOptions = toml::from_str(
            r#"
            source = "./test"
            exclude = "**/*.log"
            "#,
        )
        .unwrap();

        assert_eq!(options.source, vec![PathBuf::from("./test")]);
        assert_eq!(options.exclude, vec!["**/*.log".to_string()]);
        assert!(!options.use_polling);
    }

    #[test]
    fn deserializes_lists_and_camel_case_polling() {
        let options: WatchOptions = toml::from_str(
            r#"
            source = ["./a", "./b"]
            exclude = ["**/*.tmp", "**/*.log"]
            usePolling = true
            "#,
        )
        .unwrap();

        assert_eq!(options.source.len(), 2);
        assert_eq!(options.exclude.len(), 2);
        assert!(options.use_polling);
    }

    #[test]
    fn deserialized_options_without_source_fail_to_resolve() {
        let options: WatchOptions = toml::from_str("use_polling = true").unwrap();
        assert_eq!(
            options.resolve().unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }
}
