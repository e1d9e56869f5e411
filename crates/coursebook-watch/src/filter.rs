//! Glob-based path exclusion.

use crate::{error::Result, logging::Logger, traits::PatternMatcher};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::sync::Arc;

/// [`PatternMatcher`] backed by a compiled [`GlobSet`].
///
/// `*` and `?` stay within one path component, `**` spans directories and
/// a leading `./` on the candidate path is ignored.
///
/// Unlike shell globbing, `*` and `**` also match names that start with a
/// dot: `**/*.log` excludes `.hidden.log` and `cache/**` excludes
/// `cache/.tmp/x`.
#[derive(Debug, Clone)]
pub struct GlobSetMatcher {
    set: GlobSet,
}

impl GlobSetMatcher {
    /// Compile `patterns` into a single matcher.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern.as_ref())
                .literal_separator(true)
                .build()?;
            builder.add(glob);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }
}

impl PatternMatcher for GlobSetMatcher {
    fn is_match(&self, path: &str) -> bool {
        let path = path.strip_prefix("./").unwrap_or(path);
        self.set.is_match(path)
    }
}

/// The configured exclude list together with the matcher built from it.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    patterns: Vec<String>,
    matcher: Arc<dyn PatternMatcher>,
}

impl ExcludePatterns {
    /// Compile `patterns` with the glob matcher.
    pub fn compile(patterns: Vec<String>) -> Result<Self> {
        let matcher = GlobSetMatcher::new(&patterns)?;
        Ok(Self {
            patterns,
            matcher: Arc::new(matcher),
        })
    }

    /// Pair `patterns` with an arbitrary matcher.
    pub fn with_matcher(patterns: Vec<String>, matcher: Arc<dyn PatternMatcher>) -> Self {
        Self { patterns, matcher }
    }

    /// An exclude list that excludes nothing.
    pub fn empty() -> Self {
        Self::with_matcher(Vec::new(), Arc::new(NoMatch))
    }

    /// The patterns as configured.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Debug)]
struct NoMatch;

impl PatternMatcher for NoMatch {
    fn is_match(&self, _path: &str) -> bool {
        false
    }
}

/// Whether `path` should be suppressed under `patterns`.
///
/// Logs one trace line before the check and one with the outcome.
pub fn should_exclude(path: &str, patterns: &ExcludePatterns, logger: &Logger) -> bool {
    logger.trace(format_args!("Checking if {} should be ignored.", path));
    if !patterns.is_empty() && patterns.matcher.is_match(path) {
        logger.trace(format_args!("{} matches exclude pattern.", path));
        return true;
    }
    logger.trace(format_args!("{} does not match the exclude pattern.", path));
    false
}
