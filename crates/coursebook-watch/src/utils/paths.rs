//! Path helpers for reporting changes relative to a base directory.

use std::cmp::Reverse;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute, canonical form of `path` interpreted relative to `base`.
pub fn resolve_against(base: &Path, path: &Path) -> io::Result<PathBuf> {
    base.join(path).canonicalize()
}

/// `path` relative to `base` when it lies below it, unchanged otherwise.
pub fn report_path(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// `path` joined onto `base` without touching the filesystem, `.` dropped.
pub fn lexical_join(base: &Path, path: &Path) -> PathBuf {
    base.join(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Watched roots, each in canonical form and as configured.
///
/// Backends watch the canonical form. Paths are mapped back onto the
/// configured form before they are reported, so a root reached through a
/// symlink still reports paths below the link.
#[derive(Debug, Clone, Default)]
pub struct RootAliases {
    roots: Vec<(PathBuf, PathBuf)>,
}

impl RootAliases {
    /// Register a root. The most specific canonical root wins on lookup.
    pub fn insert(&mut self, canonical: PathBuf, configured: PathBuf) {
        self.roots.push((canonical, configured));
        self.roots
            .sort_by_key(|(canonical, _)| Reverse(canonical.components().count()));
    }

    /// Canonical roots, most specific first.
    pub fn canonical(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|(canonical, _)| canonical.as_path())
    }

    /// Rewrite a path below a canonical root onto its configured root.
    pub fn to_configured(&self, path: &Path) -> PathBuf {
        for (canonical, configured) in &self.roots {
            if let Ok(rest) = path.strip_prefix(canonical) {
                return if rest.as_os_str().is_empty() {
                    configured.clone()
                } else {
                    configured.join(rest)
                };
            }
        }
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths_below_base_become_relative() {
        let base = Path::new("/work/project");
        assert_eq!(report_path(Path::new("/work/project/a.txt"), base), "a.txt");

        let nested = report_path(Path::new("/work/project/src/lib.rs"), base);
        assert_eq!(Path::new(&nested), Path::new("src/lib.rs"));
    }

    #[test]
    fn paths_outside_base_stay_absolute() {
        let base = Path::new("/work/project");
        assert_eq!(report_path(Path::new("/other/a.txt"), base), "/other/a.txt");
    }

    #[test]
    fn the_base_itself_is_dot() {
        let base = Path::new("/work/project");
        assert_eq!(report_path(base, base), ".");
    }

    #[test]
    fn resolves_relative_roots() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();

        let resolved = resolve_against(temp.path(), Path::new("./docs")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("docs"));
    }

    #[test]
    fn missing_roots_fail_to_resolve() {
        let temp = TempDir::new().unwrap();
        let err = resolve_against(temp.path(), Path::new("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn lexical_join_drops_current_dir() {
        let base = Path::new("/work/project");
        assert_eq!(lexical_join(base, Path::new(".")), PathBuf::from("/work/project"));
        assert_eq!(
            lexical_join(base, Path::new("./docs")),
            PathBuf::from("/work/project/docs")
        );
        assert_eq!(lexical_join(base, Path::new("/abs/root")), PathBuf::from("/abs/root"));
    }

    #[test]
    fn aliases_map_canonical_paths_back_to_configured_roots() {
        let mut roots = RootAliases::default();
        roots.insert(PathBuf::from("/tmp/target"), PathBuf::from("/work/project/docs"));

        assert_eq!(
            roots.to_configured(Path::new("/tmp/target/a.md")),
            PathBuf::from("/work/project/docs/a.md")
        );
        assert_eq!(
            roots.to_configured(Path::new("/tmp/target")),
            PathBuf::from("/work/project/docs")
        );
        assert_eq!(
            roots.to_configured(Path::new("/elsewhere/b.md")),
            PathBuf::from("/elsewhere/b.md")
        );

        let configured = roots.to_configured(Path::new("/tmp/target/a.md"));
        assert_eq!(report_path(&configured, Path::new("/work/project")), "docs/a.md");
    }

    #[test]
    fn most_specific_root_wins() {
        let mut roots = RootAliases::default();
        roots.insert(PathBuf::from("/data"), PathBuf::from("/work/data"));
        roots.insert(PathBuf::from("/data/inner"), PathBuf::from("/work/inner"));

        assert_eq!(roots.canonical().count(), 2);
        assert_eq!(
            roots.to_configured(Path::new("/data/inner/x.txt")),
            PathBuf::from("/work/inner/x.txt")
        );
        assert_eq!(
            roots.to_configured(Path::new("/data/y.txt")),
            PathBuf::from("/work/data/y.txt")
        );
    }
}
