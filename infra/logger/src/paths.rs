use std::borrow::Cow;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

const HOME_MARKER: &str = "~";

/// Shortens source paths by replacing a root directory with `~`.
#[derive(Debug, Clone, Default)]
pub struct PathRewriter {
    root: Option<String>,
}

impl PathRewriter {
    /// Uses the process working directory as the root; disabled if it cannot be read.
    #[must_use]
    pub fn from_current_dir() -> Self {
        std::env::current_dir().map_or_else(|_| Self::disabled(), Self::new)
    }

    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into().to_string_lossy().into_owned();
        Self { root: (!root.is_empty()).then_some(root) }
    }

    #[must_use]
    pub const fn disabled() -> Self {
        Self { root: None }
    }

    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Replaces every occurrence of the root in `path`.
    #[must_use]
    pub fn rewrite<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match &self.root {
            Some(root) if path.contains(root.as_str()) => {
                Cow::Owned(path.replace(root.as_str(), HOME_MARKER))
            },
            _ => Cow::Borrowed(path),
        }
    }

    /// Shortens a source location.
    ///
    /// Relative paths (as recorded by the compiler for workspace crates) are taken to be
    /// under the root and shown as `~/<path>`; absolute paths go through [`Self::rewrite`].
    #[must_use]
    pub fn source<'a>(&self, path: &'a str) -> Cow<'a, str> {
        if self.root.is_some() && Path::new(path).is_relative() {
            return Cow::Owned(format!("{HOME_MARKER}{MAIN_SEPARATOR}{path}"));
        }
        self.rewrite(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_root_prefix() {
        let paths = PathRewriter::new("/srv/app");
        assert_eq!(paths.rewrite("/srv/app/src/main.rs"), "~/src/main.rs");
    }

    #[test]
    fn leaves_foreign_paths_untouched() {
        let paths = PathRewriter::new("/srv/app");
        assert!(matches!(paths.rewrite("src/lib.rs"), Cow::Borrowed("src/lib.rs")));
        assert_eq!(paths.rewrite("/opt/other/x.rs"), "/opt/other/x.rs");
    }

    #[test]
    fn relative_sources_are_placed_under_root() {
        let paths = PathRewriter::new("/srv/app");
        let expected = format!("~{MAIN_SEPARATOR}apps/application/src/main.rs");
        assert_eq!(paths.source("apps/application/src/main.rs"), expected);
        assert_eq!(paths.source("/srv/app/src/main.rs"), "~/src/main.rs");
        assert_eq!(paths.source("/opt/other/x.rs"), "/opt/other/x.rs");
        assert_eq!(PathRewriter::disabled().source("src/lib.rs"), "src/lib.rs");
    }

    #[test]
    fn empty_root_disables_rewriting() {
        let paths = PathRewriter::new("");
        assert!(paths.root().is_none());
        assert_eq!(paths.rewrite("/srv/app/x.rs"), "/srv/app/x.rs");
        assert_eq!(PathRewriter::disabled().rewrite("/a/b"), "/a/b");
    }

    #[test]
    fn current_dir_root_matches_cwd() {
        let cwd = std::env::current_dir().expect("cwd should be readable");
        let paths = PathRewriter::from_current_dir();
        let file = cwd.join("src").join("lib.rs");
        let rewritten = paths.rewrite(file.to_str().expect("utf-8 path"));
        assert!(rewritten.starts_with('~'), "got {rewritten}");
    }
}
