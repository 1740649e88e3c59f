//! Gitignore-style path filtering for repository prompt dumps.
//!
//! Enumerates every regular file under a repository root (never descending
//! into `.git`), then drops lock files and whatever the root `.gitignore`
//! excludes. Patterns follow the usual ignore-file rules: the last matching
//! pattern wins, `!` negates, a trailing `/` restricts a pattern to
//! directories, a leading `/` anchors it to the root.

use std::io;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use walkdir::WalkDir;

/// Version-control metadata directory, never enumerated.
pub const VCS_DIR: &str = ".git";

/// Ignore file read from the repository root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Files ending in this suffix are always dropped.
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// `*` crosses `/`, like shell `fnmatch`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Failed to list repository root {path}: {source}")]
    ListRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read ignore file {path}: {source}")]
    ReadIgnoreFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One line of an ignore file with its modifiers parsed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePattern {
    raw: String,
    glob: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
}

impl IgnorePattern {
    /// Parse the literal modifiers of a raw pattern.
    ///
    /// Order matters: `!` is stripped first, then a trailing `/`, then a
    /// leading `/`.
    pub fn parse(raw: &str) -> Self {
        let mut glob = raw;

        let negated = glob.starts_with('!');
        if negated {
            glob = &glob[1..];
        }

        let dir_only = glob.ends_with('/');
        if dir_only {
            glob = &glob[..glob.len() - 1];
        }

        let anchored = glob.starts_with('/');
        if anchored {
            glob = &glob[1..];
        }

        Self {
            raw: raw.to_string(),
            glob: glob.to_string(),
            negated,
            dir_only,
            anchored,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_negation(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether this pattern matches `relative_path`, ignoring negation.
    pub fn matches(&self, relative_path: &str, is_directory: bool) -> bool {
        if self.dir_only && !is_directory {
            return false;
        }

        let candidate = if self.anchored || self.glob.contains('/') {
            self.glob.clone()
        } else {
            format!("*{}*", self.glob)
        };

        compile(&candidate).is_some_and(|p| p.matches_with(relative_path, MATCH_OPTIONS))
    }
}

/// Compile a shell glob, falling back to a literal match when the pattern
/// is malformed.
fn compile(glob: &str) -> Option<Pattern> {
    // `glob` rejects `**` outside a whole path component; with `*` already
    // crossing separators a run of stars means the same as one.
    let collapsed = collapse_stars(glob);
    Pattern::new(&collapsed)
        .or_else(|_| Pattern::new(&literal_with_stars(&collapsed)))
        .ok()
}

fn collapse_stars(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len());
    let mut prev_star = false;
    for c in glob.chars() {
        if c == '*' && prev_star {
            continue;
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}

/// Escape everything except `*` so a broken class like `[abc` matches itself.
fn literal_with_stars(glob: &str) -> String {
    glob.split('*')
        .map(Pattern::escape)
        .collect::<Vec<_>>()
        .join("*")
}

/// Recursively list every regular file under `root`, relative to it.
///
/// Directories named `.git` are pruned and symlinks are not followed into
/// directories. Order is walk order. Subdirectories that cannot be read are
/// skipped with a warning.
pub fn enumerate_candidates(root: &Path) -> Result<Vec<String>, FilterError> {
    std::fs::read_dir(root).map_err(|source| FilterError::ListRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && e.file_name() == VCS_DIR));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable path during walk: {}", e);
                continue;
            }
        };

        if !is_listed_file(&entry) {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(to_slash(relative));
        }
    }

    Ok(files)
}

/// Regular files, plus symlinks whose target is a regular file.
fn is_listed_file(entry: &walkdir::DirEntry) -> bool {
    if entry.path_is_symlink() {
        return std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file());
    }
    entry.file_type().is_file()
}

/// Read `.gitignore` patterns from `root`, dropping blanks and comments.
pub fn load_ignore_patterns(root: &Path) -> Result<Vec<String>, FilterError> {
    if !ignore_file_present(root) {
        return Ok(Vec::new());
    }
    let path = root.join(IGNORE_FILE);

    let contents = std::fs::read_to_string(&path)
        .map_err(|source| FilterError::ReadIgnoreFile { path, source })?;

    Ok(parse_ignore_lines(&contents))
}

fn parse_ignore_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Decide whether `relative_path` is excluded by `patterns`.
///
/// Every pattern is evaluated in order and the last match decides: a plain
/// pattern excludes, a negated one re-includes. No match means included.
pub fn is_excluded(relative_path: &str, patterns: &[String], is_directory: bool) -> bool {
    let parsed: Vec<IgnorePattern> = patterns.iter().map(|p| IgnorePattern::parse(p)).collect();
    is_excluded_parsed(relative_path, &parsed, is_directory)
}

fn is_excluded_parsed(relative_path: &str, patterns: &[IgnorePattern], is_directory: bool) -> bool {
    let mut excluded = false;
    for pattern in patterns {
        if pattern.matches(relative_path, is_directory) {
            excluded = !pattern.is_negation();
        }
    }
    excluded
}

/// Files under `root` that belong in a generated prompt, in walk order.
///
/// Lock files are always dropped. When a `.gitignore` exists, excluded files
/// are dropped too.
pub fn filtered_files(root: &Path) -> Result<Vec<String>, FilterError> {
    let candidates = enumerate_candidates(root)?;
    let has_ignore_file = ignore_file_present(root);
    let patterns: Vec<IgnorePattern> = load_ignore_patterns(root)?
        .iter()
        .map(|p| IgnorePattern::parse(p))
        .collect();

    let kept: Vec<String> = candidates
        .into_iter()
        .filter(|path| !path.ends_with(LOCK_FILE_SUFFIX))
        .filter(|path| {
            !has_ignore_file || !is_excluded_parsed(path, &patterns, false)
        })
        .collect();

    tracing::debug!(
        "Path filter kept {} files under {} ({} patterns)",
        kept.len(),
        root.display(),
        patterns.len()
    );

    Ok(kept)
}

/// A dangling symlink still counts as present.
fn ignore_file_present(root: &Path) -> bool {
    std::fs::symlink_metadata(root.join(IGNORE_FILE)).is_ok()
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, rel).unwrap();
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    // ── pattern parsing ──────────────────────────────────────────────

    #[test]
    fn parse_strips_modifiers_in_order() {
        let p = IgnorePattern::parse("!/build/");
        assert!(p.is_negation());
        assert!(p.is_dir_only());
        assert!(p.is_anchored());
        assert_eq!(p.glob, "build");
        assert_eq!(p.raw(), "!/build/");
    }

    #[test]
    fn parse_plain_pattern_has_no_modifiers() {
        let p = IgnorePattern::parse("*.log");
        assert!(!p.is_negation());
        assert!(!p.is_dir_only());
        assert!(!p.is_anchored());
    }

    // ── is_excluded ─────────────────────────────────────────────────

    #[test]
    fn negation_reincludes_later() {
        let pats = patterns(&["*.log", "!keep.log"]);
        assert!(!is_excluded("keep.log", &pats, false));
        assert!(is_excluded("debug.log", &pats, false));
    }

    #[test]
    fn last_match_wins() {
        let pats = patterns(&["*.tmp", "!important.tmp", "*.tmp"]);
        assert!(is_excluded("important.tmp", &pats, false));
    }

    #[test]
    fn directory_only_pattern_skips_files() {
        let pats = patterns(&["build/"]);
        assert!(!is_excluded("build", &pats, false));
        assert!(is_excluded("build", &pats, true));
    }

    #[test]
    fn anchored_pattern_matches_only_at_root() {
        let pats = patterns(&["/config.json"]);
        assert!(is_excluded("config.json", &pats, false));
        assert!(!is_excluded("src/config.json", &pats, false));
    }

    #[test]
    fn slash_pattern_matches_full_path() {
        let pats = patterns(&["docs/*.md"]);
        assert!(is_excluded("docs/intro.md", &pats, false));
        assert!(!is_excluded("src/docs/intro.md", &pats, false));
    }

    #[test]
    fn bare_pattern_matches_anywhere() {
        let pats = patterns(&["node_modules"]);
        assert!(is_excluded("node_modules/pkg/index.js", &pats, false));
        assert!(is_excluded("web/node_modules/x.js", &pats, false));
        assert!(!is_excluded("src/main.rs", &pats, false));
    }

    #[test]
    fn bare_star_pattern_is_substring_glob() {
        let pats = patterns(&["*.pyc"]);
        assert!(is_excluded("pkg/__pycache__/mod.cpython-311.pyc", &pats, false));
        assert!(!is_excluded("pkg/mod.py", &pats, false));
    }

    #[test]
    fn question_mark_and_class_globs() {
        let pats = patterns(&["/file?.[ch]"]);
        assert!(is_excluded("file1.c", &pats, false));
        assert!(is_excluded("fileA.h", &pats, false));
        assert!(!is_excluded("file10.c", &pats, false));
        assert!(!is_excluded("file1.rs", &pats, false));
    }

    #[test]
    fn no_match_means_included() {
        assert!(!is_excluded("src/lib.rs", &patterns(&["*.log"]), false));
        assert!(!is_excluded("src/lib.rs", &[], false));
    }

    #[test]
    fn malformed_pattern_matches_literally() {
        let pats = patterns(&["[abc"]);
        assert!(is_excluded("notes/[abc].txt", &pats, false));
        assert!(!is_excluded("notes/a.txt", &pats, false));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let pats = patterns(&["*.LOG"]);
        assert!(!is_excluded("debug.log", &pats, false));
    }

    // ── load_ignore_patterns ────────────────────────────────────────

    #[test]
    fn load_patterns_drops_comments_and_blanks() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(IGNORE_FILE),
            "# comment\n\n  target/  \n*.log\n   # indented comment\n!keep.log\n",
        )
        .unwrap();

        let loaded = load_ignore_patterns(dir.path()).expect("load");
        assert_eq!(loaded, patterns(&["target/", "*.log", "!keep.log"]));
    }

    #[test]
    fn load_patterns_without_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_ignore_patterns(dir.path()).expect("load").is_empty());
    }

    #[test]
    fn unreadable_ignore_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the file should be cannot be read as text.
        fs::create_dir(dir.path().join(IGNORE_FILE)).unwrap();
        let err = load_ignore_patterns(dir.path()).unwrap_err();
        assert!(matches!(err, FilterError::ReadIgnoreFile { .. }));
    }

    // ── enumerate_candidates ────────────────────────────────────────

    #[test]
    fn enumerate_skips_git_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), ".git/HEAD");
        touch(dir.path(), ".git/objects/ab/cdef");
        touch(dir.path(), "vendor/lib/.git/config");
        touch(dir.path(), ".github/workflows/ci.yml");

        let files = sorted(enumerate_candidates(dir.path()).expect("enumerate"));
        assert_eq!(
            files,
            patterns(&[".github/workflows/ci.yml", "src/main.rs"])
        );
        assert!(files.iter().all(|f| !f.split('/').any(|c| c == VCS_DIR)));
    }

    #[cfg(unix)]
    #[test]
    fn enumerate_lists_symlinked_files_but_not_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "real/a.txt");
        std::os::unix::fs::symlink(dir.path().join("real/a.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linkdir")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let files = sorted(enumerate_candidates(dir.path()).expect("enumerate"));
        assert_eq!(files, patterns(&["link.txt", "real/a.txt"]));
    }

    #[cfg(unix)]
    #[test]
    fn enumerate_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "open/a.txt");
        touch(dir.path(), "locked/secret.txt");
        touch(dir.path(), "top.txt");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = enumerate_candidates(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root may still read the directory; either way the walk succeeds.
        let files = result.expect("enumerate");
        assert!(files.contains(&"open/a.txt".to_string()));
        assert!(files.contains(&"top.txt".to_string()));
    }

    #[test]
    fn enumerate_missing_root_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = enumerate_candidates(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, FilterError::ListRoot { .. }));
    }

    // ── filtered_files ──────────────────────────────────────────────

    #[test]
    fn without_ignore_file_only_lock_files_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "Cargo.toml");
        touch(dir.path(), "Cargo.lock");
        touch(dir.path(), "web/yarn.lock");
        touch(dir.path(), "debug.log");

        let files = sorted(filtered_files(dir.path()).expect("filter"));
        assert_eq!(files, patterns(&["Cargo.toml", "debug.log"]));
    }

    #[test]
    fn lock_files_drop_even_when_negated() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "Cargo.lock");
        touch(dir.path(), "src/lib.rs");
        fs::write(dir.path().join(IGNORE_FILE), "!Cargo.lock\n").unwrap();

        let files = sorted(filtered_files(dir.path()).expect("filter"));
        assert_eq!(files, patterns(&[IGNORE_FILE, "src/lib.rs"]));
    }

    #[test]
    fn ignore_file_rules_apply() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "config.json");
        touch(dir.path(), "src/config.json");
        touch(dir.path(), "debug.log");
        touch(dir.path(), "keep.log");
        touch(dir.path(), "build/out.bin");
        touch(dir.path(), "src/build.rs");
        fs::write(
            dir.path().join(IGNORE_FILE),
            "/config.json\n*.log\n!keep.log\nbuild/\n",
        )
        .unwrap();

        let files = sorted(filtered_files(dir.path()).expect("filter"));
        assert_eq!(
            files,
            patterns(&[
                IGNORE_FILE,
                "build/out.bin",
                "keep.log",
                "src/build.rs",
                "src/config.json"
            ])
        );
    }

    #[test]
    fn negated_path_reincludes_file_under_excluded_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "node_modules/keep.js");
        touch(dir.path(), "node_modules/drop.js");
        fs::write(dir.path().join(IGNORE_FILE), "node_modules\n!node_modules/keep.js\n").unwrap();

        let files = sorted(filtered_files(dir.path()).expect("filter"));
        assert_eq!(files, patterns(&[IGNORE_FILE, "node_modules/keep.js"]));
    }

    #[test]
    fn anchored_name_does_not_drop_files_below_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "docs/x.md");
        touch(dir.path(), "sub/docs/x.md");
        fs::write(dir.path().join(IGNORE_FILE), "/docs\n").unwrap();

        let files = sorted(filtered_files(dir.path()).expect("filter"));
        assert!(files.contains(&"docs/x.md".to_string()));
        assert!(files.contains(&"sub/docs/x.md".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_ignore_symlink_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "src/lib.rs");
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join(IGNORE_FILE))
            .unwrap();

        let err = load_ignore_patterns(dir.path()).unwrap_err();
        assert!(matches!(err, FilterError::ReadIgnoreFile { .. }));
        assert!(filtered_files(dir.path()).is_err());
    }

    #[test]
    fn filtered_files_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "a/b/c.txt");
        touch(dir.path(), "a/d.txt");
        touch(dir.path(), "e.txt");
        fs::write(dir.path().join(IGNORE_FILE), "d.txt\n").unwrap();

        let first = filtered_files(dir.path()).expect("filter");
        let second = filtered_files(dir.path()).expect("filter");
        assert_eq!(first, second);
    }

}
