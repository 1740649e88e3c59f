//! `tree(1)`-style rendering of a directory, used in the agent's system
//! prompt and by `coder tree`.

use std::io;
use std::path::Path;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_PREFIX: &str = "│   ";
const SPACE_PREFIX: &str = "    ";

/// Options for [`render_tree`].
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Deepest level to descend into; `0` lists only the root's children.
    pub max_level: Option<usize>,
    /// Entry names to leave out (in addition to hidden entries).
    pub exclude: Vec<String>,
}

/// Render the tree rooted at `root`. The first line is `root` as given.
///
/// Directories that cannot be listed are rendered inline with an error
/// marker instead of aborting the whole tree.
pub fn render_tree(root: &Path, options: &TreeOptions) -> String {
    let mut lines = vec![root.display().to_string()];
    render_children(root, "", 0, options, &mut lines);
    lines.join("\n")
}

fn render_children(
    dir: &Path,
    prefix: &str,
    level: usize,
    options: &TreeOptions,
    lines: &mut Vec<String>,
) {
    if options.max_level.is_some_and(|max| level > max) {
        return;
    }

    let entries = match list_entries(dir, &options.exclude) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot list {}: {}", dir.display(), e);
            if let Some(last) = lines.last_mut() {
                last.push_str(&error_marker(&e));
            }
            return;
        }
    };

    let count = entries.len();
    for (i, (name, is_dir)) in entries.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { LAST_BRANCH } else { BRANCH };
        lines.push(format!("{}{}{}", prefix, connector, name));

        if is_dir {
            let child_prefix = format!("{}{}", prefix, if is_last { SPACE_PREFIX } else { PIPE_PREFIX });
            render_children(&dir.join(&name), &child_prefix, level + 1, options, lines);
        }
    }
}

/// Visible entries of `dir`, directories first, then by name.
fn list_entries(dir: &Path, exclude: &[String]) -> io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || exclude.iter().any(|e| e == &name) {
            continue;
        }
        // Follows symlinks, like `os.path.isdir`.
        let is_dir = entry.path().is_dir();
        entries.push((name, is_dir));
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}

fn error_marker(e: &io::Error) -> String {
    if e.kind() == io::ErrorKind::PermissionDenied {
        " [Permission Denied]".to_string()
    } else {
        format!(" [Error: {}]", e)
    }
}
