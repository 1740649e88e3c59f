//! Whole-repository prompt generation.
//!
//! Dumps every file the path filter keeps into an XML-ish block and wraps it
//! with instructions asking a stronger model to turn a problem statement into
//! a step-by-step prompt for a weaker one.

use std::io;
use std::path::Path;

use crate::path_filter::{filtered_files, FilterError};

/// Placeholder used for files that are not valid UTF-8.
pub const BINARY_PLACEHOLDER: &str = "[Binary file not shown]";

/// Read a file for inclusion in a prompt. Never fails: undecodable or
/// unreadable content becomes a placeholder.
pub fn read_file_content(root: &Path, relative_path: &str) -> String {
    match std::fs::read_to_string(root.join(relative_path)) {
        Ok(content) => content.trim().to_string(),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => BINARY_PLACEHOLDER.to_string(),
        Err(e) => format!("[Error reading file: {}]", e),
    }
}

/// Render `(path, content)` pairs for the given files.
pub fn render_files_block(root: &Path, files: &[String]) -> String {
    let mut result = String::new();
    for file_path in files {
        let content = read_file_content(root, file_path);
        result.push_str("  <file>\n");
        result.push_str(&format!("    <filepath>{}</filepath>\n", file_path));
        result.push_str(&format!("    <content>{}</content>\n", content));
        result.push_str("  </file>\n");
    }
    result
}

/// Build the full prompt for `problem` from the repository at `root`.
pub fn build_repository_prompt(root: &Path, problem: &str) -> Result<String, FilterError> {
    let files = filtered_files(root)?;
    tracing::info!("Building repository prompt from {} files", files.len());
    let files_block = render_files_block(root, &files);

    Ok(format!(
        r#"I am using you as a prompt generator. I've dumped the entire context of my code base, and I have a specific problem. Please come up with a proposal to my problem - including the code and general approach.

<files>
{files_block}
</files>

<problem>
{problem}
</problem>

Please make sure that you leave no details out, and follow my requirements specifically. I know what I am doing, and you can assume that there is a reason for my arbitrary requirements.

When generating the full prompt with all of the details, keep in mind that the model you are sending this to is not as intelligent as you. It is great at very specific instructions, so please stress that they are specific.

Come up with discrete steps such that the sub-llm i am passing this to can build intermediately; as to keep it on the rails. Make sure to stress that it stops for feedback at each discrete step."#,
        files_block = files_block,
        problem = problem.trim(),
    ))
}
