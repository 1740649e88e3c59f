//! Code search tool: recursive grep over a directory.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{required_str, resolve_path, Tool};

const MAX_MATCHES: usize = 200;

/// Search file contents for a pattern.
pub struct Grep;

#[async_trait]
impl Tool for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search for a regex pattern in files under a directory (recursive, with line numbers, binary files skipped). Use it to find functions, variables, or code patterns."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Pattern to search for (regex)"
                },
                "directory": {
                    "type": "string",
                    "description": "Directory to search in, relative to the workspace. Defaults to the workspace root."
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let pattern = required_str(&args, "pattern")?;
        let directory = args["directory"].as_str().unwrap_or(".");

        let search_path = match directory {
            "." | "" => workspace.to_path_buf(),
            dir => resolve_path(workspace, dir),
        };
        if !search_path.is_dir() {
            return Err(anyhow::anyhow!("'{}' is not a valid directory.", directory));
        }

        // Prefer ripgrep (rg) when available, fall back to grep
        let (program, mut cmd) = if which_exists("rg") {
            let mut c = Command::new("rg");
            c.args(["--line-number", "--no-heading", "--color=never", "--hidden", "--glob", "!.git"]);
            c.arg("--").arg(pattern).arg(&search_path);
            ("rg", c)
        } else {
            let mut c = Command::new("grep");
            c.args(["-r", "-n", "-I", "--exclude-dir=.git"]);
            c.arg("--").arg(pattern).arg(&search_path);
            ("grep", c)
        };

        tracing::info!("Running {} for '{}' in {}", program, pattern, search_path.display());

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to execute search: {}", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code().unwrap_or(-1);

        let workspace_prefix = format!("{}/", workspace.to_string_lossy().trim_end_matches('/'));
        Ok(format_report(
            &format!("{} {} {}", program, pattern, directory),
            code,
            &stdout,
            &stderr,
            &workspace_prefix,
        ))
    }
}

/// Build the tool result. Exit code 1 means "no matches" for both grep and rg.
fn format_report(command: &str, code: i32, stdout: &str, stderr: &str, strip_prefix: &str) -> String {
    let mut report = format!("Grep Command: {}\nReturn Code: {}\n", command, code);

    let mut lines: Vec<String> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(MAX_MATCHES + 1)
        .map(|l| l.strip_prefix(strip_prefix).unwrap_or(l).to_string())
        .collect();

    let truncated = lines.len() > MAX_MATCHES;
    lines.truncate(MAX_MATCHES);

    if lines.is_empty() {
        report.push_str("Results: No matches found.\n");
    } else {
        report.push_str(&format!("Results:\n{}\n", lines.join("\n")));
        if truncated {
            report.push_str(&format!("... (showing first {} matches)\n", MAX_MATCHES));
        }
    }

    let errors: Vec<&str> = stderr
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter(|l| {
            let denied = l.contains("Permission denied");
            if denied {
                tracing::debug!("Ignoring search stderr: {}", l);
            }
            !denied
        })
        .collect();
    if !errors.is_empty() {
        tracing::warn!("Search stderr: {}", errors.join("; "));
        report.push_str(&format!("STDERR:\n{}\n", errors.join("\n")));
    }

    report
}

/// Check if a command exists in PATH.
fn which_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_strips_workspace_prefix() {
        let report = format_report(
            "grep foo .",
            0,
            "/ws/src/a.rs:3:fn foo() {}\n/ws/b.rs:1:foo\n",
            "",
            "/ws/",
        );
        assert!(report.starts_with("Grep Command: grep foo .\nReturn Code: 0\n"));
        assert!(report.contains("Results:\nsrc/a.rs:3:fn foo() {}\nb.rs:1:foo\n"));
        assert!(!report.contains("STDERR"));
    }

    #[test]
    fn report_without_matches_drops_permission_noise() {
        let report = format_report(
            "grep foo .",
            1,
            "",
            "grep: /ws/secret: Permission denied\ngrep: bad regex\n",
            "/ws/",
        );
        assert!(report.contains("Results: No matches found.\n"));
        assert!(report.contains("STDERR:\ngrep: bad regex\n"));
        assert!(!report.contains("Permission denied"));
    }

    #[test]
    fn truncation_notice_only_past_the_cap() {
        let matches = |n: usize| -> String { (0..n).map(|i| format!("f.rs:{}:x\n", i)).collect() };

        let exact = format_report("grep x .", 0, &matches(MAX_MATCHES), "", "/ws/");
        assert!(!exact.contains("showing first"));
        assert!(exact.contains(&format!("f.rs:{}:x\n", MAX_MATCHES - 1)));

        let over = format_report("grep x .", 0, &matches(MAX_MATCHES + 1), "", "/ws/");
        assert!(over.contains(&format!("... (showing first {} matches)\n", MAX_MATCHES)));
        assert!(!over.contains(&format!("f.rs:{}:x\n", MAX_MATCHES)));
    }

    #[tokio::test]
    async fn finds_matches_in_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();

        let out = Grep
            .execute(json!({"pattern": "beta"}), dir.path())
            .await
            .unwrap();
        assert!(out.contains("Return Code: 0"));
        assert!(out.contains("src/lib.rs:2:fn beta() {}"));
    }

    #[tokio::test]
    async fn rejects_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Grep
            .execute(json!({"pattern": "x", "directory": "nope"}), dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'nope' is not a valid directory.");
    }
}
