//! Deterministic file path and branch name for a published spec.

use std::fmt;

/// Directory specs are published under unless configured otherwise.
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Where an approved spec lands: one file on one feature branch per issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Repository path of the Markdown file, e.g. `docs/007-fix-bug.md`.
    pub path: String,
    /// Feature branch, e.g. `feature/spec-7`.
    pub branch: String,
}

impl PublishTarget {
    /// Target under the default `docs` directory.
    pub fn for_issue(issue_number: u64, title: &str) -> Self {
        Self::in_dir(DEFAULT_DOCS_DIR, issue_number, title)
    }

    pub fn in_dir(docs_dir: &str, issue_number: u64, title: &str) -> Self {
        let docs_dir = docs_dir.trim_matches('/');
        let file_name = format!("{issue_number:03}-{}.md", slugify(title));
        let path = if docs_dir.is_empty() {
            file_name
        } else {
            format!("{docs_dir}/{file_name}")
        };

        Self {
            path,
            branch: format!("feature/spec-{issue_number}"),
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.path, self.branch)
    }
}

/// Turn an issue title into a file-name slug.
///
/// Trim, lowercase, spaces to hyphens, then drop everything outside
/// `[a-z0-9-]`. Hyphen runs are kept as-is.
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        .collect()
}
