//! GitHub REST implementation of the issue tracker.

mod client;

pub use client::{GitHubClient, GITHUB_API_URL};

use std::fmt;
use std::str::FromStr;

use crate::errors::TrackerError;

/// Repository coordinates in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(TrackerError::Config(format!(
                "invalid repository '{trimmed}', expected owner/repo"
            ))),
        }
    }
}

impl FromStr for RepoRef {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_parse_accepts_owner_repo_shape() {
        let repo = RepoRef::parse("5dlabs/spec-agent").unwrap();
        assert_eq!(repo.owner, "5dlabs");
        assert_eq!(repo.name, "spec-agent");
        assert_eq!(repo.to_string(), "5dlabs/spec-agent");
    }

    #[test]
    fn test_repo_ref_parse_rejects_other_shapes() {
        for raw in ["missing", "/repo", "owner/", "a/b/c"] {
            let err = RepoRef::parse(raw).unwrap_err();
            assert!(err.to_string().contains("expected owner/repo"), "{raw}");
        }
    }
}
