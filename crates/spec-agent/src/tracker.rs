//! Issue tracker capability used by the workflow.
//!
//! The workflow only talks to the repository host through [`IssueTracker`].
//! [`crate::github::GitHubClient`] is the production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerResult;

/// Account type of an issue participant, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActorType {
    User,
    Bot,
    Other(String),
}

impl ActorType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "User" => Self::User,
            "Bot" => Self::Bot,
            other => Self::Other(other.to_string()),
        }
    }

    /// Automated accounts never count as requesters and never trigger the bot.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot)
    }
}

impl std::str::FromStr for ActorType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ActorType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ActorType> for String {
    fn from(actor: ActorType) -> Self {
        actor.to_string()
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Bot => write!(f, "Bot"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Issue or comment author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    #[serde(rename = "type")]
    pub actor_type: ActorType,
}

/// An issue with the fields the workflow reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// One comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub user: Author,
    pub created_at: DateTime<Utc>,
}

/// A comment the tracker accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedComment {
    pub id: u64,
}

/// An existing file on a branch, reduced to the revision token an update must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub sha: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// An opened pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Read/write operations against the repository host for one repository.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Name of the repository's default branch.
    async fn default_branch(&self) -> TrackerResult<String>;

    async fn get_issue(&self, number: u64) -> TrackerResult<Issue>;

    /// All comments on an issue, oldest first.
    async fn list_comments(&self, number: u64) -> TrackerResult<Vec<IssueComment>>;

    async fn create_comment(&self, number: u64, body: &str) -> TrackerResult<PostedComment>;

    /// Commit SHA the branch currently points at.
    async fn branch_head(&self, branch: &str) -> TrackerResult<String>;

    /// Create `branch` at `sha`. Fails with `TrackerError::AlreadyExists` if it exists.
    async fn create_branch(&self, branch: &str, sha: &str) -> TrackerResult<()>;

    /// Read a file on a branch; `Ok(None)` means the host reported it absent.
    async fn get_file(&self, path: &str, branch: &str) -> TrackerResult<Option<RepoFile>>;

    async fn create_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
    ) -> TrackerResult<()>;

    /// Replace a file; `sha` is the revision token from [`IssueTracker::get_file`].
    async fn update_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        sha: &str,
    ) -> TrackerResult<()>;

    async fn create_pull_request(&self, request: &NewPullRequest) -> TrackerResult<PullRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_parse() {
        assert_eq!(ActorType::parse("Bot"), ActorType::Bot);
        assert_eq!(ActorType::parse("User"), ActorType::User);
        assert_eq!(
            ActorType::parse("Organization"),
            ActorType::Other("Organization".to_string())
        );
        assert!(ActorType::parse(" Bot ").is_bot());
        assert!(!ActorType::parse("bot").is_bot());
    }

    #[test]
    fn test_comment_deserializes_github_shape() {
        let comment: IssueComment = serde_json::from_value(serde_json::json!({
            "id": 11,
            "body": null,
            "user": { "login": "github-actions[bot]", "type": "Bot" },
            "created_at": "2026-01-01T00:00:01Z"
        }))
        .unwrap();

        assert!(comment.user.actor_type.is_bot());
        assert!(comment.body.is_none());
    }
}
