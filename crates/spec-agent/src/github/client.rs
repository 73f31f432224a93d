//! GitHub REST API client.
//!
//! Every non-success response is classified into a [`TrackerError`] variant so
//! callers can tell an expected condition (missing file, existing branch)
//! apart from a transient or authorization failure.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{TrackerError, TrackerResult};
use crate::tracker::{
    Issue, IssueComment, IssueTracker, NewPullRequest, PostedComment, PullRequest, RepoFile,
};

use super::RepoRef;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

/// GitHub API client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GitHubFieldError>,
}

#[derive(Debug, Deserialize)]
struct GitHubFieldError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

impl GitHubClient {
    /// Create a client for `repo` against `api_base` (e.g. [`GITHUB_API_URL`]).
    pub fn new(
        api_base: &str,
        token: &str,
        repo: RepoRef,
        timeout: Duration,
    ) -> TrackerResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("spec-agent/1.0"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| TrackerError::Config("invalid GitHub token".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    /// Contents API URL for a repository path, one encoded segment at a time.
    fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("/contents/{}", encode_path(path)))
    }

    /// Turn a non-success response into a classified error.
    async fn check(response: Response, resource: &str) -> TrackerResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        Err(match status {
            StatusCode::NOT_FOUND => TrackerError::NotFound {
                resource: resource.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                TrackerError::Unauthorized { message }
            }
            StatusCode::CONFLICT => TrackerError::Conflict {
                resource: resource.to_string(),
                message,
            },
            _ => TrackerError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> TrackerResult<T> {
        response.json().await.map_err(|e| TrackerError::Decode {
            what: what.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> TrackerResult<T> {
        let response = self.http.get(url).send().await?;
        let response = Self::check(response, resource).await?;
        Self::decode(response, resource).await
    }

    async fn put_content(&self, path: &str, request: &PutContentRequest<'_>) -> TrackerResult<()> {
        let resource = format!("file {path}");
        let response = self
            .http
            .put(self.contents_url(path))
            .json(request)
            .send()
            .await?;
        Self::check(response, &resource).await?;
        Ok(())
    }
}

/// Build a readable reason from a GitHub error body.
///
/// GitHub puts the useful part of validation failures in `errors[].message`
/// ("A pull request already exists for ..."), so those are appended.
fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<GitHubErrorBody>(body) else {
        return body.trim().to_string();
    };

    let details: Vec<String> = parsed
        .errors
        .into_iter()
        .filter_map(|e| e.message)
        .collect();

    if details.is_empty() {
        parsed.message
    } else {
        format!("{}: {}", parsed.message, details.join("; "))
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl IssueTracker for GitHubClient {
    #[instrument(skip(self))]
    async fn default_branch(&self) -> TrackerResult<String> {
        let info: RepositoryInfo = self
            .get_json(&self.repo_url(""), &format!("repository {}", self.repo))
            .await?;
        Ok(info.default_branch)
    }

    #[instrument(skip(self))]
    async fn get_issue(&self, number: u64) -> TrackerResult<Issue> {
        self.get_json(
            &self.repo_url(&format!("/issues/{number}")),
            &format!("issue #{number}"),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, number: u64) -> TrackerResult<Vec<IssueComment>> {
        let url = self.repo_url(&format!("/issues/{number}/comments"));
        let resource = format!("comments on issue #{number}");
        let mut comments = Vec::new();
        let mut page = 1_u32;

        loop {
            let response = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await?;
            let response = Self::check(response, &resource).await?;
            let chunk: Vec<IssueComment> = Self::decode(response, &resource).await?;

            let chunk_len = chunk.len();
            comments.extend(chunk);
            if chunk_len < PER_PAGE {
                break;
            }
            page = page.saturating_add(1);
        }

        debug!(count = comments.len(), "Fetched issue comments");
        Ok(comments)
    }

    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn create_comment(&self, number: u64, body: &str) -> TrackerResult<PostedComment> {
        let resource = format!("issue #{number}");
        let response = self
            .http
            .post(self.repo_url(&format!("/issues/{number}/comments")))
            .json(&CreateCommentRequest { body })
            .send()
            .await?;
        let response = Self::check(response, &resource).await?;
        Self::decode(response, "created comment").await
    }

    #[instrument(skip(self))]
    async fn branch_head(&self, branch: &str) -> TrackerResult<String> {
        let git_ref: GitRef = self
            .get_json(
                &self.repo_url(&format!("/git/ref/heads/{branch}")),
                &format!("branch {branch}"),
            )
            .await?;
        Ok(git_ref.object.sha)
    }

    #[instrument(skip(self))]
    async fn create_branch(&self, branch: &str, sha: &str) -> TrackerResult<()> {
        let resource = format!("branch {branch}");
        let response = self
            .http
            .post(self.repo_url("/git/refs"))
            .json(&CreateRefRequest {
                ref_name: format!("refs/heads/{branch}"),
                sha,
            })
            .send()
            .await?;

        match Self::check(response, &resource).await {
            Ok(_) => Ok(()),
            Err(TrackerError::Api {
                status: 422,
                message,
            }) if message.to_lowercase().contains("already exists") => {
                Err(TrackerError::AlreadyExists { resource })
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn get_file(&self, path: &str, branch: &str) -> TrackerResult<Option<RepoFile>> {
        let resource = format!("file {path}");
        let response = self
            .http
            .get(self.contents_url(path))
            .query(&[("ref", branch)])
            .send()
            .await?;

        match Self::check(response, &resource).await {
            Ok(response) => {
                let item: ContentItem = Self::decode(response, &resource).await?;
                Ok(Some(RepoFile { sha: item.sha }))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, content))]
    async fn create_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
    ) -> TrackerResult<()> {
        let request = PutContentRequest {
            message,
            content: STANDARD.encode(content),
            branch,
            sha: None,
        };
        self.put_content(path, &request).await
    }

    #[instrument(skip(self, content))]
    async fn update_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        sha: &str,
    ) -> TrackerResult<()> {
        let request = PutContentRequest {
            message,
            content: STANDARD.encode(content),
            branch,
            sha: Some(sha),
        };
        self.put_content(path, &request).await
    }

    #[instrument(skip(self, request), fields(head = %request.head, base = %request.base))]
    async fn create_pull_request(&self, request: &NewPullRequest) -> TrackerResult<PullRequest> {
        let response = self
            .http
            .post(self.repo_url("/pulls"))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response, "pull request").await?;
        Self::decode(response, "pull request").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_appends_field_errors() {
        let body = r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","code":"custom","message":"A pull request already exists for o:feature/spec-7."}]}"#;
        assert_eq!(
            error_message(body),
            "Validation Failed: A pull request already exists for o:feature/spec-7."
        );
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("  upstream exploded \n"), "upstream exploded");
        assert_eq!(error_message(r#"{"message":"Not Found"}"#), "Not Found");
    }

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("docs/007-fix-bug.md"), "docs/007-fix-bug.md");
        assert_eq!(
            encode_path("my specs/v2?#/007-x.md"),
            "my%20specs/v2%3F%23/007-x.md"
        );
    }
}
