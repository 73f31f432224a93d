//! Spec workflow orchestrator.
//!
//! One run handles one trigger event:
//!
//! 1. Bot actors are ignored outright (loop guard).
//! 2. The issue and its comments are linearized into a [`Thread`].
//! 3. If the last human reply is not `approved`, a refreshed draft is
//!    generated and posted as a comment.
//! 4. Otherwise the final document is generated and published: branch,
//!    file commit, pull request, and a comment with the result.
//!
//! No state is kept between runs; the thread is the only source of truth.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ai::{AIMessage, AIProvider, GenerateOptions};
use crate::errors::WorkflowResult;
use crate::prompts::PromptManager;
use crate::target::{PublishTarget, DEFAULT_DOCS_DIR};
use crate::thread::{Thread, ThreadState};
use crate::tracker::{ActorType, Issue, IssueTracker, NewPullRequest};

/// The event that triggered this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub issue_number: u64,
    pub actor: String,
    pub actor_type: ActorType,
}

/// Knobs for a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub model: String,
    pub options: GenerateOptions,
    /// Branch to fork from and target with the PR; `None` asks the host.
    pub base_branch: Option<String>,
    pub docs_dir: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            model: crate::ai::openai::DEFAULT_MODEL.to_string(),
            options: GenerateOptions {
                temperature: Some(0.7),
                max_tokens: None,
            },
            base_branch: None,
            docs_dir: DEFAULT_DOCS_DIR.to_string(),
        }
    }
}

/// Whether the spec file was created or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Created,
    Updated,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The actor was a bot; nothing was read or written.
    Skipped { actor: String },
    /// A draft was posted as a comment.
    Drafted { comment_id: u64 },
    /// The spec was committed and a pull request opened.
    Published {
        target: PublishTarget,
        file: FileChange,
        branch_created: bool,
        pr_url: String,
    },
    /// The spec was committed but the pull request could not be opened; the
    /// reason was posted on the issue.
    PublishFailed {
        target: PublishTarget,
        file: FileChange,
        reason: String,
    },
}

/// Drives one issue through drafting or publishing.
pub struct SpecWorkflow {
    tracker: Arc<dyn IssueTracker>,
    provider: Arc<dyn AIProvider>,
    prompts: PromptManager,
    settings: WorkflowSettings,
}

impl SpecWorkflow {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        provider: Arc<dyn AIProvider>,
        settings: WorkflowSettings,
    ) -> WorkflowResult<Self> {
        Ok(Self {
            tracker,
            provider,
            prompts: PromptManager::new()?,
            settings,
        })
    }

    /// Process one trigger event.
    pub async fn run(&self, event: &TriggerEvent) -> WorkflowResult<Outcome> {
        if event.actor_type.is_bot() {
            info!(actor = %event.actor, "Skipping event triggered by a bot");
            return Ok(Outcome::Skipped {
                actor: event.actor.clone(),
            });
        }

        let issue = self.tracker.get_issue(event.issue_number).await?;
        let comments = self.tracker.list_comments(event.issue_number).await?;
        let thread = Thread::from_issue(&issue, &comments);

        let state = thread.state();
        info!(
            issue = issue.number,
            actor = %event.actor,
            exchanges = thread.len(),
            ?state,
            "Classified issue thread"
        );

        match state {
            ThreadState::AwaitingFeedback => self.draft(&issue, &thread).await,
            ThreadState::Approved => self.publish(&issue, &thread).await,
        }
    }

    /// Generate over persona + thread + instruction.
    async fn generate(&self, thread: &Thread, instruction: String) -> WorkflowResult<String> {
        let mut messages = Vec::with_capacity(thread.len() + 2);
        messages.push(AIMessage::system(self.prompts.system_persona()?));
        messages.extend(thread.to_messages());
        messages.push(AIMessage::system(instruction));

        let response = self
            .provider
            .generate_text(&self.settings.model, &messages, &self.settings.options)
            .await?;

        info!(
            provider = %response.provider,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Generated text"
        );

        Ok(response.text)
    }

    async fn draft(&self, issue: &Issue, thread: &Thread) -> WorkflowResult<Outcome> {
        info!(issue = issue.number, "Drafting specification");

        let draft = self
            .generate(thread, self.prompts.draft_instruction()?)
            .await?;
        let comment = self.tracker.create_comment(issue.number, &draft).await?;

        info!(issue = issue.number, comment_id = comment.id, "Posted draft");
        Ok(Outcome::Drafted {
            comment_id: comment.id,
        })
    }

    async fn publish(&self, issue: &Issue, thread: &Thread) -> WorkflowResult<Outcome> {
        info!(issue = issue.number, "Specification approved, publishing");

        let document = self
            .generate(thread, self.prompts.final_instruction()?)
            .await?;

        let target = PublishTarget::in_dir(&self.settings.docs_dir, issue.number, &issue.title);
        let base = match &self.settings.base_branch {
            Some(branch) => branch.clone(),
            None => self.tracker.default_branch().await?,
        };
        debug!(publish_target = %target, base = %base, "Resolved publish target");

        let branch_created = self.ensure_branch(&target, &base).await?;
        let file = self.write_document(issue, &target, &document).await?;

        let request = NewPullRequest {
            title: self.prompts.pr_title(&issue.title)?,
            body: self.prompts.pr_body(issue.number)?,
            head: target.branch.clone(),
            base,
        };

        match self.tracker.create_pull_request(&request).await {
            Ok(pr) => {
                info!(
                    issue = issue.number,
                    pr = pr.number,
                    url = %pr.html_url,
                    "Opened pull request"
                );
                let comment = self.prompts.published_comment(&pr.html_url)?;
                self.tracker.create_comment(issue.number, &comment).await?;
                Ok(Outcome::Published {
                    target,
                    file,
                    branch_created,
                    pr_url: pr.html_url,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(issue = issue.number, error = %reason, "Failed to open pull request");
                let comment = self.prompts.pr_failed_comment(&reason)?;
                self.tracker.create_comment(issue.number, &comment).await?;
                Ok(Outcome::PublishFailed {
                    target,
                    file,
                    reason,
                })
            }
        }
    }

    /// Create the feature branch from `base`; an existing branch is reused.
    async fn ensure_branch(&self, target: &PublishTarget, base: &str) -> WorkflowResult<bool> {
        let sha = self.tracker.branch_head(base).await?;

        match self.tracker.create_branch(&target.branch, &sha).await {
            Ok(()) => {
                info!(branch = %target.branch, from = %base, sha = %sha, "Created branch");
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                warn!(branch = %target.branch, "Branch already exists, reusing it");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the document, updating in place when the file already exists.
    async fn write_document(
        &self,
        issue: &Issue,
        target: &PublishTarget,
        document: &str,
    ) -> WorkflowResult<FileChange> {
        let existing = self.tracker.get_file(&target.path, &target.branch).await?;

        let change = if let Some(file) = existing {
            let message = self.prompts.commit_message(true, issue.number)?;
            self.tracker
                .update_file(&target.path, &target.branch, &message, document, &file.sha)
                .await?;
            FileChange::Updated
        } else {
            let message = self.prompts.commit_message(false, issue.number)?;
            self.tracker
                .create_file(&target.path, &target.branch, &message, document)
                .await?;
            FileChange::Created
        };

        info!(path = %target.path, branch = %target.branch, ?change, "Committed spec");
        Ok(change)
    }
}
