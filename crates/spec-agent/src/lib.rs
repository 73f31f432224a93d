//! GitHub issue-to-specification bot.
//!
//! This crate provides:
//! - Thread linearization and approval detection for an issue
//! - LLM-backed drafting and finalizing of technical specs (OpenAI, Anthropic)
//! - Publishing approved specs as a Markdown file on a feature branch with a PR
//! - A GitHub REST client with typed errors for the expected conditions

pub mod ai;
pub mod config;
pub mod errors;
pub mod github;
pub mod prompts;
pub mod target;
pub mod thread;
pub mod tracker;
pub mod workflow;

// Re-export main types
pub use config::AgentConfig;
pub use errors::{AiError, TrackerError, WorkflowError};
pub use github::{GitHubClient, RepoRef};
pub use target::{slugify, PublishTarget};
pub use thread::{Thread, ThreadState};
pub use tracker::{ActorType, IssueTracker};
pub use workflow::{FileChange, Outcome, SpecWorkflow, TriggerEvent, WorkflowSettings};
