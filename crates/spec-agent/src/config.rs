//! Run configuration.
//!
//! Every setting is a CLI flag with an environment fallback so the binary can
//! run unchanged from a GitHub Actions step:
//!
//! - `GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `ISSUE_NUMBER`, `ACTOR`, `ACTOR_TYPE`
//! - `OPENAI_API_KEY` and/or `ANTHROPIC_API_KEY`
//! - optional `SPEC_AGENT_*` overrides and `GITHUB_API_URL`

use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use crate::ai::openai::DEFAULT_MODEL;
use crate::ai::{AnthropicProvider, GenerateOptions, OpenAIProvider, ProviderRegistry};
use crate::errors::{AiResult, TrackerResult};
use crate::github::{GitHubClient, RepoRef, GITHUB_API_URL};
use crate::target::DEFAULT_DOCS_DIR;
use crate::tracker::ActorType;
use crate::workflow::{TriggerEvent, WorkflowSettings};

/// Default sampling temperature for spec generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Args)]
pub struct AgentConfig {
    /// Repository in owner/repo form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: RepoRef,

    /// Issue number the event belongs to
    #[arg(long, env = "ISSUE_NUMBER")]
    pub issue: u64,

    /// Login of the account that triggered the event
    #[arg(long, env = "ACTOR", default_value = "")]
    pub actor: String,

    /// Account type of the triggering actor ("User", "Bot", ...)
    #[arg(long, env = "ACTOR_TYPE", default_value = "User")]
    pub actor_type: ActorType,

    /// GitHub token with contents, pull-requests and issues write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Model used for drafting and finalizing; picks the provider
    #[arg(long, env = "SPEC_AGENT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "SPEC_AGENT_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    #[arg(long, env = "SPEC_AGENT_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// Branch to fork from and open the PR against (default: repository default branch)
    #[arg(long, env = "SPEC_AGENT_BASE_BRANCH")]
    pub base_branch: Option<String>,

    /// Repository directory specs are written to
    #[arg(long, env = "SPEC_AGENT_DOCS_DIR", default_value = DEFAULT_DOCS_DIR)]
    pub docs_dir: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API_URL)]
    pub github_api_url: String,

    /// Full chat completions URL (for proxies or Azure OpenAI)
    #[arg(long, env = "OPENAI_API_URL")]
    pub openai_url: Option<String>,

    /// Full messages API URL
    #[arg(long, env = "ANTHROPIC_API_URL")]
    pub anthropic_url: Option<String>,

    /// Per-request timeout for GitHub calls, in seconds
    #[arg(long, default_value_t = 60)]
    pub github_timeout_secs: u64,

    /// Per-request timeout for model calls, in seconds
    #[arg(long, default_value_t = 300)]
    pub model_timeout_secs: u64,
}

impl AgentConfig {
    pub fn trigger_event(&self) -> TriggerEvent {
        TriggerEvent {
            issue_number: self.issue,
            actor: self.actor.clone(),
            actor_type: self.actor_type.clone(),
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            model: self.model.clone(),
            options: GenerateOptions {
                temperature: Some(self.temperature),
                max_tokens: self.max_tokens,
            },
            base_branch: self
                .base_branch
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            docs_dir: self.docs_dir.clone(),
        }
    }

    pub fn github_client(&self) -> TrackerResult<GitHubClient> {
        GitHubClient::new(
            &self.github_api_url,
            &self.github_token,
            self.repo.clone(),
            Duration::from_secs(self.github_timeout_secs),
        )
    }

    /// Registry with every provider; unset keys leave a provider unconfigured.
    pub fn provider_registry(&self) -> AiResult<ProviderRegistry> {
        let timeout = Duration::from_secs(self.model_timeout_secs);
        let mut registry = ProviderRegistry::new();

        let mut openai = OpenAIProvider::new(non_empty(self.openai_api_key.as_deref()), timeout)?;
        if let Some(url) = &self.openai_url {
            openai = openai.with_base_url(url);
        }
        registry.register(Arc::new(openai));

        let mut anthropic =
            AnthropicProvider::new(non_empty(self.anthropic_api_key.as_deref()), timeout)?;
        if let Some(url) = &self.anthropic_url {
            anthropic = anthropic.with_base_url(url);
        }
        registry.register(Arc::new(anthropic));

        Ok(registry)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AgentConfig,
    }

    fn parse(args: &[&str]) -> AgentConfig {
        let mut argv = vec![
            "spec-agent",
            "--repo",
            "5dlabs/spec-agent",
            "--issue",
            "7",
            "--github-token",
            "ghp_test",
        ];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().config
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.repo.owner, "5dlabs");
        assert_eq!(config.actor_type, ActorType::User);

        let settings = config.workflow_settings();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.options.temperature, Some(0.7));
        assert_eq!(settings.docs_dir, "docs");
        assert!(settings.base_branch.is_none());
    }

    #[test]
    fn test_trigger_event_carries_actor() {
        let event = parse(&["--actor", "octocat", "--actor-type", "Bot"]).trigger_event();
        assert_eq!(event.issue_number, 7);
        assert_eq!(event.actor, "octocat");
        assert!(event.actor_type.is_bot());
    }

    #[test]
    fn test_blank_base_branch_means_default() {
        let settings = parse(&["--base-branch", "  "]).workflow_settings();
        assert!(settings.base_branch.is_none());

        let settings = parse(&["--base-branch", "develop"]).workflow_settings();
        assert_eq!(settings.base_branch.as_deref(), Some("develop"));
    }

    #[test]
    fn test_invalid_repo_is_rejected() {
        let result = TestCli::try_parse_from([
            "spec-agent",
            "--repo",
            "not-a-repo",
            "--issue",
            "1",
            "--github-token",
            "t",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_registry_uses_keys() {
        let registry = parse(&["--openai-api-key", "sk-test", "--anthropic-api-key", " "])
            .provider_registry()
            .unwrap();
        assert!(registry.get("openai").unwrap().is_configured());
        assert!(!registry.get("anthropic").unwrap().is_configured());
    }
}
