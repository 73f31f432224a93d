//! spec-agent CLI - turns GitHub issue threads into approved spec PRs.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spec_agent::target::DEFAULT_DOCS_DIR;
use spec_agent::{AgentConfig, FileChange, Outcome, PublishTarget, SpecWorkflow};

/// spec-agent - Draft specs on issues and publish them once approved.
#[derive(Parser)]
#[command(name = "spec-agent")]
#[command(about = "GitHub issue-to-specification bot")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum Commands {
    /// Process one issue event (for workflow use)
    Run(AgentConfig),

    /// Print the file path and branch a spec would be published to
    Target {
        /// Issue number
        #[arg(long)]
        issue: u64,

        /// Issue title
        #[arg(long)]
        title: String,

        /// Repository directory specs are written to
        #[arg(long, default_value = DEFAULT_DOCS_DIR)]
        docs_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Run(config) => run(config).await,
        Commands::Target {
            issue,
            title,
            docs_dir,
        } => {
            let target = PublishTarget::in_dir(&docs_dir, issue, &title);
            println!("path:   {}", target.path);
            println!("branch: {}", target.branch);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("spec_agent=debug,info")
        } else {
            EnvFilter::new("spec_agent=info,warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run(config: AgentConfig) -> Result<()> {
    let event = config.trigger_event();
    tracing::info!(
        repo = %config.repo,
        issue = event.issue_number,
        actor = %event.actor,
        actor_type = %event.actor_type,
        model = %config.model,
        "Starting spec agent"
    );

    // Checked before any client is built so a bot event needs no credentials.
    if event.actor_type.is_bot() {
        println!("Skipping bot event from '{}'", event.actor);
        return Ok(());
    }

    let tracker = Arc::new(
        config
            .github_client()
            .context("Failed to create GitHub client")?,
    );
    let provider = config
        .provider_registry()
        .context("Failed to create model providers")?
        .require_for_model(&config.model)
        .context("No usable provider for the configured model")?;

    let workflow = SpecWorkflow::new(tracker, provider, config.workflow_settings())
        .context("Failed to load prompt templates")?;

    let outcome = workflow
        .run(&event)
        .await
        .with_context(|| format!("Spec workflow failed for issue #{}", event.issue_number))?;

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    let file_verb = |file: &FileChange| match file {
        FileChange::Created => "created",
        FileChange::Updated => "updated",
    };

    match outcome {
        Outcome::Skipped { actor } => println!("Skipping bot event from '{actor}'"),
        Outcome::Drafted { comment_id } => {
            println!("📝 Posted draft specification (comment {comment_id})");
        }
        Outcome::Published {
            target,
            file,
            branch_created,
            pr_url,
        } => {
            println!("✅ Specification published");
            println!(
                "   Branch: {} ({})",
                target.branch,
                if *branch_created { "created" } else { "reused" }
            );
            println!("   File: {} ({})", target.path, file_verb(file));
            println!("   Pull request: {pr_url}");
        }
        Outcome::PublishFailed {
            target,
            file,
            reason,
        } => {
            println!("⚠️ Specification committed but PR creation failed");
            println!("   File: {} ({})", target.path, file_verb(file));
            println!("   Reason: {reason}");
        }
    }
}
