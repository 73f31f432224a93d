//! Error types for the spec agent.

use thiserror::Error;

/// Errors returned by the issue tracker (GitHub REST API).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP transport failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The resource being created already exists.
    #[error("Already exists: {resource}")]
    AlreadyExists { resource: String },

    /// A revision token was stale (HTTP 409).
    #[error("Conflict on {resource}: {message}")]
    Conflict { resource: String, message: String },

    /// Credentials were rejected (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    /// Any other non-success response.
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TrackerError {
    /// True for the expected "create raced an existing resource" condition.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// True when the resource is known to be absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors returned by text-generation providers.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP transport failed.
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with an error payload.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider answered with something we could not read.
    #[error("Failed to parse {provider} response: {reason}")]
    Parse {
        provider: &'static str,
        reason: String,
    },

    /// The provider has no API key.
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    /// No registered provider can serve the model.
    #[error("No provider configured for model '{0}'")]
    UnsupportedModel(String),
}

/// Errors raised by the spec workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Ai(#[from] AiError),

    /// A prompt or comment template failed to render.
    #[error("Template error: {0}")]
    Template(String),
}

impl From<handlebars::RenderError> for WorkflowError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for WorkflowError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
pub type AiResult<T> = Result<T, AiError>;
pub type WorkflowResult<T> = Result<T, WorkflowError>;
