//! Text generation providers.
//!
//! This module provides:
//! - The [`AIProvider`] trait the workflow generates through
//! - OpenAI and Anthropic implementations
//! - A registry that picks a provider by model name

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;
pub use provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};
pub use registry::ProviderRegistry;
