//! Provider Registry - picks a text-generation provider for a model.

use std::sync::Arc;

use crate::errors::{AiError, AiResult};

use super::provider::AIProvider;

/// Ordered set of registered providers; the first one serving a model wins.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn AIProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(&mut self, provider: Arc<dyn AIProvider>) {
        self.providers.retain(|p| p.name() != provider.name());
        self.providers.push(provider);
    }

    /// Get a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AIProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Get a provider that supports a specific model.
    pub fn get_for_model(&self, model: &str) -> Option<Arc<dyn AIProvider>> {
        self.providers
            .iter()
            .find(|p| p.supports_model(model))
            .cloned()
    }

    /// Get the provider for a model, failing if none serves it or its key is missing.
    pub fn require_for_model(&self, model: &str) -> AiResult<Arc<dyn AIProvider>> {
        let provider = self
            .get_for_model(model)
            .ok_or_else(|| AiError::UnsupportedModel(model.to_string()))?;

        if !provider.is_configured() {
            return Err(AiError::MissingApiKey(provider.api_key_env_var()));
        }

        Ok(provider)
    }

    /// Get all registered provider names.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::{AnthropicProvider, OpenAIProvider};

    fn registry(openai_key: Option<&str>) -> ProviderRegistry {
        let timeout = Duration::from_secs(5);
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(
            OpenAIProvider::new(openai_key.map(str::to_string), timeout).unwrap(),
        ));
        registry.register(Arc::new(AnthropicProvider::new(None, timeout).unwrap()));
        registry
    }

    #[test]
    fn test_registry_creation() {
        let registry = ProviderRegistry::new();
        assert!(registry.provider_names().is_empty());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry(None);
        registry.register(Arc::new(
            OpenAIProvider::new(Some("k".into()), Duration::from_secs(5)).unwrap(),
        ));
        assert_eq!(registry.provider_names(), vec!["anthropic", "openai"]);
        assert!(registry.get("openai").unwrap().is_configured());
    }

    #[test]
    fn test_require_for_model() {
        let registry = registry(Some("sk-test"));
        assert_eq!(registry.require_for_model("gpt-4o").unwrap().name(), "openai");

        let err = registry.require_for_model("claude-3-haiku-20240307").err().unwrap();
        assert!(matches!(err, AiError::MissingApiKey("ANTHROPIC_API_KEY")));

        let err = registry.require_for_model("llama-3").err().unwrap();
        assert!(matches!(err, AiError::UnsupportedModel(ref m) if m == "llama-3"));
    }
}
