//! ABOUTME: ModelSpecifier for parsing provider/model syntax
//! ABOUTME: Handles "provider/model", "model", and base URL override parsing

use orch_core::OrchError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Specification for a model with optional provider and base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpecifier {
    /// The provider name (e.g., "anthropic", "openai")
    pub provider: Option<String>,
    /// The model name (e.g., "claude-opus-4", "gpt-4")
    pub model: String,
    /// Optional base URL override
    pub base_url: Option<String>,
}

impl ModelSpecifier {
    /// Create a new ModelSpecifier with just a model name
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: model.into(),
            base_url: None,
        }
    }

    /// Create a new ModelSpecifier with provider and model
    pub fn with_provider(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            model: model.into(),
            base_url: None,
        }
    }

    /// Create a new ModelSpecifier with provider, model, and base URL
    pub fn with_base_url(
        provider: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            model: model.into(),
            base_url: Some(base_url.into()),
        }
    }

    /// Parse a model specification string
    ///
    /// Supported formats:
    /// - "model" -> ModelSpecifier { provider: None, model: "model", base_url: None }
    /// - "provider/model" -> ModelSpecifier { provider: Some("provider"), model: "model", base_url: None }
    /// - "provider/subprovider/model" -> ModelSpecifier { provider: Some("provider/subprovider"), model: "model", base_url: None }
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use orch_providers::ModelSpecifier;
    /// let spec = ModelSpecifier::parse("claude-opus-4").unwrap();
    /// assert_eq!(spec.model, "claude-opus-4");
    /// assert_eq!(spec.provider, None);
    ///
    /// let spec = ModelSpecifier::parse("anthropic/claude-opus-4").unwrap();
    /// assert_eq!(spec.model, "claude-opus-4");
    /// assert_eq!(spec.provider, Some("anthropic".to_string()));
    ///
    /// let spec = ModelSpecifier::parse("openrouter/deepseek/model").unwrap();
    /// assert_eq!(spec.model, "model");
    /// assert_eq!(spec.provider, Some("openrouter/deepseek".to_string()));
    /// ```
    pub fn parse(spec: &str) -> Result<Self, OrchError> {
        let spec = spec.trim();

        if spec.is_empty() {
            return Err(OrchError::Configuration {
                message: "model specification cannot be empty".to_string(),
            });
        }

        let parts: Vec<&str> = spec.split('/').collect();

        match parts.len() {
            1 => Ok(Self::new(parts[0])),
            2 => Ok(Self::with_provider(parts[0], parts[1])),
            n if n > 2 => {
                let provider = parts[..n - 1].join("/");
                let model = parts[n - 1];
                Ok(Self::with_provider(provider, model))
            }
            _ => Err(OrchError::Configuration {
                message: format!("invalid model specification format: '{spec}'"),
            }),
        }
    }

    /// Parse a model specification with an optional base URL override
    pub fn parse_with_base_url(spec: &str, base_url: Option<&str>) -> Result<Self, OrchError> {
        let mut model_spec = Self::parse(spec)?;
        model_spec.base_url = base_url.map(|url| url.to_string());
        Ok(model_spec)
    }

    /// Get the provider name, or return a default
    pub fn provider_or_default<'a>(&'a self, default: &'a str) -> &'a str {
        self.provider.as_deref().unwrap_or(default)
    }

    /// Check if this specifier has a provider
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Check if this specifier has a base URL override
    pub fn has_base_url(&self) -> bool {
        self.base_url.is_some()
    }
}

impl FromStr for ModelSpecifier {
    type Err = OrchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ModelSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "{}/{}", provider, self.model),
            None => write!(f, "{}", self.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_only() {
        let spec = ModelSpecifier::parse("claude-opus-4").unwrap();
        assert_eq!(spec.model, "claude-opus-4");
        assert_eq!(spec.provider, None);
        assert_eq!(spec.base_url, None);
        assert!(!spec.has_provider());
        assert!(!spec.has_base_url());
    }

    #[test]
    fn test_parse_provider_model() {
        let spec = ModelSpecifier::parse("anthropic/claude-opus-4").unwrap();
        assert_eq!(spec.model, "claude-opus-4");
        assert_eq!(spec.provider, Some("anthropic".to_string()));
        assert!(spec.has_provider());
    }

    #[test]
    fn test_parse_nested_provider() {
        let spec = ModelSpecifier::parse("openrouter/deepseek/model").unwrap();
        assert_eq!(spec.model, "model");
        assert_eq!(spec.provider, Some("openrouter/deepseek".to_string()));
    }

    #[test]
    fn test_parse_empty_string() {
        let result = ModelSpecifier::parse("");
        match result {
            Err(OrchError::Configuration { message }) => assert!(message.contains("empty")),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_whitespace_only() {
        assert!(ModelSpecifier::parse("   ").is_err());
    }

    #[test]
    fn test_parse_with_base_url() {
        let spec = ModelSpecifier::parse_with_base_url(
            "anthropic/claude-opus-4",
            Some("https://api.custom.com/v1"),
        )
        .unwrap();

        assert_eq!(spec.model, "claude-opus-4");
        assert_eq!(spec.provider, Some("anthropic".to_string()));
        assert_eq!(
            spec.base_url,
            Some("https://api.custom.com/v1".to_string())
        );
        assert!(spec.has_base_url());
    }

    #[test]
    fn test_provider_or_default() {
        let spec1 = ModelSpecifier::new("claude-opus-4");
        assert_eq!(spec1.provider_or_default("anthropic"), "anthropic");

        let spec2 = ModelSpecifier::with_provider("openai", "gpt-4");
        assert_eq!(spec2.provider_or_default("anthropic"), "openai");
    }

    #[test]
    fn test_display_trait() {
        let spec = ModelSpecifier::with_provider("openai", "gpt-4");
        assert_eq!(format!("{spec}"), "openai/gpt-4");

        let spec = ModelSpecifier::new("gpt-4");
        assert_eq!(format!("{spec}"), "gpt-4");
    }

    #[test]
    fn test_from_str_trait() {
        let spec: ModelSpecifier = "openai/gpt-4".parse().unwrap();
        assert_eq!(spec.model, "gpt-4");
        assert_eq!(spec.provider, Some("openai".to_string()));
    }

    #[test]
    fn test_serde_roundtrip() {
        let spec = ModelSpecifier::with_base_url("openai", "gpt-4", "https://api.custom.com");
        let serialized = serde_json::to_string(&spec).unwrap();
        let deserialized: ModelSpecifier = serde_json::from_str(&serialized).unwrap();
        assert_eq!(spec, deserialized);
    }
}
