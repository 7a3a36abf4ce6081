use std::fmt;

use crate::error::AiError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Clauses prescreened below this score skip detailed analysis.
pub const DEFAULT_PRESCREEN_THRESHOLD: u8 = 40;
/// Detailed analysis calls in flight at once.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Characters of each clause shown to the prescreener.
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// Credentials, model selection and pipeline tuning.
///
/// Passed explicitly to [`crate::OpenAiClient`] and [`crate::ContractAnalyzer`];
/// nothing in this crate reads the environment except [`AnalyzerConfig::from_env`].
#[derive(Clone)]
pub struct AnalyzerConfig {
    pub api_key: String,
    pub model: String,
    /// Chat-completions API root, e.g. `https://api.openai.com/v1` (no trailing slash).
    pub base_url: String,
    pub prescreen_threshold: u8,
    pub batch_size: usize,
    pub excerpt_chars: usize,
}

impl AnalyzerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            prescreen_threshold: DEFAULT_PRESCREEN_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    /// Read `OPENAI_API_KEY`, `AI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, AiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AiError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup("AI_MODEL").filter(|m| !m.trim().is_empty()) {
            config = config.with_model(model);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_prescreen_threshold(mut self, threshold: u8) -> Self {
        self.prescreen_threshold = threshold;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    /// Check the configuration before any model call is made.
    pub fn validate(&self) -> Result<(), AiError> {
        if self.api_key.trim().is_empty() {
            return Err(AiError::Config("API key is empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(AiError::Config("model name is empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(AiError::Config("batch size must be at least 1".to_string()));
        }
        if self.prescreen_threshold > 100 {
            return Err(AiError::Config(format!(
                "prescreen threshold {} is outside 0-100",
                self.prescreen_threshold
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("prescreen_threshold", &self.prescreen_threshold)
            .field("batch_size", &self.batch_size)
            .field("excerpt_chars", &self.excerpt_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = AnalyzerConfig::new("sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.prescreen_threshold, 40);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.excerpt_chars, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = AnalyzerConfig::from_lookup(lookup(&[("AI_MODEL", "gpt-4o")])).unwrap_err();
        assert!(matches!(err, AiError::Config(_)));

        let err = AnalyzerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, AiError::Config(_)));
    }

    #[test]
    fn env_overrides_model_and_url() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AI_MODEL", "gpt-4-turbo-preview"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1/"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gpt-4-turbo-preview");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn validate_rejects_bad_tuning() {
        assert!(AnalyzerConfig::new("k").with_batch_size(0).validate().is_err());
        assert!(
            AnalyzerConfig::new("k")
                .with_prescreen_threshold(101)
                .validate()
                .is_err()
        );
        assert!(AnalyzerConfig::new("").validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", AnalyzerConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
    }
}
