use crate::prompts::DEFAULT_MODEL;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub port: u16,
    pub preseed_default_example: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            port: 8080,
            preseed_default_example: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// First few characters of the key, safe to log.
    pub fn key_preview(&self) -> Option<String> {
        self.api_key.as_ref().map(|k| k.chars().take(6).collect())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: lookup("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            model: lookup("GEMINI_MODEL").filter(|m| !m.is_empty()).unwrap_or(defaults.model),
            port: lookup("PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
            preseed_default_example: lookup("PRESEED_DEFAULT_EXAMPLE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.preseed_default_example),
        }
    }
}
