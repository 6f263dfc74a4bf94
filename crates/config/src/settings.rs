//! Settings loader
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML
//! file, then environment variables with the `SHOP_AGENT_` prefix
//! (`SHOP_AGENT_ENGINE__MAX_RETRIES=5`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::lexicon::Lexicon;
use crate::ConfigError;

/// Complete engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub lexicon: Lexicon,
    /// Collaborator endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

/// Collaborator endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Catalog REST base URL
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Classifier/renderer chat endpoint base URL
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,
    /// Model name for the classifier/renderer
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional API key for the catalog service
    #[serde(default)]
    pub catalog_api_key: Option<String>,
}

fn default_catalog_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_classifier_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            classifier_url: default_classifier_url(),
            model: default_model(),
            catalog_api_key: None,
        }
    }
}

/// Load settings from an optional file plus the environment
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("SHOP_AGENT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Settings>()?;

    tracing::debug!(
        catalog_url = %settings.endpoints.catalog_url,
        model = %settings.endpoints.model,
        "settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let settings = load_settings(None).unwrap();
        assert_eq!(settings.engine.candidate_cap, 10);
        assert!(!settings.lexicon.stop_words.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[engine]\nmax_retries = 7\n[endpoints]\ncatalog_url = \"http://shop.test\""
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.engine.max_retries, 7);
        assert_eq!(settings.endpoints.catalog_url, "http://shop.test");
        // untouched sections keep defaults
        assert_eq!(settings.engine.candidate_cap, 10);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/shop-agent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
