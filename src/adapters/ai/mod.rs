//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! - `GeminiProvider` - Google Gemini `generateContent`
//! - `OpenAIProvider` - OpenAI and OpenAI-compatible chat completions
//! - `MockAIProvider` - Scripted oracle for tests and local runs

mod gemini_provider;
mod mock_provider;
mod openai_provider;
mod transport;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse, DEFAULT_MOCK_REPLY};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};

use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

use crate::config::{AiConfig, AiProvider};
use crate::ports::{AIError, AIProvider};

/// Builds the oracle selected by `config`.
pub fn oracle_from_config(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    match config.provider {
        AiProvider::Gemini => {
            let mut gemini = GeminiConfig::new(require_key(&config.gemini_api_key, "gemini")?)
                .with_timeout(config.timeout());
            if let Some(model) = &config.model {
                gemini = gemini.with_model(model.clone());
            }
            if let Some(url) = &config.base_url {
                gemini = gemini.with_base_url(url.clone());
            }
            Ok(Arc::new(GeminiProvider::new(gemini)?))
        }
        AiProvider::OpenAI => {
            let mut openai = OpenAIConfig::new(require_key(&config.openai_api_key, "openai")?)
                .with_timeout(config.timeout());
            if let Some(model) = &config.model {
                openai = openai.with_model(model.clone());
            }
            if let Some(url) = &config.base_url {
                openai = openai.with_base_url(url.clone());
            }
            Ok(Arc::new(OpenAIProvider::new(openai)?))
        }
        AiProvider::Mock => Ok(Arc::new(MockAIProvider::new())),
    }
}

fn require_key(key: &Option<Secret<String>>, provider: &str) -> Result<String, AIError> {
    key.as_ref()
        .map(|k| k.expose_secret().clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AIError::InvalidRequest(format!("no API key configured for {provider}")))
}
