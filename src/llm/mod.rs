//! Text-generation collaborator
//!
//! The synthesizer treats text generation as optional, slow and fallible.
//! Nothing in the orchestration path depends on a generator being present.

use crate::config::Settings;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod gemini;
pub use gemini::GeminiGenerator;

/// Trait for prompt → text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Build the configured generator, or `None` when no provider key is set.
pub fn from_settings(settings: &Settings) -> Result<Option<Arc<dyn TextGenerator>>> {
    match settings.gemini_api_key.as_deref() {
        Some(key) => {
            let generator = GeminiGenerator::new(key.to_string(), settings.gemini_model.clone())?
                .with_base_url(settings.gemini_base_url.clone());
            info!(
                model = %settings.gemini_model,
                base_url = %settings.gemini_base_url,
                "Text generation enabled"
            );
            Ok(Some(Arc::new(generator)))
        }
        None => {
            info!("No text generation key configured, synthesizer will use templates");
            Ok(None)
        }
    }
}
