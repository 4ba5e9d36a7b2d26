//! Chat-completion provider implementations for TripCover.
//!
//! All providers implement the `tripcover_core::Provider` trait. Groq,
//! OpenAI and most self-hosted servers speak the same
//! `/chat/completions` wire format, so a single implementation covers them.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use tripcover_config::AppConfig;
use tripcover_core::Provider;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        &config.provider.name,
        &config.provider.api_url,
        config.api_key.clone().unwrap_or_default(),
    ))
}
