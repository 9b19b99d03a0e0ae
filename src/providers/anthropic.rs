use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use zeroize::Zeroize;

use crate::prompt::BriefPrompt;
use crate::providers::{parse_brief_json, ProviderError};
use crate::traits::GenerationProvider;
use crate::types::GeneratedBrief;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Primary generation provider: the Anthropic messages API.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Drop for AnthropicProvider {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, prompt: &BriefPrompt) -> Result<GeneratedBrief, ProviderError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 4096,
            "system": prompt.system,
            "messages": [{ "role": "user", "content": prompt.user }],
        });

        let url = format!("{}/messages", self.base_url);
        info!(model = %self.model, "calling Anthropic messages API");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic request failed: {}", e);
                ProviderError::network(&e)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, "Anthropic API error: {}", crate::utils::truncate_str(&text, 300));
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        debug!("Anthropic response: {}", crate::utils::truncate_str(&text, 2000));

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::malformed(format!("invalid response JSON: {}", e)))?;
        let content = data["content"]
            .get(0)
            .and_then(|block| block["text"].as_str())
            .ok_or_else(|| ProviderError::malformed("no text content block in response"))?;

        parse_brief_json(content)
    }
}
