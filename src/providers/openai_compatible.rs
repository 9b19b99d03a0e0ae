use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use crate::prompt::BriefPrompt;
use crate::providers::{parse_brief_json, ProviderError};
use crate::traits::GenerationProvider;
use crate::types::GeneratedBrief;

/// Fallback generation provider speaking the OpenAI chat-completions wire
/// format (Groq in the default configuration).
pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    label: &'static str,
}

impl Drop for OpenAiCompatibleProvider {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// HTTPS is required for remote URLs to protect API keys in transit;
/// plain HTTP is allowed only for localhost model servers.
fn validate_base_url(base_url: &str) -> anyhow::Result<()> {
    let parsed = reqwest::Url::parse(base_url)
        .map_err(|e| anyhow::anyhow!("invalid base_url '{}': {}", base_url, e))?;
    let host = parsed.host_str().unwrap_or("");
    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_localhost =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
            if is_localhost {
                warn!(
                    "using unencrypted HTTP for local model server at '{}'",
                    base_url
                );
                Ok(())
            } else {
                anyhow::bail!(
                    "HTTP is not allowed for remote URLs (base_url: '{}'); use HTTPS",
                    base_url
                )
            }
        }
        scheme => anyhow::bail!("unsupported URL scheme '{}' in base_url", scheme),
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        label: &'static str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        validate_base_url(base_url)?;
        Ok(Self {
            client: super::build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            label,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn generate(&self, prompt: &BriefPrompt) -> Result<GeneratedBrief, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7,
        });

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, provider = self.label, "calling chat-completions API");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("{} request failed: {}", self.label, e);
                ProviderError::network(&e)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, provider = self.label,
                   "provider API error: {}", crate::utils::truncate_str(&text, 300));
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        debug!("{} response: {}", self.label, crate::utils::truncate_str(&text, 2000));

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::malformed(format!("invalid response JSON: {}", e)))?;
        let content = data["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| ProviderError::malformed("no message content in response"))?;

        parse_brief_json(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_remote_http_base_url() {
        assert!(validate_base_url("http://api.example.com/v1").is_err());
        assert!(validate_base_url("https://api.groq.com/openai/v1").is_ok());
        assert!(validate_base_url("http://localhost:8000/v1").is_ok());
    }
}
