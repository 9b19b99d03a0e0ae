use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroize;

use crate::config::LinkedInConfig;
use crate::error::ProfileError;
use crate::traits::ProfileApi;

/// RapidAPI-hosted LinkedIn scraper client. The primary `profile` call gets
/// full error classification; the secondary endpoints are consumed
/// best-effort by the fetcher, so plain anyhow errors are enough there.
pub struct RapidApiLinkedIn {
    client: Client,
    base_url: String,
    host: String,
    api_key: String,
}

impl Drop for RapidApiLinkedIn {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl RapidApiLinkedIn {
    pub fn new(config: &LinkedInConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let host = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| anyhow::anyhow!("invalid linkedin base_url '{}'", config.base_url))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            host,
            api_key: config.api_key.clone(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header("x-rapidapi-host", &self.host)
            .header("x-rapidapi-key", &self.api_key)
            .send()
            .await
    }

    /// Shared shape for the best-effort URN-keyed endpoints.
    async fn get_secondary(&self, path: &str, urn: &str) -> anyhow::Result<Value> {
        let resp = self.get(path, &[("urn", urn), ("page", "1")]).await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(path, status = %status, "secondary profile endpoint returned non-success");
            anyhow::bail!("{} returned {}", path, status);
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ProfileApi for RapidApiLinkedIn {
    async fn profile(&self, username: &str) -> Result<Value, ProfileError> {
        let resp = self
            .get("/api/v1/user/profile", &[("username", username)])
            .await
            .map_err(|e| ProfileError::network(&e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProfileError::network(&e))?;
        if !status.is_success() {
            return Err(ProfileError::from_status(status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| ProfileError::other(format!("invalid profile response JSON: {}", e)))
    }

    async fn images(&self, urn: &str) -> anyhow::Result<Value> {
        self.get_secondary("/api/v1/user/images", urn).await
    }

    async fn posts(&self, urn: &str) -> anyhow::Result<Value> {
        self.get_secondary("/api/v1/user/posts", urn).await
    }

    async fn comments(&self, urn: &str) -> anyhow::Result<Value> {
        self.get_secondary("/api/v1/user/comments", urn).await
    }

    async fn reactions(&self, urn: &str) -> anyhow::Result<Value> {
        self.get_secondary("/api/v1/user/reactions", urn).await
    }

    async fn recommendations(&self, urn: &str) -> anyhow::Result<Value> {
        self.get_secondary("/api/v1/user/recommendations", urn).await
    }

    async fn contact_info(&self, urn: &str) -> anyhow::Result<Value> {
        let resp = self.get("/api/v1/user/contact-info", &[("urn", urn)]).await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(status = %status, "contact-info endpoint returned non-success");
            anyhow::bail!("contact-info returned {}", status);
        }
        Ok(resp.json().await?)
    }
}
