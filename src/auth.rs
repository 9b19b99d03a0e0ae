//! Identity glue. Credential verification lives in an external provider;
//! this module only forwards bearer tokens to it and maps the answer onto a
//! local user record.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::config::IdentityConfig;
use crate::traits::{AuthIdentity, IdentityProvider};

/// Verifies bearer tokens against an OIDC-style userinfo endpoint.
pub struct HttpIdentityProvider {
    client: Client,
    userinfo_url: String,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            userinfo_url: config.userinfo_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, bearer: &str) -> anyhow::Result<Option<AuthIdentity>> {
        let resp = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(bearer)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !status.is_success() {
            warn!(status = %status, "identity provider returned unexpected status");
            anyhow::bail!("identity provider returned {}", status);
        }

        let body: Value = resp.json().await?;
        let subject = body
            .get("sub")
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let Some(subject) = subject else {
            anyhow::bail!("identity response missing subject");
        };
        Ok(Some(AuthIdentity {
            subject,
            email: body
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name: body.get("name").and_then(Value::as_str).map(str::to_string),
        }))
    }
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer tok_123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok_123"));

        headers.insert(AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
