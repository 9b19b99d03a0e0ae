//! Capability seams for external collaborators. Everything the pipeline
//! talks to over the network lives behind one of these traits so tests can
//! substitute scripted doubles.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProfileError;
use crate::prompt::BriefPrompt;
use crate::providers::ProviderError;
use crate::types::GeneratedBrief;

/// Raw profile provider endpoints. The primary lookup is load-bearing; the
/// secondary lookups are best-effort and keyed by the URN the primary lookup
/// returned. All methods return provider-shaped JSON — normalization happens
/// in one place, not here.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn profile(&self, username: &str) -> Result<Value, ProfileError>;
    async fn images(&self, urn: &str) -> anyhow::Result<Value>;
    async fn posts(&self, urn: &str) -> anyhow::Result<Value>;
    async fn comments(&self, urn: &str) -> anyhow::Result<Value>;
    async fn reactions(&self, urn: &str) -> anyhow::Result<Value>;
    async fn recommendations(&self, urn: &str) -> anyhow::Result<Value>;
    async fn contact_info(&self, urn: &str) -> anyhow::Result<Value>;
}

/// One content-generation provider. Implementations parse their own wire
/// response into the fixed [`GeneratedBrief`] shape; an incomplete response
/// is a provider failure, never a downstream null.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stable label recorded in usage-log metadata ("anthropic", "groq").
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &BriefPrompt) -> Result<GeneratedBrief, ProviderError>;
}

/// External identity verifier. Given request credentials it returns a stable
/// subject or nothing; credential verification never happens in-process.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token was checked and rejected; `Err` means the
    /// verifier itself was unreachable.
    async fn verify(&self, bearer: &str) -> anyhow::Result<Option<AuthIdentity>>;
}

#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}
