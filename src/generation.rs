//! Two-provider generation chain.
//!
//! One attempt against the primary provider, then — only after the primary
//! has definitively failed — exactly one attempt against the fallback. The
//! two calls are never raced in parallel (that would bill both providers),
//! and there is no retry loop beyond the single hop.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::GenerationFailed;
use crate::prompt::BriefPrompt;
use crate::traits::GenerationProvider;
use crate::types::GeneratedBrief;

/// Result envelope: the content plus which provider served it.
#[derive(Debug, Clone)]
pub struct BriefOutcome {
    pub data: GeneratedBrief,
    pub provider: &'static str,
    pub fallback_used: bool,
}

pub struct Orchestrator {
    primary: Arc<dyn GenerationProvider>,
    fallback: Arc<dyn GenerationProvider>,
}

impl Orchestrator {
    pub fn new(
        primary: Arc<dyn GenerationProvider>,
        fallback: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub async fn generate(&self, prompt: &BriefPrompt) -> Result<BriefOutcome, GenerationFailed> {
        let primary_err = match self.primary.generate(prompt).await {
            Ok(data) => {
                return Ok(BriefOutcome {
                    data,
                    provider: self.primary.name(),
                    fallback_used: false,
                });
            }
            Err(e) => e,
        };

        warn!(
            provider = self.primary.name(),
            error = %primary_err,
            "primary generation provider failed, trying fallback"
        );

        match self.fallback.generate(prompt).await {
            Ok(data) => {
                info!(provider = self.fallback.name(), "brief generated via fallback provider");
                Ok(BriefOutcome {
                    data,
                    provider: self.fallback.name(),
                    fallback_used: true,
                })
            }
            Err(fallback_err) => Err(GenerationFailed {
                primary: primary_err,
                fallback: fallback_err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderError, ProviderErrorKind};
    use crate::testing::{sample_brief_content, MockGenerationProvider};

    fn prompt() -> BriefPrompt {
        BriefPrompt {
            system: "system".into(),
            user: "user".into(),
        }
    }

    fn timeout_error() -> ProviderError {
        ProviderError {
            kind: ProviderErrorKind::Timeout,
            status: None,
            message: "timed out".into(),
        }
    }

    #[tokio::test]
    async fn primary_success_never_touches_fallback() {
        let primary = Arc::new(MockGenerationProvider::new(
            "anthropic",
            vec![Ok(sample_brief_content("from primary"))],
        ));
        let fallback = Arc::new(MockGenerationProvider::new("groq", vec![]));
        let orchestrator = Orchestrator::new(primary.clone(), fallback.clone());

        let outcome = orchestrator.generate(&prompt()).await.unwrap();
        assert_eq!(outcome.provider, "anthropic");
        assert!(!outcome.fallback_used);
        assert_eq!(outcome.data.summary, "from primary");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_exactly_once() {
        let primary = Arc::new(MockGenerationProvider::new(
            "anthropic",
            vec![Err(timeout_error())],
        ));
        let fallback = Arc::new(MockGenerationProvider::new(
            "groq",
            vec![Ok(sample_brief_content("from fallback"))],
        ));
        let orchestrator = Orchestrator::new(primary.clone(), fallback.clone());

        let outcome = orchestrator.generate(&prompt()).await.unwrap();
        assert_eq!(outcome.provider, "groq");
        assert!(outcome.fallback_used);
        assert_eq!(outcome.data.summary, "from fallback");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_output_triggers_fallback_like_transport_failure() {
        let primary = Arc::new(MockGenerationProvider::new(
            "anthropic",
            vec![Err(ProviderError::malformed("missing required field 'summary'"))],
        ));
        let fallback = Arc::new(MockGenerationProvider::new(
            "groq",
            vec![Ok(sample_brief_content("recovered"))],
        ));
        let orchestrator = Orchestrator::new(primary, fallback);

        let outcome = orchestrator.generate(&prompt()).await.unwrap();
        assert!(outcome.fallback_used);
    }

    #[tokio::test]
    async fn both_failing_surfaces_both_causes() {
        let primary = Arc::new(MockGenerationProvider::new(
            "anthropic",
            vec![Err(timeout_error())],
        ));
        let fallback = Arc::new(MockGenerationProvider::new(
            "groq",
            vec![Err(ProviderError::from_status(503, "overloaded"))],
        ));
        let orchestrator = Orchestrator::new(primary.clone(), fallback.clone());

        let err = orchestrator.generate(&prompt()).await.unwrap_err();
        assert_eq!(err.primary.kind, ProviderErrorKind::Timeout);
        assert_eq!(err.fallback.kind, ProviderErrorKind::ServerError);
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }
}
