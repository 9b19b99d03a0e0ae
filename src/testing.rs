//! Scripted doubles shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProfileError;
use crate::prompt::BriefPrompt;
use crate::providers::ProviderError;
use crate::traits::{GenerationProvider, ProfileApi};
use crate::types::{EnhancedInsights, GeneratedBrief};

/// A complete, valid brief body with a caller-chosen summary so tests can
/// tell which scripted response was served.
pub fn sample_brief_content(summary: &str) -> GeneratedBrief {
    GeneratedBrief {
        summary: summary.to_string(),
        talking_points: vec!["Ask about the platform rebuild".to_string()],
        common_ground: vec!["Both worked in developer tooling".to_string()],
        icebreaker: "I saw your post about the migration".to_string(),
        questions: vec!["What is the team focused on this quarter?".to_string()],
        insights: EnhancedInsights {
            communication_style: Some("direct".to_string()),
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------------
// Generation provider double
// ---------------------------------------------------------------------------

/// Serves scripted responses in order and counts how often it was called.
pub struct MockGenerationProvider {
    name: &'static str,
    responses: Mutex<Vec<Result<GeneratedBrief, ProviderError>>>,
    calls: AtomicUsize,
}

impl MockGenerationProvider {
    pub fn new(
        name: &'static str,
        responses: Vec<Result<GeneratedBrief, ProviderError>>,
    ) -> Self {
        Self {
            name,
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, _prompt: &BriefPrompt) -> Result<GeneratedBrief, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("mock provider '{}' called with no scripted response", self.name);
        }
        responses.remove(0)
    }
}

// ---------------------------------------------------------------------------
// Profile API double
// ---------------------------------------------------------------------------

/// Scripted profile endpoint: one fixed primary response (or error), with
/// secondary lookups either returning empty payloads or failing wholesale.
pub struct MockProfileApi {
    profile: Result<Value, StoredProfileError>,
    secondaries_fail: bool,
    profile_calls: AtomicUsize,
    secondary_calls: AtomicUsize,
}

/// ProfileError is not Clone; keep the pieces and rebuild per call.
struct StoredProfileError {
    kind: crate::error::ProfileErrorKind,
    status: Option<u16>,
    message: String,
}

impl MockProfileApi {
    pub fn with_profile(body: Value) -> Self {
        Self {
            profile: Ok(body),
            secondaries_fail: false,
            profile_calls: AtomicUsize::new(0),
            secondary_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_error(err: ProfileError) -> Self {
        Self {
            profile: Err(StoredProfileError {
                kind: err.kind,
                status: err.status,
                message: err.message,
            }),
            secondaries_fail: false,
            profile_calls: AtomicUsize::new(0),
            secondary_calls: AtomicUsize::new(0),
        }
    }

    /// Make all six secondary lookups fail.
    pub fn failing_secondaries(mut self) -> Self {
        self.secondaries_fail = true;
        self
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn secondary_calls(&self) -> usize {
        self.secondary_calls.load(Ordering::SeqCst)
    }

    fn secondary(&self, endpoint: &str) -> anyhow::Result<Value> {
        self.secondary_calls.fetch_add(1, Ordering::SeqCst);
        if self.secondaries_fail {
            anyhow::bail!("scripted {} failure", endpoint);
        }
        Ok(serde_json::json!({ "success": true, "data": [] }))
    }
}

#[async_trait]
impl ProfileApi for MockProfileApi {
    async fn profile(&self, _username: &str) -> Result<Value, ProfileError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        match &self.profile {
            Ok(body) => Ok(body.clone()),
            Err(stored) => Err(ProfileError {
                kind: stored.kind,
                status: stored.status,
                message: stored.message.clone(),
            }),
        }
    }

    async fn images(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("images")
    }

    async fn posts(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("posts")
    }

    async fn comments(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("comments")
    }

    async fn reactions(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("reactions")
    }

    async fn recommendations(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("recommendations")
    }

    async fn contact_info(&self, _urn: &str) -> anyhow::Result<Value> {
        self.secondary("contact-info")
    }
}
