use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ApiError, ProfileError};
use crate::linkedin::{normalize, url};
use crate::linkedin::normalize::SecondaryData;
use crate::traits::ProfileApi;
use crate::types::Profile;

/// Fetches and normalizes one profile per call. Stateless: nothing is
/// persisted here.
pub struct ProfileFetcher {
    api: Arc<dyn ProfileApi>,
}

impl ProfileFetcher {
    pub fn new(api: Arc<dyn ProfileApi>) -> Self {
        Self { api }
    }

    /// Fetch the canonical profile for a profile URL.
    ///
    /// The primary lookup must succeed; when it returns a stable URN the six
    /// secondary lookups run concurrently, each independently best-effort —
    /// a failure degrades that sub-section to its empty default and never
    /// fails the overall fetch or cancels its siblings.
    pub async fn fetch(&self, linkedin_url: &str) -> Result<Profile, ApiError> {
        let handle = url::canonical_handle(linkedin_url)
            .ok_or_else(|| ApiError::Validation("invalid LinkedIn profile URL".to_string()))?;

        let body = self.api.profile(&handle).await?;

        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("profile lookup reported failure");
            return Err(ProfileError::other(message).into());
        }
        let data = body
            .get("data")
            .filter(|d| !d.is_null())
            .cloned()
            .ok_or_else(|| ProfileError::other("no profile data in response"))?;

        let extras = match normalize::extract_urn(&data) {
            Some(urn) => self.fetch_secondary(&urn).await,
            None => {
                debug!(handle = %handle, "no URN in profile document, skipping secondary lookups");
                SecondaryData::default()
            }
        };

        let profile = normalize::build_profile(&handle, &data, extras);
        info!(
            handle = %handle,
            posts = profile.activities.len(),
            comments = profile.comments.len(),
            has_photo = profile.profile_pic_url.is_some(),
            "profile fetched"
        );
        Ok(profile)
    }

    async fn fetch_secondary(&self, urn: &str) -> SecondaryData {
        let (images, posts, comments, reactions, recommendations, contact) = tokio::join!(
            self.api.images(urn),
            self.api.posts(urn),
            self.api.comments(urn),
            self.api.reactions(urn),
            self.api.recommendations(urn),
            self.api.contact_info(urn),
        );

        SecondaryData {
            best_image: best_effort(images, "images").and_then(|b| normalize::best_image(&b)),
            posts: best_effort(posts, "posts")
                .map(|b| normalize::map_posts(&b))
                .unwrap_or_default(),
            comments: best_effort(comments, "comments")
                .map(|b| normalize::map_comments(&b))
                .unwrap_or_default(),
            reactions: best_effort(reactions, "reactions")
                .map(|b| normalize::map_reactions(&b))
                .unwrap_or_default(),
            recommendations: best_effort(recommendations, "recommendations")
                .map(|b| normalize::map_recommendations(&b))
                .unwrap_or_default(),
            contact: best_effort(contact, "contact-info")
                .map(|b| normalize::map_contact_info(&b))
                .unwrap_or_default(),
        }
    }
}

/// Secondary lookups never raise; their failures are observable only as
/// absent data.
fn best_effort(result: anyhow::Result<Value>, endpoint: &str) -> Option<Value> {
    match result {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(endpoint, error = %e, "secondary profile lookup degraded to empty");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileErrorKind;
    use crate::testing::MockProfileApi;
    use serde_json::json;

    #[tokio::test]
    async fn invalid_url_is_rejected_without_any_upstream_call() {
        let api = Arc::new(MockProfileApi::with_profile(json!({})));
        let fetcher = ProfileFetcher::new(api.clone());
        let err = fetcher.fetch("https://example.com/in/nope").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(api.profile_calls(), 0);
    }

    #[tokio::test]
    async fn secondary_failures_degrade_without_failing_fetch() {
        let api = Arc::new(
            MockProfileApi::with_profile(json!({
                "success": true,
                "data": { "urn": "urn:li:123", "firstName": "Jane", "lastName": "Doe" }
            }))
            .failing_secondaries(),
        );
        let fetcher = ProfileFetcher::new(api.clone());
        let profile = fetcher
            .fetch("https://www.linkedin.com/in/jane-doe")
            .await
            .unwrap();
        assert_eq!(profile.full_name, "Jane Doe");
        assert!(profile.activities.is_empty());
        assert!(profile.contact.email.is_none());
        // All six secondaries were attempted despite failing.
        assert_eq!(api.secondary_calls(), 6);
    }

    #[tokio::test]
    async fn missing_urn_skips_secondary_lookups() {
        let api = Arc::new(MockProfileApi::with_profile(json!({
            "success": true,
            "data": { "firstName": "Jane", "lastName": "Doe" }
        })));
        let fetcher = ProfileFetcher::new(api.clone());
        let profile = fetcher
            .fetch("https://www.linkedin.com/in/jane-doe")
            .await
            .unwrap();
        assert_eq!(profile.full_name, "Jane Doe");
        assert_eq!(api.secondary_calls(), 0);
    }

    #[tokio::test]
    async fn upstream_not_found_propagates_kind() {
        let api = Arc::new(MockProfileApi::with_error(ProfileError::from_status(404, "")));
        let fetcher = ProfileFetcher::new(api);
        let err = fetcher
            .fetch("https://www.linkedin.com/in/ghost")
            .await
            .unwrap_err();
        match err {
            ApiError::Profile(e) => assert_eq!(e.kind, ProfileErrorKind::NotFound),
            other => panic!("expected profile error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn provider_reported_failure_is_an_error() {
        let api = Arc::new(MockProfileApi::with_profile(json!({
            "success": false,
            "message": "profile is private"
        })));
        let fetcher = ProfileFetcher::new(api);
        let err = fetcher
            .fetch("https://www.linkedin.com/in/private")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Profile(_)));
    }
}
