//! Request-level error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`; the route layer maps the
//! variant to a transport status and a stable machine-readable code. Quota
//! rejections carry their own code so clients can show an upgrade prompt
//! instead of a generic failure.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::providers::ProviderError;

// ---------------------------------------------------------------------------
// Upstream profile provider errors
// ---------------------------------------------------------------------------

/// Classified failure from the profile data provider. The sub-kind tells the
/// caller which retry policy applies (none are retried inside this service).
#[derive(Debug)]
pub struct ProfileError {
    pub kind: ProfileErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileErrorKind {
    /// Upstream reports no such profile.
    NotFound,
    /// No response within the bounded interval.
    Timeout,
    /// 429 from the provider.
    RateLimited,
    /// 401/403 — provider credentials rejected.
    AuthFailed,
    /// 5xx — provider-side outage.
    Server,
    /// Anything else, including malformed response bodies.
    Other,
}

impl ProfileError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            404 => ProfileErrorKind::NotFound,
            408 => ProfileErrorKind::Timeout,
            429 => ProfileErrorKind::RateLimited,
            401 | 403 => ProfileErrorKind::AuthFailed,
            500..=599 => ProfileErrorKind::Server,
            _ => ProfileErrorKind::Other,
        };
        Self {
            kind,
            status: Some(status),
            message: crate::utils::truncate_str(body, 300),
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProfileErrorKind::Timeout
        } else {
            ProfileErrorKind::Other
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ProfileErrorKind::Other,
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "Profile provider error ({}, {:?}): {}",
                status, self.kind, self.message
            ),
            None => write!(f, "Profile provider error ({:?}): {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProfileError {}

// ---------------------------------------------------------------------------
// Generation failure (both providers exhausted)
// ---------------------------------------------------------------------------

/// Raised only when the primary and the fallback provider both failed.
/// Carries both causes for diagnostics; never degrades to partial content.
#[derive(Debug)]
pub struct GenerationFailed {
    pub primary: ProviderError,
    pub fallback: ProviderError,
}

impl fmt::Display for GenerationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "both generation providers failed (primary: {}; fallback: {})",
            self.primary, self.fallback
        )
    }
}

impl std::error::Error for GenerationFailed {}

// ---------------------------------------------------------------------------
// API error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    /// Malformed identifier, body, or unknown meeting goal. Never retried.
    Validation(String),
    /// Missing or rejected identity.
    Auth(String),
    /// Missing resource, or a resource owned by someone else — the two are
    /// deliberately indistinguishable.
    NotFound(&'static str),
    /// Monthly plan limit reached.
    QuotaExceeded,
    /// The profile provider failed; surfaced as a generation failure.
    Profile(ProfileError),
    /// Both generation providers failed.
    Generation(GenerationFailed),
    /// A store write or read failed. No compensating writes are attempted.
    Persistence(anyhow::Error),
}

impl ApiError {
    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            Self::Profile(e) => match e.kind {
                ProfileErrorKind::NotFound => StatusCode::NOT_FOUND,
                ProfileErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ProfileErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ProfileErrorKind::AuthFailed
                | ProfileErrorKind::Server
                | ProfileErrorKind::Other => StatusCode::BAD_GATEWAY,
            },
            Self::Generation(_) | Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Auth(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QuotaExceeded => "USAGE_LIMIT_EXCEEDED",
            Self::Profile(e) => match e.kind {
                ProfileErrorKind::NotFound => "PROFILE_NOT_FOUND",
                ProfileErrorKind::RateLimited => "PROFILE_RATE_LIMITED",
                ProfileErrorKind::Timeout => "PROFILE_TIMEOUT",
                _ => "PROFILE_UNAVAILABLE",
            },
            Self::Generation(_) => "GENERATION_FAILED",
            Self::Persistence(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Internal failures are not echoed verbatim.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Auth(msg) => msg.clone(),
            Self::NotFound(what) => format!("{} not found", what),
            Self::QuotaExceeded => {
                "Monthly brief limit reached. Upgrade your plan to generate more briefs."
                    .to_string()
            }
            Self::Profile(e) => match e.kind {
                ProfileErrorKind::NotFound => "LinkedIn profile not found".to_string(),
                ProfileErrorKind::RateLimited => {
                    "Profile provider rate limit exceeded. Please try again later.".to_string()
                }
                ProfileErrorKind::Timeout => "Profile lookup timed out".to_string(),
                _ => "Failed to fetch LinkedIn profile".to_string(),
            },
            Self::Generation(_) => "Brief generation failed. Please try again.".to_string(),
            Self::Persistence(_) => "Internal error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {}", msg),
            Self::Auth(msg) => write!(f, "auth error: {}", msg),
            Self::NotFound(what) => write!(f, "{} not found", what),
            Self::QuotaExceeded => write!(f, "usage limit exceeded"),
            Self::Profile(e) => write!(f, "{}", e),
            Self::Generation(e) => write!(f, "{}", e),
            Self::Persistence(e) => write!(f, "persistence error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::Profile(err)
    }
}

impl From<GenerationFailed> for ApiError {
    fn from(err: GenerationFailed) -> Self {
        Self::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Generation(e) => {
                tracing::error!(
                    primary = %e.primary,
                    fallback = %e.fallback,
                    "brief generation failed on both providers"
                );
            }
            ApiError::Persistence(e) => tracing::error!(error = %e, "persistence failure"),
            ApiError::Profile(e) => tracing::warn!(error = %e, "profile provider failure"),
            _ => {}
        }
        let body = json!({
            "success": false,
            "error": { "code": self.code(), "message": self.public_message() },
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_error_status_classification() {
        assert_eq!(
            ProfileError::from_status(404, "").kind,
            ProfileErrorKind::NotFound
        );
        assert_eq!(
            ProfileError::from_status(429, "").kind,
            ProfileErrorKind::RateLimited
        );
        assert_eq!(
            ProfileError::from_status(401, "").kind,
            ProfileErrorKind::AuthFailed
        );
        assert_eq!(
            ProfileError::from_status(503, "").kind,
            ProfileErrorKind::Server
        );
        assert_eq!(
            ProfileError::from_status(418, "").kind,
            ProfileErrorKind::Other
        );
    }

    #[test]
    fn quota_rejection_has_distinguishable_code() {
        assert_eq!(ApiError::QuotaExceeded.code(), "USAGE_LIMIT_EXCEEDED");
        assert_ne!(
            ApiError::QuotaExceeded.code(),
            ApiError::Validation("x".into()).code()
        );
    }

    #[test]
    fn ownership_failure_reads_like_absence() {
        // Foreign-owned and missing resources must produce the same error.
        let missing = ApiError::NotFound("Brief");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.public_message(), "Brief not found");
    }
}
