//! Operation coordinators. Each function sequences the gate → fetch →
//! generate → persist pipeline for one operation and translates outcomes to
//! the [`ApiError`] taxonomy; the route layer stays a thin shell around
//! these.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::generation::{BriefOutcome, Orchestrator};
use crate::linkedin::{url, ProfileFetcher};
use crate::prompt::{build_prompt, RequesterContext};
use crate::quota;
use crate::store::{BriefFilter, RefreshPatch, SqliteStore};
use crate::types::{Brief, MeetingGoal, Profile, UsageAction, User};

/// Read-only after startup; shared by reference across requests.
pub struct AppContext {
    pub store: SqliteStore,
    pub fetcher: ProfileFetcher,
    pub orchestrator: Orchestrator,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub linkedin_url: String,
    pub meeting_goal: String,
    #[serde(default)]
    pub custom_goal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub meeting_goal: Option<String>,
    #[serde(default)]
    pub custom_goal: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BriefPage {
    pub briefs: Vec<Brief>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

fn parse_goal(value: &str, custom: Option<&str>) -> Result<MeetingGoal, ApiError> {
    MeetingGoal::parse(value, custom).ok_or_else(|| {
        ApiError::Validation(format!(
            "unknown meeting goal '{}' (custom goals need custom_goal text)",
            value
        ))
    })
}

fn requester_context(user: &User) -> RequesterContext {
    RequesterContext {
        name: user.name.clone(),
        company: user.company.clone(),
        role: user.role.clone(),
    }
}

/// Profile snapshot stored on the brief: the fetched profile plus the
/// enhanced-insights sub-object the generation step produced.
fn snapshot_with_insights(profile: &Profile, outcome: &BriefOutcome) -> serde_json::Value {
    let mut snapshot = serde_json::to_value(profile).unwrap_or_else(|_| json!({}));
    if let Some(obj) = snapshot.as_object_mut() {
        obj.insert(
            "enhanced_insights".to_string(),
            serde_json::to_value(&outcome.data.insights).unwrap_or_else(|_| json!({})),
        );
    }
    snapshot
}

fn usage_metadata(brief: &Brief, outcome: &BriefOutcome) -> serde_json::Value {
    json!({
        "brief_id": brief.id,
        "linkedin_url": brief.linkedin_url,
        "meeting_goal": brief.meeting_goal,
        "ai_provider": outcome.provider,
        "fallback_used": outcome.fallback_used,
    })
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

pub async fn generate_brief(
    ctx: &AppContext,
    user: &User,
    req: GenerateRequest,
) -> Result<Brief, ApiError> {
    let goal = parse_goal(&req.meeting_goal, req.custom_goal.as_deref())?;
    let linkedin_url = url::normalize_profile_url(&req.linkedin_url)
        .ok_or_else(|| ApiError::Validation("invalid LinkedIn profile URL".to_string()))?;

    // Fail fast before spending anything upstream.
    quota::check(&ctx.store, user, quota::GENERATE_ACTIONS, &ctx.config.plans).await?;

    let profile = ctx.fetcher.fetch(&linkedin_url).await?;
    let prompt = build_prompt(
        &profile,
        user.linkedin_data.as_ref(),
        &goal,
        &requester_context(user),
    );
    let outcome = ctx.orchestrator.generate(&prompt).await?;

    let now = Utc::now();
    let brief = Brief {
        id: Uuid::new_v4(),
        user_id: user.id,
        linkedin_url,
        meeting_goal: goal,
        profile_name: profile.full_name.clone(),
        profile_headline: profile.headline.clone(),
        profile_photo_url: profile.profile_pic_url.clone(),
        profile_location: profile.display_location(),
        profile_company: profile.current_company(),
        profile_data: snapshot_with_insights(&profile, &outcome),
        summary: outcome.data.summary.clone(),
        talking_points: outcome.data.talking_points.clone(),
        common_ground: outcome.data.common_ground.clone(),
        icebreaker: outcome.data.icebreaker.clone(),
        questions: outcome.data.questions.clone(),
        is_saved: false,
        created_at: now,
        updated_at: now,
    };

    ctx.store
        .create_brief(&brief)
        .await
        .map_err(ApiError::persistence)?;
    ctx.store
        .append_usage(
            user.id,
            UsageAction::BriefGenerated,
            usage_metadata(&brief, &outcome),
        )
        .await
        .map_err(ApiError::persistence)?;

    info!(
        brief = %brief.id,
        provider = outcome.provider,
        fallback_used = outcome.fallback_used,
        "brief generated"
    );
    Ok(brief)
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

pub async fn refresh_brief(
    ctx: &AppContext,
    user: &User,
    id: Uuid,
    req: RefreshRequest,
) -> Result<Brief, ApiError> {
    let existing = ctx
        .store
        .get_owned_brief(id, user.id)
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("Brief"))?;

    // A caller-supplied goal must be valid; absence keeps the stored one.
    let goal = match req.meeting_goal.as_deref() {
        Some(value) => parse_goal(value, req.custom_goal.as_deref())?,
        None => existing.meeting_goal.clone(),
    };

    // Refresh consumes quota the same as a fresh generation.
    quota::check(&ctx.store, user, quota::REFRESH_ACTIONS, &ctx.config.plans).await?;

    // Always a fresh fetch; stale snapshots are the thing refresh fixes.
    let profile = ctx.fetcher.fetch(&existing.linkedin_url).await?;
    let prompt = build_prompt(
        &profile,
        user.linkedin_data.as_ref(),
        &goal,
        &requester_context(user),
    );
    let outcome = ctx.orchestrator.generate(&prompt).await?;

    let patch = RefreshPatch {
        meeting_goal: goal,
        profile_name: profile.full_name.clone(),
        profile_headline: profile.headline.clone(),
        profile_photo_url: profile.profile_pic_url.clone(),
        profile_location: profile.display_location(),
        profile_company: profile.current_company(),
        profile_data: snapshot_with_insights(&profile, &outcome),
        summary: outcome.data.summary.clone(),
        talking_points: outcome.data.talking_points.clone(),
        common_ground: outcome.data.common_ground.clone(),
        icebreaker: outcome.data.icebreaker.clone(),
        questions: outcome.data.questions.clone(),
        updated_at: Utc::now(),
    };

    let brief = ctx
        .store
        .apply_refresh(id, user.id, &patch)
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("Brief"))?;

    ctx.store
        .append_usage(
            user.id,
            UsageAction::BriefRefreshed,
            usage_metadata(&brief, &outcome),
        )
        .await
        .map_err(ApiError::persistence)?;

    info!(
        brief = %brief.id,
        provider = outcome.provider,
        fallback_used = outcome.fallback_used,
        "brief refreshed"
    );
    Ok(brief)
}

// ---------------------------------------------------------------------------
// get / list / patch / delete
// ---------------------------------------------------------------------------

pub async fn get_brief(ctx: &AppContext, user: &User, id: Uuid) -> Result<Brief, ApiError> {
    ctx.store
        .get_owned_brief(id, user.id)
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("Brief"))
}

pub async fn list_briefs(
    ctx: &AppContext,
    user: &User,
    filter: BriefFilter,
) -> Result<BriefPage, ApiError> {
    let (briefs, total) = ctx
        .store
        .list_briefs(user.id, &filter)
        .await
        .map_err(ApiError::persistence)?;

    let limit = filter.limit.clamp(1, crate::store::MAX_PAGE_SIZE);
    let page = filter.page.max(1);
    let offset = (page - 1) as i64 * limit as i64;
    let has_more = offset + (briefs.len() as i64) < total;
    Ok(BriefPage {
        briefs,
        total,
        page,
        limit,
        has_more,
    })
}

pub async fn set_brief_saved(
    ctx: &AppContext,
    user: &User,
    id: Uuid,
    is_saved: bool,
) -> Result<Brief, ApiError> {
    ctx.store
        .set_brief_saved(id, user.id, is_saved)
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("Brief"))
}

pub async fn delete_brief(ctx: &AppContext, user: &User, id: Uuid) -> Result<(), ApiError> {
    let deleted = ctx
        .store
        .delete_brief(id, user.id)
        .await
        .map_err(ApiError::persistence)?;
    if !deleted {
        return Err(ApiError::NotFound("Brief"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// user profile connection
// ---------------------------------------------------------------------------

/// Save and sync the requesting user's own LinkedIn profile; it feeds
/// common-ground derivation on later generations.
pub async fn connect_profile(
    ctx: &AppContext,
    user: &User,
    linkedin_url: &str,
) -> Result<User, ApiError> {
    let normalized = url::normalize_profile_url(linkedin_url)
        .ok_or_else(|| ApiError::Validation("invalid LinkedIn profile URL".to_string()))?;

    let profile = ctx.fetcher.fetch(&normalized).await?;
    let updated = ctx
        .store
        .update_user_linkedin(user.id, Some(&normalized), Some(&profile))
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("User"))?;

    ctx.store
        .append_usage(
            user.id,
            UsageAction::ProfileSynced,
            json!({ "linkedin_url": normalized }),
        )
        .await
        .map_err(ApiError::persistence)?;
    Ok(updated)
}

/// Re-fetch the already-connected profile.
pub async fn sync_profile(ctx: &AppContext, user: &User) -> Result<User, ApiError> {
    let linkedin_url = user.linkedin_url.clone().ok_or_else(|| {
        ApiError::Validation("no LinkedIn profile connected".to_string())
    })?;

    let profile = ctx.fetcher.fetch(&linkedin_url).await?;
    let updated = ctx
        .store
        .update_user_linkedin(user.id, Some(&linkedin_url), Some(&profile))
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("User"))?;

    ctx.store
        .append_usage(
            user.id,
            UsageAction::ProfileSynced,
            json!({ "linkedin_url": linkedin_url, "is_resync": true }),
        )
        .await
        .map_err(ApiError::persistence)?;
    Ok(updated)
}

pub async fn disconnect_profile(ctx: &AppContext, user: &User) -> Result<User, ApiError> {
    ctx.store
        .update_user_linkedin(user.id, None, None)
        .await
        .map_err(ApiError::persistence)?
        .ok_or(ApiError::NotFound("User"))
}
