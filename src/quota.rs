//! Monthly usage gating.
//!
//! Quota periods are calendar months in UTC (the stored timestamps are UTC,
//! so the boundary is unambiguous). The usage log is the source of truth:
//! generation counts entries tagged `brief_generated`; refresh counts
//! generation and refresh combined, so refreshing consumes quota the same as
//! a fresh generation. The check runs before any upstream call so an
//! over-limit request costs nothing.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::debug;

use crate::config::PlanLimits;
use crate::error::ApiError;
use crate::store::SqliteStore;
use crate::types::{UsageAction, User};

pub const GENERATE_ACTIONS: &[UsageAction] = &[UsageAction::BriefGenerated];
pub const REFRESH_ACTIONS: &[UsageAction] =
    &[UsageAction::BriefGenerated, UsageAction::BriefRefreshed];

/// First instant of the current calendar month, UTC.
pub fn current_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.date_naive().year(), now.date_naive().month(), 1, 0, 0, 0)
        .single()
        .expect("month start is always a valid instant")
}

/// Deny when the user's count of `actions` entries this period has reached
/// the plan limit; allow when strictly below.
pub async fn check(
    store: &SqliteStore,
    user: &User,
    actions: &[UsageAction],
    limits: &PlanLimits,
) -> Result<(), ApiError> {
    let since = current_period_start(Utc::now());
    let count = store
        .count_usage_since(user.id, actions, since)
        .await
        .map_err(ApiError::persistence)?;
    let limit = limits.limit_for(&user.plan);

    debug!(user = %user.id, plan = %user.plan, count, limit, "quota check");

    if count >= limit as i64 {
        return Err(ApiError::QuotaExceeded);
    }
    Ok(())
}
