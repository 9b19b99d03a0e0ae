use sqlx::SqlitePool;
use tracing::info;

/// Centralized schema setup. Every statement is idempotent (`IF NOT EXISTS`)
/// so startup can run this unconditionally.
pub(crate) async fn run(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            auth_id TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            name TEXT,
            company TEXT,
            role TEXT,
            linkedin_url TEXT,
            linkedin_data TEXT,
            plan TEXT NOT NULL DEFAULT 'free',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS briefs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            linkedin_url TEXT NOT NULL,
            meeting_goal TEXT NOT NULL,
            profile_name TEXT NOT NULL,
            profile_headline TEXT,
            profile_photo_url TEXT,
            profile_location TEXT,
            profile_company TEXT,
            profile_data TEXT NOT NULL,
            summary TEXT NOT NULL,
            talking_points TEXT NOT NULL,
            common_ground TEXT NOT NULL,
            icebreaker TEXT NOT NULL,
            questions TEXT NOT NULL,
            is_saved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_briefs_owner_created
         ON briefs(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS usage_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            action TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Quota counting filters on (user, action, time window).
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_usage_owner_action_time
         ON usage_logs(user_id, action, created_at)",
    )
    .execute(pool)
    .await?;

    info!("database schema ready");
    Ok(())
}
