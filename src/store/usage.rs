use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, SqliteStore};
use crate::types::UsageAction;

impl SqliteStore {
    /// Append one usage-log entry. Entries are never mutated afterwards —
    /// the log is the source of truth for quota computation.
    pub async fn append_usage(
        &self,
        user_id: Uuid,
        action: UsageAction,
        metadata: serde_json::Value,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO usage_logs (user_id, action, metadata, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id.to_string())
        .bind(action.as_str())
        .bind(metadata.to_string())
        .bind(fmt_ts(Utc::now()))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Count entries for the user with action in `actions` and timestamp at
    /// or after `since`.
    pub async fn count_usage_since(
        &self,
        user_id: Uuid,
        actions: &[UsageAction],
        since: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        if actions.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; actions.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(*) AS total FROM usage_logs
             WHERE user_id = ? AND action IN ({}) AND created_at >= ?",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(user_id.to_string());
        for action in actions {
            query = query.bind(action.as_str());
        }
        let row = query.bind(fmt_ts(since)).fetch_one(self.pool()).await?;
        Ok(row.get("total"))
    }

    #[cfg(test)]
    pub async fn usage_entries(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<(String, serde_json::Value)>> {
        let rows = sqlx::query(
            "SELECT action, metadata FROM usage_logs WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id.to_string())
        .fetch_all(self.pool())
        .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata: String = row.get("metadata");
            entries.push((row.get("action"), serde_json::from_str(&metadata)?));
        }
        Ok(entries)
    }

    /// Backdated insert for exercising period boundaries in tests.
    #[cfg(test)]
    pub async fn append_usage_at(
        &self,
        user_id: Uuid,
        action: UsageAction,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO usage_logs (user_id, action, metadata, created_at)
             VALUES (?, ?, '{}', ?)",
        )
        .bind(user_id.to_string())
        .bind(action.as_str())
        .bind(fmt_ts(at))
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
