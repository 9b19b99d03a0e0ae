use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_ts, SqliteStore};
use crate::traits::AuthIdentity;
use crate::types::{Profile, User};

impl SqliteStore {
    /// Look the user up by the external auth subject, creating a free-tier
    /// record on first sight.
    pub async fn get_or_create_user(&self, identity: &AuthIdentity) -> anyhow::Result<User> {
        if let Some(user) = self.user_by_auth_id(&identity.subject).await? {
            return Ok(user);
        }

        let now = fmt_ts(Utc::now());
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, auth_id, email, name, plan, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'free', ?, ?)",
        )
        .bind(id.to_string())
        .bind(&identity.subject)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await?;

        self.user_by_auth_id(&identity.subject)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user vanished immediately after insert"))
    }

    async fn user_by_auth_id(&self, auth_id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE auth_id = ?")
            .bind(auth_id)
            .fetch_optional(self.pool())
            .await?;
        row.map(row_to_user).transpose()
    }

    /// Set or clear the user's own LinkedIn connection. `None`/`None`
    /// disconnects.
    pub async fn update_user_linkedin(
        &self,
        user_id: Uuid,
        linkedin_url: Option<&str>,
        linkedin_data: Option<&Profile>,
    ) -> anyhow::Result<Option<User>> {
        let data_json = linkedin_data.map(serde_json::to_string).transpose()?;
        let result = sqlx::query(
            "UPDATE users SET linkedin_url = ?, linkedin_data = ?, updated_at = ? WHERE id = ?",
        )
        .bind(linkedin_url)
        .bind(data_json)
        .bind(fmt_ts(Utc::now()))
        .bind(user_id.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(self.pool())
            .await?;
        row.map(row_to_user).transpose()
    }

    #[cfg(test)]
    pub async fn set_user_plan(&self, user_id: Uuid, plan: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET plan = ? WHERE id = ?")
            .bind(plan)
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> anyhow::Result<User> {
    let linkedin_data: Option<String> = row.get("linkedin_data");
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    Ok(User {
        id: Uuid::parse_str(&id)?,
        auth_id: row.get("auth_id"),
        email: row.get("email"),
        name: row.get("name"),
        company: row.get("company"),
        role: row.get("role"),
        linkedin_url: row.get("linkedin_url"),
        linkedin_data: linkedin_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        plan: row.get("plan"),
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
