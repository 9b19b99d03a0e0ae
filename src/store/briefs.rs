use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{fmt_ts, parse_ts, SqliteStore, MAX_PAGE_SIZE};
use crate::types::{Brief, MeetingGoal};

/// List query: filters, sort, and pagination. `limit` is clamped to the
/// server maximum before any query runs.
#[derive(Debug, Clone)]
pub struct BriefFilter {
    /// Case-insensitive substring match over name, headline, and company.
    pub search: Option<String>,
    /// Exact match on the stored goal value.
    pub goal: Option<String>,
    /// When set, only saved briefs.
    pub saved_only: bool,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for BriefFilter {
    fn default() -> Self {
        Self {
            search: None,
            goal: None,
            saved_only: false,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            limit: super::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    ProfileName,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::ProfileName => "profile_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Everything a refresh replaces. Identifier, owner, saved flag, and
/// creation time are deliberately absent — they survive untouched.
#[derive(Debug)]
pub struct RefreshPatch {
    pub meeting_goal: MeetingGoal,
    pub profile_name: String,
    pub profile_headline: Option<String>,
    pub profile_photo_url: Option<String>,
    pub profile_location: Option<String>,
    pub profile_company: Option<String>,
    pub profile_data: serde_json::Value,
    pub summary: String,
    pub talking_points: Vec<String>,
    pub common_ground: Vec<String>,
    pub icebreaker: String,
    pub questions: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl SqliteStore {
    pub async fn create_brief(&self, brief: &Brief) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO briefs (
                id, user_id, linkedin_url, meeting_goal,
                profile_name, profile_headline, profile_photo_url,
                profile_location, profile_company, profile_data,
                summary, talking_points, common_ground, icebreaker, questions,
                is_saved, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(brief.id.to_string())
        .bind(brief.user_id.to_string())
        .bind(&brief.linkedin_url)
        .bind(brief.meeting_goal.as_stored())
        .bind(&brief.profile_name)
        .bind(&brief.profile_headline)
        .bind(&brief.profile_photo_url)
        .bind(&brief.profile_location)
        .bind(&brief.profile_company)
        .bind(serde_json::to_string(&brief.profile_data)?)
        .bind(&brief.summary)
        .bind(serde_json::to_string(&brief.talking_points)?)
        .bind(serde_json::to_string(&brief.common_ground)?)
        .bind(&brief.icebreaker)
        .bind(serde_json::to_string(&brief.questions)?)
        .bind(brief.is_saved)
        .bind(fmt_ts(brief.created_at))
        .bind(fmt_ts(brief.updated_at))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Lookup scoped by id AND owner. A brief owned by someone else is
    /// indistinguishable from one that does not exist.
    pub async fn get_owned_brief(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Brief>> {
        let row = sqlx::query("SELECT * FROM briefs WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .fetch_optional(self.pool())
            .await?;
        row.map(row_to_brief).transpose()
    }

    /// Apply the refresh merge rule: content fields and the profile snapshot
    /// are replaced wholesale; id, owner, is_saved, and created_at survive.
    pub async fn apply_refresh(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &RefreshPatch,
    ) -> anyhow::Result<Option<Brief>> {
        let result = sqlx::query(
            r#"
            UPDATE briefs SET
                meeting_goal = ?, profile_name = ?, profile_headline = ?,
                profile_photo_url = ?, profile_location = ?, profile_company = ?,
                profile_data = ?, summary = ?, talking_points = ?,
                common_ground = ?, icebreaker = ?, questions = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(patch.meeting_goal.as_stored())
        .bind(&patch.profile_name)
        .bind(&patch.profile_headline)
        .bind(&patch.profile_photo_url)
        .bind(&patch.profile_location)
        .bind(&patch.profile_company)
        .bind(serde_json::to_string(&patch.profile_data)?)
        .bind(&patch.summary)
        .bind(serde_json::to_string(&patch.talking_points)?)
        .bind(serde_json::to_string(&patch.common_ground)?)
        .bind(&patch.icebreaker)
        .bind(serde_json::to_string(&patch.questions)?)
        .bind(fmt_ts(patch.updated_at))
        .bind(id.to_string())
        .bind(owner.to_string())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_owned_brief(id, owner).await
    }

    pub async fn set_brief_saved(
        &self,
        id: Uuid,
        owner: Uuid,
        is_saved: bool,
    ) -> anyhow::Result<Option<Brief>> {
        let result =
            sqlx::query("UPDATE briefs SET is_saved = ?, updated_at = ? WHERE id = ? AND user_id = ?")
                .bind(is_saved)
                .bind(fmt_ts(Utc::now()))
                .bind(id.to_string())
                .bind(owner.to_string())
                .execute(self.pool())
                .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_owned_brief(id, owner).await
    }

    /// Returns whether a row was deleted (false = missing or not owned).
    pub async fn delete_brief(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM briefs WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Filtered, sorted, paginated listing. The returned total reflects the
    /// filtered set, not the unfiltered table.
    pub async fn list_briefs(
        &self,
        owner: Uuid,
        filter: &BriefFilter,
    ) -> anyhow::Result<(Vec<Brief>, i64)> {
        let mut where_sql = String::from("user_id = ?");
        let mut binds: Vec<String> = vec![owner.to_string()];

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            where_sql.push_str(
                " AND (profile_name LIKE ? ESCAPE '\\' \
                 OR profile_headline LIKE ? ESCAPE '\\' \
                 OR profile_company LIKE ? ESCAPE '\\')",
            );
            let pattern = format!("%{}%", escape_like(search.trim()));
            binds.push(pattern.clone());
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if let Some(goal) = filter.goal.as_deref().filter(|g| !g.is_empty()) {
            where_sql.push_str(" AND meeting_goal = ?");
            binds.push(goal.to_string());
        }
        if filter.saved_only {
            where_sql.push_str(" AND is_saved = 1");
        }

        let count_sql = format!("SELECT COUNT(*) AS total FROM briefs WHERE {}", where_sql);
        let mut count_query = sqlx::query(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind);
        }
        let total: i64 = count_query.fetch_one(self.pool()).await?.get("total");

        let limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        let page = filter.page.max(1);
        let offset = (page - 1) * limit;

        let list_sql = format!(
            "SELECT * FROM briefs WHERE {} ORDER BY {} {} LIMIT ? OFFSET ?",
            where_sql,
            filter.sort.column(),
            filter.order.keyword(),
        );
        let mut list_query = sqlx::query(&list_sql);
        for bind in &binds {
            list_query = list_query.bind(bind);
        }
        let rows = list_query
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(self.pool())
            .await?;

        let mut briefs = Vec::with_capacity(rows.len());
        for row in rows {
            briefs.push(row_to_brief(row)?);
        }
        Ok((briefs, total))
    }
}

/// SQLite LIKE is case-insensitive for ASCII by default; we only need to
/// escape the pattern metacharacters.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn row_to_brief(row: sqlx::sqlite::SqliteRow) -> anyhow::Result<Brief> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let goal: String = row.get("meeting_goal");
    let profile_data: String = row.get("profile_data");
    let talking_points: String = row.get("talking_points");
    let common_ground: String = row.get("common_ground");
    let questions: String = row.get("questions");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Brief {
        id: Uuid::parse_str(&id)?,
        user_id: Uuid::parse_str(&user_id)?,
        linkedin_url: row.get("linkedin_url"),
        meeting_goal: MeetingGoal::from_stored(&goal),
        profile_name: row.get("profile_name"),
        profile_headline: row.get("profile_headline"),
        profile_photo_url: row.get("profile_photo_url"),
        profile_location: row.get("profile_location"),
        profile_company: row.get("profile_company"),
        profile_data: serde_json::from_str(&profile_data)?,
        summary: row.get("summary"),
        talking_points: serde_json::from_str(&talking_points)?,
        common_ground: serde_json::from_str(&common_ground)?,
        icebreaker: row.get("icebreaker"),
        questions: serde_json::from_str(&questions)?,
        is_saved: row.get("is_saved"),
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
