//! Core domain types shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Meeting goal
// ---------------------------------------------------------------------------

/// What the user wants out of the meeting. Drives the prompt framing and is
/// stored verbatim on the brief so list filtering can match on it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingGoal {
    Sales,
    Hiring,
    Partnership,
    Networking,
    Fundraising,
    Custom(String),
}

impl MeetingGoal {
    /// Parse a request-supplied goal. Known values map to their variant;
    /// `"custom"` requires non-empty free text. Anything else is rejected.
    pub fn parse(value: &str, custom: Option<&str>) -> Option<Self> {
        match value {
            "sales" => Some(Self::Sales),
            "hiring" => Some(Self::Hiring),
            "partnership" => Some(Self::Partnership),
            "networking" => Some(Self::Networking),
            "fundraising" => Some(Self::Fundraising),
            "custom" => custom
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| Self::Custom(c.to_string())),
            _ => None,
        }
    }

    /// Reconstruct a goal from its stored form. Unknown strings are custom
    /// goals (they were stored as free text).
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "sales" => Self::Sales,
            "hiring" => Self::Hiring,
            "partnership" => Self::Partnership,
            "networking" => Self::Networking,
            "fundraising" => Self::Fundraising,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_stored(&self) -> &str {
        match self {
            Self::Sales => "sales",
            Self::Hiring => "hiring",
            Self::Partnership => "partnership",
            Self::Networking => "networking",
            Self::Fundraising => "fundraising",
            Self::Custom(text) => text,
        }
    }
}

impl Serialize for MeetingGoal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_stored())
    }
}

impl<'de> Deserialize<'de> for MeetingGoal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(&raw))
    }
}

// ---------------------------------------------------------------------------
// Canonical profile
// ---------------------------------------------------------------------------

/// A year/month pair extracted from the many date spellings upstream uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub company_linkedin_profile_url: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateParts>,
    pub ends_at: Option<DateParts>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub school_linkedin_profile_url: Option<String>,
    pub degree_name: Option<String>,
    pub field_of_study: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateParts>,
    pub ends_at: Option<DateParts>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub authority: Option<String>,
    pub starts_at: Option<DateParts>,
    pub ends_at: Option<DateParts>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolunteerWork {
    pub company: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateParts>,
    pub ends_at: Option<DateParts>,
}

/// A recent post by the profile owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Activity {
    pub title: String,
    pub activity_status: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentEntry {
    pub text: String,
    pub post_url: Option<String>,
    pub commented_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionEntry {
    pub reaction_type: String,
    pub post_text: Option<String>,
    pub post_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub recommender_name: String,
    pub recommender_title: Option<String>,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub emails: Vec<String>,
    pub phone: Option<String>,
    pub phones: Vec<String>,
    pub twitter: Option<String>,
    pub websites: Vec<String>,
    pub address: Option<String>,
    pub birthday: Option<String>,
}

/// Canonical profile shape. Every upstream response is mapped into this
/// before any downstream use; no caller ever sees provider-native field
/// names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub public_identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub profile_pic_url: Option<String>,
    pub background_cover_image_url: Option<String>,
    pub country: Option<String>,
    pub country_full_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub occupation: Option<String>,
    pub connections: Option<u32>,
    pub follower_count: Option<u32>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub volunteer_work: Vec<VolunteerWork>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub open_to_work: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_influencer: bool,
}

impl Profile {
    /// "City, State, Country" with absent parts dropped.
    pub fn display_location(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.city.as_deref(),
            self.state.as_deref(),
            self.country_full_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// Company of the most recent experience entry, used for denormalized
    /// listing columns.
    pub fn current_company(&self) -> Option<String> {
        self.experiences
            .first()
            .map(|e| e.company.clone())
            .filter(|c| !c.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Generated content
// ---------------------------------------------------------------------------

/// Deeper read on the person, produced only by the generation step and
/// stored under `enhanced_insights` inside the profile snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancedInsights {
    #[serde(default)]
    pub personality_insights: Vec<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub rapport_tips: Vec<String>,
    #[serde(default)]
    pub potential_challenges: Vec<String>,
    #[serde(default)]
    pub meeting_strategy: Option<String>,
    #[serde(default)]
    pub follow_up_hooks: Vec<String>,
    #[serde(default)]
    pub linkedin_dm_template: Option<String>,
    #[serde(default)]
    pub email_template: Option<String>,
}

/// The structured content one provider call produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBrief {
    pub summary: String,
    pub talking_points: Vec<String>,
    pub common_ground: Vec<String>,
    pub icebreaker: String,
    pub questions: Vec<String>,
    #[serde(flatten)]
    pub insights: EnhancedInsights,
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Brief {
    pub id: Uuid,
    pub user_id: Uuid,
    pub linkedin_url: String,
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
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub auth_id: String,
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub linkedin_url: Option<String>,
    pub linkedin_data: Option<Profile>,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usage-log action tags. The log is append-only and is the source of truth
/// for quota computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageAction {
    BriefGenerated,
    BriefRefreshed,
    ProfileSynced,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BriefGenerated => "brief_generated",
            Self::BriefRefreshed => "brief_refreshed",
            Self::ProfileSynced => "profile_synced",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_parse_accepts_known_values() {
        assert_eq!(MeetingGoal::parse("sales", None), Some(MeetingGoal::Sales));
        assert_eq!(
            MeetingGoal::parse("networking", None),
            Some(MeetingGoal::Networking)
        );
    }

    #[test]
    fn goal_parse_requires_text_for_custom() {
        assert_eq!(MeetingGoal::parse("custom", None), None);
        assert_eq!(MeetingGoal::parse("custom", Some("  ")), None);
        assert_eq!(
            MeetingGoal::parse("custom", Some("catch up on the acquisition")),
            Some(MeetingGoal::Custom("catch up on the acquisition".into()))
        );
    }

    #[test]
    fn goal_parse_rejects_unknown_values() {
        assert_eq!(MeetingGoal::parse("world_domination", None), None);
        assert_eq!(MeetingGoal::parse("world_domination", Some("text")), None);
    }

    #[test]
    fn goal_stored_roundtrip() {
        for goal in [
            MeetingGoal::Sales,
            MeetingGoal::Fundraising,
            MeetingGoal::Custom("quarterly sync".into()),
        ] {
            assert_eq!(MeetingGoal::from_stored(goal.as_stored()), goal);
        }
    }

    #[test]
    fn display_location_drops_missing_parts() {
        let mut profile = Profile {
            city: Some("Austin".into()),
            country_full_name: Some("United States".into()),
            ..Default::default()
        };
        assert_eq!(
            profile.display_location().as_deref(),
            Some("Austin, United States")
        );
        profile.city = None;
        profile.country_full_name = None;
        assert_eq!(profile.display_location(), None);
    }
}
