//! Provider-document normalization.
//!
//! The upstream scraper returns several synonymous field names per concept.
//! Each concept is mapped through one ordered candidate list — first present,
//! non-empty value wins — so the rest of the codebase only ever sees the
//! canonical [`Profile`] shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::{
    Activity, Certification, CommentEntry, ContactInfo, DateParts, Education, Experience,
    Profile, ReactionEntry, Recommendation, VolunteerWork,
};
use crate::utils::truncate_str;

const MAX_ENGAGEMENT_ITEMS: usize = 5;

/// Ordered candidate keys per concept, in priority order.
const PHOTO_KEYS: &[&str] = &[
    "profilePicture",
    "avatar",
    "photo",
    "image",
    "profilePhoto",
    "profile_pic_url",
    "displayPictureUrl",
];
const COVER_KEYS: &[&str] = &["backgroundImage", "coverImage"];
const URN_KEYS: &[&str] = &["urn", "entityUrn", "id"];
const SUMMARY_KEYS: &[&str] = &["summary", "about"];

/// Results of the best-effort secondary lookups, already normalized. Any
/// lookup that failed contributes its empty default.
#[derive(Debug, Default)]
pub struct SecondaryData {
    pub best_image: Option<String>,
    pub posts: Vec<Activity>,
    pub comments: Vec<CommentEntry>,
    pub reactions: Vec<ReactionEntry>,
    pub recommendations: Vec<Recommendation>,
    pub contact: ContactInfo,
}

/// First present, non-empty string among `keys`.
pub fn pick_str(doc: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn pick_u32(doc: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .find_map(Value::as_u64)
        .map(|n| n as u32)
}

fn pick_bool(doc: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .find_map(Value::as_bool)
        .unwrap_or(false)
}

/// The stable internal identifier used to key secondary lookups.
pub fn extract_urn(doc: &Value) -> Option<String> {
    pick_str(doc, URN_KEYS)
}

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex"));
static NUMERIC_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[/-](\d{1,2})").expect("numeric month regex"));

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parse the many upstream date spellings ("2020-01", "Jan 2020", "2020",
/// "January 2020") into year/month parts. "Present" and year-less strings
/// yield `None`.
pub fn parse_date_parts(raw: &str) -> Option<DateParts> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("present") {
        return None;
    }

    let year: i32 = YEAR.find(trimmed)?.as_str().parse().ok()?;

    let lower = trimmed.to_lowercase();
    let mut month = MONTH_NAMES
        .iter()
        .position(|name| lower.contains(name))
        .map(|i| i as u32 + 1);
    if month.is_none() {
        month = NUMERIC_MONTH
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .filter(|m| (1..=12).contains(m));
    }

    Some(DateParts {
        day: None,
        month,
        year,
    })
}

fn date_field(entry: &Value, key: &str) -> Option<DateParts> {
    entry.get(key).and_then(Value::as_str).and_then(parse_date_parts)
}

/// Skills and languages arrive either as plain strings or as `{name}` objects.
fn string_or_named_list(doc: &Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .or_else(|| item.get("name").and_then(Value::as_str).map(str::to_string))
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn experiences(doc: &Value) -> Vec<Experience> {
    doc.get("experience")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|exp| Experience {
                    company: pick_str(exp, &["company", "companyName"]).unwrap_or_default(),
                    company_linkedin_profile_url: pick_str(exp, &["companyUrl"]),
                    title: pick_str(exp, &["title"]).unwrap_or_default(),
                    description: pick_str(exp, &["description"]),
                    location: pick_str(exp, &["location"]),
                    starts_at: date_field(exp, "startDate"),
                    ends_at: date_field(exp, "endDate"),
                    logo_url: pick_str(exp, &["companyLogo"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn education(doc: &Value) -> Vec<Education> {
    doc.get("education")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|edu| Education {
                    school: pick_str(edu, &["school", "schoolName"]).unwrap_or_default(),
                    school_linkedin_profile_url: pick_str(edu, &["schoolUrl"]),
                    degree_name: pick_str(edu, &["degree", "degreeName"]),
                    field_of_study: pick_str(edu, &["field", "fieldOfStudy"]),
                    description: pick_str(edu, &["description"]),
                    starts_at: date_field(edu, "startDate"),
                    ends_at: date_field(edu, "endDate"),
                    logo_url: pick_str(edu, &["schoolLogo"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn certifications(doc: &Value) -> Vec<Certification> {
    doc.get("certifications")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|cert| Certification {
                    name: pick_str(cert, &["name"]).unwrap_or_default(),
                    authority: pick_str(cert, &["authority"]),
                    starts_at: date_field(cert, "startDate"),
                    ends_at: date_field(cert, "endDate"),
                    url: pick_str(cert, &["url"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn volunteer_work(doc: &Value) -> Vec<VolunteerWork> {
    doc.get("volunteer")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|vol| VolunteerWork {
                    company: pick_str(vol, &["company"]).unwrap_or_default(),
                    title: pick_str(vol, &["title"]).unwrap_or_default(),
                    description: pick_str(vol, &["description"]),
                    starts_at: date_field(vol, "startDate"),
                    ends_at: date_field(vol, "endDate"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Build the canonical profile from the primary document plus whatever the
/// secondary lookups yielded. The freshly fetched best image takes priority
/// over any photo URL embedded in the profile document itself.
pub fn build_profile(username: &str, doc: &Value, extras: SecondaryData) -> Profile {
    let first_name = pick_str(doc, &["firstName"]).unwrap_or_default();
    let last_name = pick_str(doc, &["lastName"]).unwrap_or_default();
    let full_name = pick_str(doc, &["fullName"])
        .unwrap_or_else(|| format!("{} {}", first_name, last_name).trim().to_string());

    let geo = doc.get("geo").cloned().unwrap_or(Value::Null);
    let headline = pick_str(doc, &["headline"]);

    Profile {
        public_identifier: pick_str(doc, &["username"]).unwrap_or_else(|| username.to_string()),
        first_name,
        last_name,
        full_name,
        headline: headline.clone(),
        summary: pick_str(doc, SUMMARY_KEYS),
        profile_pic_url: extras.best_image.or_else(|| pick_str(doc, PHOTO_KEYS)),
        background_cover_image_url: pick_str(doc, COVER_KEYS),
        country: pick_str(doc, &["countryCode"]).or_else(|| pick_str(&geo, &["country"])),
        country_full_name: pick_str(doc, &["country"]).or_else(|| pick_str(&geo, &["country"])),
        city: pick_str(doc, &["city"]).or_else(|| pick_str(&geo, &["city"])),
        state: None,
        occupation: headline,
        connections: pick_u32(doc, &["connections", "connectionCount"]),
        follower_count: pick_u32(doc, &["followers", "followerCount"]),
        experiences: experiences(doc),
        education: education(doc),
        skills: string_or_named_list(doc, "skills"),
        languages: string_or_named_list(doc, "languages"),
        certifications: certifications(doc),
        volunteer_work: volunteer_work(doc),
        activities: extras.posts,
        comments: extras.comments,
        reactions: extras.reactions,
        recommendations: extras.recommendations,
        contact: extras.contact,
        open_to_work: pick_bool(doc, &["openToWork", "isOpenToWork"]),
        is_premium: pick_bool(doc, &["premium", "isPremium"]),
        is_influencer: pick_bool(doc, &["influencer", "isInfluencer"]),
    }
}

// ---------------------------------------------------------------------------
// Secondary-response mapping
// ---------------------------------------------------------------------------

/// Largest image by pixel area, falling back to the flat picture fields.
pub fn best_image(body: &Value) -> Option<String> {
    let data = body.get("data")?;
    if let Some(images) = data.get("images").and_then(Value::as_array) {
        let mut candidates: Vec<(&Value, u64)> = images
            .iter()
            .filter(|img| img.get("url").and_then(Value::as_str).is_some())
            .map(|img| {
                let area = img.get("width").and_then(Value::as_u64).unwrap_or(0)
                    * img.get("height").and_then(Value::as_u64).unwrap_or(0);
                (img, area)
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some((img, _)) = candidates.first() {
            return img.get("url").and_then(Value::as_str).map(str::to_string);
        }
    }
    pick_str(data, &["profilePicture", "displayImage"])
}

pub fn map_posts(body: &Value) -> Vec<Activity> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|posts| {
            posts
                .iter()
                .take(MAX_ENGAGEMENT_ITEMS)
                .map(|post| Activity {
                    title: post
                        .get("text")
                        .and_then(Value::as_str)
                        .filter(|t| !t.is_empty())
                        .map(|t| truncate_str(t, 200))
                        .unwrap_or_else(|| "Posted an update".to_string()),
                    activity_status: pick_str(post, &["postedAt"])
                        .unwrap_or_else(|| "Recently".to_string()),
                    link: pick_str(post, &["postUrl"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn map_comments(body: &Value) -> Vec<CommentEntry> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|comments| {
            comments
                .iter()
                .take(MAX_ENGAGEMENT_ITEMS)
                .map(|comment| CommentEntry {
                    text: comment
                        .get("text")
                        .and_then(Value::as_str)
                        .map(|t| truncate_str(t, 200))
                        .unwrap_or_default(),
                    post_url: pick_str(comment, &["postUrl"]),
                    commented_at: pick_str(comment, &["commentedAt"])
                        .unwrap_or_else(|| "Recently".to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn map_reactions(body: &Value) -> Vec<ReactionEntry> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|reactions| {
            reactions
                .iter()
                .take(MAX_ENGAGEMENT_ITEMS)
                .map(|reaction| ReactionEntry {
                    reaction_type: pick_str(reaction, &["reactionType"])
                        .unwrap_or_else(|| "like".to_string()),
                    post_text: reaction
                        .get("postText")
                        .and_then(Value::as_str)
                        .map(|t| truncate_str(t, 150)),
                    post_url: pick_str(reaction, &["postUrl"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn map_recommendations(body: &Value) -> Vec<Recommendation> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|recs| {
            recs.iter()
                .take(MAX_ENGAGEMENT_ITEMS)
                .map(|rec| Recommendation {
                    text: pick_str(rec, &["text"]).unwrap_or_default(),
                    recommender_name: pick_str(rec, &["recommenderName"])
                        .unwrap_or_else(|| "Anonymous".to_string()),
                    recommender_title: pick_str(rec, &["recommenderTitle"]),
                    relationship: pick_str(rec, &["relationship"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn map_contact_info(body: &Value) -> ContactInfo {
    let Some(data) = body.get("data").filter(|d| !d.is_null()) else {
        return ContactInfo::default();
    };
    let string_list = |key: &str| -> Vec<String> {
        data.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let email = pick_str(data, &["email"]);
    let phone = pick_str(data, &["phone"]);
    let mut emails = string_list("emails");
    let mut phones = string_list("phones");
    // Singular and plural forms backfill each other.
    let email = email.or_else(|| emails.first().cloned());
    let phone = phone.or_else(|| phones.first().cloned());
    if emails.is_empty() {
        emails.extend(email.clone());
    }
    if phones.is_empty() {
        phones.extend(phone.clone());
    }

    ContactInfo {
        email,
        emails,
        phone,
        phones,
        twitter: pick_str(data, &["twitter"]),
        websites: string_list("websites"),
        address: pick_str(data, &["address"]),
        birthday: pick_str(data, &["birthday"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_present_nonempty_candidate_wins() {
        let doc = json!({ "profilePicture": "", "avatar": "https://img/a.jpg", "photo": "https://img/p.jpg" });
        assert_eq!(pick_str(&doc, PHOTO_KEYS).as_deref(), Some("https://img/a.jpg"));
    }

    #[test]
    fn fetched_best_image_outranks_embedded_photo() {
        let doc = json!({ "firstName": "Jane", "lastName": "Doe", "avatar": "https://img/embedded.jpg" });
        let extras = SecondaryData {
            best_image: Some("https://img/fresh.jpg".to_string()),
            ..Default::default()
        };
        let profile = build_profile("jane-doe", &doc, extras);
        assert_eq!(profile.profile_pic_url.as_deref(), Some("https://img/fresh.jpg"));

        let profile = build_profile("jane-doe", &doc, SecondaryData::default());
        assert_eq!(profile.profile_pic_url.as_deref(), Some("https://img/embedded.jpg"));
    }

    #[test]
    fn full_name_falls_back_to_name_parts() {
        let doc = json!({ "firstName": "Jane", "lastName": "Doe" });
        let profile = build_profile("jane-doe", &doc, SecondaryData::default());
        assert_eq!(profile.full_name, "Jane Doe");
    }

    #[test]
    fn date_parsing_handles_common_spellings() {
        assert_eq!(
            parse_date_parts("2020-01"),
            Some(DateParts { day: None, month: Some(1), year: 2020 })
        );
        assert_eq!(
            parse_date_parts("Jan 2020"),
            Some(DateParts { day: None, month: Some(1), year: 2020 })
        );
        assert_eq!(
            parse_date_parts("January 2020"),
            Some(DateParts { day: None, month: Some(1), year: 2020 })
        );
        assert_eq!(
            parse_date_parts("2019"),
            Some(DateParts { day: None, month: None, year: 2019 })
        );
        assert_eq!(parse_date_parts("Present"), None);
        assert_eq!(parse_date_parts("soon"), None);
    }

    #[test]
    fn skills_accept_both_shapes() {
        let doc = json!({ "skills": ["Rust", { "name": "SQL" }, { "name": "" }] });
        assert_eq!(string_or_named_list(&doc, "skills"), vec!["Rust", "SQL"]);
    }

    #[test]
    fn best_image_prefers_largest_area() {
        let body = json!({ "data": { "images": [
            { "url": "https://img/small.jpg", "width": 100, "height": 100 },
            { "url": "https://img/large.jpg", "width": 800, "height": 800 },
        ]}});
        assert_eq!(best_image(&body).as_deref(), Some("https://img/large.jpg"));
    }

    #[test]
    fn posts_default_title_and_cap() {
        let posts: Vec<Value> = (0..8).map(|i| json!({ "postUrl": format!("https://p/{}", i) })).collect();
        let mapped = map_posts(&json!({ "data": posts }));
        assert_eq!(mapped.len(), MAX_ENGAGEMENT_ITEMS);
        assert_eq!(mapped[0].title, "Posted an update");
        assert_eq!(mapped[0].activity_status, "Recently");
    }

    #[test]
    fn contact_singular_and_plural_backfill() {
        let body = json!({ "data": { "emails": ["a@x.com", "b@x.com"], "phone": "+1555" } });
        let contact = map_contact_info(&body);
        assert_eq!(contact.email.as_deref(), Some("a@x.com"));
        assert_eq!(contact.phones, vec!["+1555"]);
    }

    #[test]
    fn geo_object_backfills_location() {
        let doc = json!({ "geo": { "country": "Germany", "city": "Berlin" } });
        let profile = build_profile("x", &doc, SecondaryData::default());
        assert_eq!(profile.city.as_deref(), Some("Berlin"));
        assert_eq!(profile.country_full_name.as_deref(), Some("Germany"));
    }
}
