//! Structured prompt construction for brief generation.
//!
//! Both providers receive the same prompt: a system instruction pinning the
//! output schema, and a user message carrying the target profile, the
//! requester's own profile (for common-ground derivation), and the meeting
//! goal.

use std::fmt::Write;

use crate::types::{MeetingGoal, Profile};
use crate::utils::truncate_str;

const MAX_POSTS: usize = 5;
const MAX_SKILLS: usize = 15;
const MAX_EXPERIENCES: usize = 6;

#[derive(Debug, Clone)]
pub struct BriefPrompt {
    pub system: String,
    pub user: String,
}

/// Who is asking for the brief.
#[derive(Debug, Clone, Default)]
pub struct RequesterContext {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
}

pub fn build_prompt(
    target: &Profile,
    user_profile: Option<&Profile>,
    goal: &MeetingGoal,
    requester: &RequesterContext,
) -> BriefPrompt {
    BriefPrompt {
        system: system_instruction(),
        user: user_message(target, user_profile, goal, requester),
    }
}

fn system_instruction() -> String {
    concat!(
        "You are a meeting-preparation assistant. Given a LinkedIn profile and a ",
        "meeting goal, produce a concise pre-meeting brief. Respond with a single ",
        "JSON object and nothing else, using exactly these keys:\n",
        "  \"summary\": string — 2-3 sentence read on who this person is,\n",
        "  \"talking_points\": array of strings,\n",
        "  \"common_ground\": array of strings (shared background with the requester),\n",
        "  \"icebreaker\": string — one natural opening line,\n",
        "  \"questions\": array of strings — questions worth asking,\n",
        "  \"personality_insights\": array of strings,\n",
        "  \"communication_style\": string,\n",
        "  \"rapport_tips\": array of strings,\n",
        "  \"potential_challenges\": array of strings,\n",
        "  \"meeting_strategy\": string,\n",
        "  \"follow_up_hooks\": array of strings,\n",
        "  \"linkedin_dm_template\": string,\n",
        "  \"email_template\": string.\n",
        "Ground every claim in the supplied profile data. Do not invent facts."
    )
    .to_string()
}

fn user_message(
    target: &Profile,
    user_profile: Option<&Profile>,
    goal: &MeetingGoal,
    requester: &RequesterContext,
) -> String {
    let mut msg = String::new();

    let _ = writeln!(msg, "MEETING GOAL: {}", goal_phrase(goal));
    msg.push('\n');

    if requester.name.is_some() || requester.company.is_some() || requester.role.is_some() {
        msg.push_str("REQUESTER:\n");
        if let Some(name) = &requester.name {
            let _ = writeln!(msg, "- Name: {}", name);
        }
        if let Some(role) = &requester.role {
            let _ = writeln!(msg, "- Role: {}", role);
        }
        if let Some(company) = &requester.company {
            let _ = writeln!(msg, "- Company: {}", company);
        }
        msg.push('\n');
    }

    msg.push_str("TARGET PROFILE:\n");
    profile_section(&mut msg, target, true);

    if let Some(own) = user_profile {
        msg.push_str("\nREQUESTER'S OWN PROFILE (for common ground):\n");
        profile_section(&mut msg, own, false);
    }

    msg
}

fn profile_section(msg: &mut String, profile: &Profile, include_engagement: bool) {
    let _ = writeln!(msg, "- Name: {}", profile.full_name);
    if let Some(headline) = &profile.headline {
        let _ = writeln!(msg, "- Headline: {}", headline);
    }
    if let Some(location) = profile.display_location() {
        let _ = writeln!(msg, "- Location: {}", location);
    }
    if let Some(summary) = &profile.summary {
        let _ = writeln!(msg, "- About: {}", truncate_str(summary, 600));
    }
    if profile.open_to_work {
        msg.push_str("- Currently open to work\n");
    }

    if !profile.experiences.is_empty() {
        msg.push_str("- Experience:\n");
        for exp in profile.experiences.iter().take(MAX_EXPERIENCES) {
            let span = match (&exp.starts_at, &exp.ends_at) {
                (Some(s), Some(e)) => format!(" ({}-{})", s.year, e.year),
                (Some(s), None) => format!(" ({}-present)", s.year),
                _ => String::new(),
            };
            let _ = writeln!(msg, "    {} at {}{}", exp.title, exp.company, span);
        }
    }

    if !profile.education.is_empty() {
        msg.push_str("- Education:\n");
        for edu in &profile.education {
            let degree = edu.degree_name.as_deref().unwrap_or("Studied");
            let _ = writeln!(msg, "    {} — {}", degree, edu.school);
        }
    }

    if !profile.skills.is_empty() {
        let skills: Vec<&str> = profile
            .skills
            .iter()
            .take(MAX_SKILLS)
            .map(String::as_str)
            .collect();
        let _ = writeln!(msg, "- Skills: {}", skills.join(", "));
    }

    if !include_engagement {
        return;
    }

    if !profile.activities.is_empty() {
        msg.push_str("- Recent posts:\n");
        for post in profile.activities.iter().take(MAX_POSTS) {
            let _ = writeln!(msg, "    [{}] {}", post.activity_status, post.title);
        }
    }
    if !profile.comments.is_empty() {
        msg.push_str("- Recent comments:\n");
        for comment in profile.comments.iter().take(MAX_POSTS) {
            let _ = writeln!(msg, "    {}", truncate_str(&comment.text, 200));
        }
    }
    if !profile.recommendations.is_empty() {
        msg.push_str("- Recommendations received:\n");
        for rec in profile.recommendations.iter().take(3) {
            let _ = writeln!(
                msg,
                "    \"{}\" — {}",
                truncate_str(&rec.text, 200),
                rec.recommender_name
            );
        }
    }
}

fn goal_phrase(goal: &MeetingGoal) -> String {
    match goal {
        MeetingGoal::Sales => "a sales conversation".to_string(),
        MeetingGoal::Hiring => "a hiring conversation".to_string(),
        MeetingGoal::Partnership => "exploring a partnership".to_string(),
        MeetingGoal::Networking => "a networking meeting".to_string(),
        MeetingGoal::Fundraising => "a fundraising pitch".to_string(),
        MeetingGoal::Custom(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Experience;

    fn target() -> Profile {
        Profile {
            full_name: "Dana Reyes".into(),
            headline: Some("CTO at Northwind".into()),
            city: Some("Berlin".into()),
            experiences: vec![Experience {
                company: "Northwind".into(),
                title: "CTO".into(),
                ..Default::default()
            }],
            skills: vec!["Rust".into(), "Distributed systems".into()],
            ..Default::default()
        }
    }

    #[test]
    fn prompt_carries_goal_and_target() {
        let prompt = build_prompt(
            &target(),
            None,
            &MeetingGoal::Custom("discuss the migration project".into()),
            &RequesterContext::default(),
        );
        assert!(prompt.user.contains("discuss the migration project"));
        assert!(prompt.user.contains("Dana Reyes"));
        assert!(prompt.user.contains("CTO at Northwind"));
        assert!(prompt.system.contains("talking_points"));
    }

    #[test]
    fn own_profile_included_for_common_ground() {
        let own = Profile {
            full_name: "Sam Ortiz".into(),
            ..Default::default()
        };
        let prompt = build_prompt(
            &target(),
            Some(&own),
            &MeetingGoal::Networking,
            &RequesterContext {
                name: Some("Sam Ortiz".into()),
                company: Some("Initech".into()),
                role: None,
            },
        );
        assert!(prompt.user.contains("common ground"));
        assert!(prompt.user.contains("Sam Ortiz"));
        assert!(prompt.user.contains("Initech"));
    }
}
