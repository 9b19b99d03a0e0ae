mod anthropic;
mod error;
mod openai_compatible;

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

pub use anthropic::AnthropicProvider;
pub use error::{ProviderError, ProviderErrorKind};
pub use openai_compatible::OpenAiCompatibleProvider;

use crate::types::{EnhancedInsights, GeneratedBrief};

pub(crate) fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {}", e))
}

/// Parse a provider's text output into the fixed brief schema.
///
/// Models occasionally wrap JSON in markdown fences or add prose around it;
/// we extract the outermost JSON object before parsing. A required field
/// that is absent or has the wrong type is a `Malformed` provider error so
/// the orchestrator can fall back instead of persisting partial content.
pub(crate) fn parse_brief_json(raw: &str) -> Result<GeneratedBrief, ProviderError> {
    let json_text = extract_json_object(raw)
        .ok_or_else(|| ProviderError::malformed("no JSON object in provider output"))?;
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| ProviderError::malformed(format!("invalid JSON in provider output: {}", e)))?;

    let summary = required_string(&value, "summary")?;
    let talking_points = required_string_list(&value, "talking_points")?;
    let common_ground = required_string_list(&value, "common_ground")?;
    let icebreaker = required_string(&value, "icebreaker")?;
    let questions = required_string_list(&value, "questions")?;

    Ok(GeneratedBrief {
        summary,
        talking_points,
        common_ground,
        icebreaker,
        questions,
        insights: EnhancedInsights {
            personality_insights: optional_string_list(&value, "personality_insights"),
            communication_style: optional_string(&value, "communication_style"),
            rapport_tips: optional_string_list(&value, "rapport_tips"),
            potential_challenges: optional_string_list(&value, "potential_challenges"),
            meeting_strategy: optional_string(&value, "meeting_strategy"),
            follow_up_hooks: optional_string_list(&value, "follow_up_hooks"),
            linkedin_dm_template: optional_string(&value, "linkedin_dm_template"),
            email_template: optional_string(&value, "email_template"),
        },
    })
}

/// Slice from the first `{` to the last `}` — tolerates fences and prose.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

fn required_string(value: &Value, key: &str) -> Result<String, ProviderError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::malformed(format!("missing required field '{}'", key)))
}

fn required_string_list(value: &Value, key: &str) -> Result<Vec<String>, ProviderError> {
    let items = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::malformed(format!("missing required field '{}'", key)))?;
    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn optional_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"{
        "summary": "VP of Engineering at Acme, ex-founder.",
        "talking_points": ["Scaling the platform team", "Their recent keynote"],
        "common_ground": ["Both worked in fintech"],
        "icebreaker": "Ask about the conference talk.",
        "questions": ["What is the team's biggest bottleneck?"],
        "communication_style": "direct",
        "rapport_tips": ["Lead with data"]
    }"#;

    #[test]
    fn parses_complete_output() {
        let brief = parse_brief_json(COMPLETE).unwrap();
        assert_eq!(brief.talking_points.len(), 2);
        assert_eq!(brief.insights.communication_style.as_deref(), Some("direct"));
        assert!(brief.insights.email_template.is_none());
    }

    #[test]
    fn tolerates_markdown_fences() {
        let fenced = format!("```json\n{}\n```", COMPLETE);
        assert!(parse_brief_json(&fenced).is_ok());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let raw = r#"{"summary": "x", "talking_points": [], "common_ground": [], "questions": []}"#;
        let err = parse_brief_json(raw).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
        assert!(err.message.contains("icebreaker"));
    }

    #[test]
    fn empty_summary_is_malformed() {
        let raw = r#"{"summary": "  ", "talking_points": [], "common_ground": [],
                      "icebreaker": "hi", "questions": []}"#;
        assert!(parse_brief_json(raw).is_err());
    }

    #[test]
    fn non_json_output_is_malformed() {
        let err = parse_brief_json("I'm sorry, I can't help with that.").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }
}
