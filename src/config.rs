use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub state: StateConfig,
    pub linkedin: LinkedInConfig,
    pub ai: AiConfig,
    #[serde(default)]
    pub plans: PlanLimits,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "prereq.db".to_string()
}

/// Profile data provider (a RapidAPI-hosted LinkedIn scraper).
#[derive(Debug, Deserialize, Clone)]
pub struct LinkedInConfig {
    /// Falls back to the RAPIDAPI_KEY environment variable when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_linkedin_base_url")]
    pub base_url: String,
    #[serde(default = "default_linkedin_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_linkedin_base_url() -> String {
    "https://fresh-linkedin-scraper-api.p.rapidapi.com".to_string()
}

fn default_linkedin_timeout_secs() -> u64 {
    30
}

/// Generation providers: Anthropic is the primary, an OpenAI-compatible
/// endpoint (Groq by default) is the fallback.
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    pub anthropic: AnthropicConfig,
    pub fallback: FallbackConfig,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnthropicConfig {
    /// Falls back to the ANTHROPIC_API_KEY environment variable when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Falls back to the GROQ_API_KEY environment variable when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_fallback_base_url")]
    pub base_url: String,
    #[serde(default = "default_fallback_model")]
    pub model: String,
}

fn default_fallback_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_fallback_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

/// Monthly brief limits per plan tier. An unknown or missing plan resolves
/// to the free-tier limit.
#[derive(Debug, Deserialize, Clone)]
pub struct PlanLimits {
    #[serde(default = "default_free_limit")]
    pub free: u32,
    #[serde(default = "default_pro_limit")]
    pub pro: u32,
    #[serde(default = "default_team_limit")]
    pub team: u32,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: default_free_limit(),
            pro: default_pro_limit(),
            team: default_team_limit(),
        }
    }
}

fn default_free_limit() -> u32 {
    5
}
fn default_pro_limit() -> u32 {
    50
}
fn default_team_limit() -> u32 {
    200
}

impl PlanLimits {
    pub fn limit_for(&self, plan: &str) -> u32 {
        match plan {
            "pro" => self.pro,
            "team" => self.team,
            _ => self.free,
        }
    }
}

/// External identity provider endpoint. The service never verifies
/// credentials itself; it forwards the bearer token for verification.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub userinfo_url: String,
    #[serde(default = "default_identity_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_identity_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.fill_keys_from_env();
        Ok(config)
    }

    /// API keys may live in the environment (.env) instead of config.toml.
    fn fill_keys_from_env(&mut self) {
        if self.linkedin.api_key.is_empty() {
            if let Ok(key) = std::env::var("RAPIDAPI_KEY") {
                self.linkedin.api_key = key;
            }
        }
        if self.ai.anthropic.api_key.is_empty() {
            if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
                self.ai.anthropic.api_key = key;
            }
        }
        if self.ai.fallback.api_key.is_empty() {
            if let Ok(key) = std::env::var("GROQ_API_KEY") {
                self.ai.fallback.api_key = key;
            }
        }
    }
}
