mod auth;
mod config;
mod error;
mod generation;
mod handlers;
mod linkedin;
mod prompt;
mod providers;
mod quota;
mod server;
mod store;
mod traits;
mod types;
pub mod utils;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::generation::Orchestrator;
use crate::handlers::AppContext;
use crate::linkedin::{ProfileFetcher, RapidApiLinkedIn};
use crate::providers::{AnthropicProvider, OpenAiCompatibleProvider};
use crate::server::AppState;
use crate::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("prereq {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("prereq {}", env!("CARGO_PKG_VERSION"));
                println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
                println!("Usage: prereq [OPTIONS]\n");
                println!("Options:");
                println!("  -h, --help       Print help");
                println!("  -V, --version    Print version");
                println!("\nConfiguration is read from config.toml; API keys may");
                println!("also come from RAPIDAPI_KEY, ANTHROPIC_API_KEY, and");
                println!("GROQ_API_KEY in the environment or a .env file.");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}. Try --help.", other);
                std::process::exit(2);
            }
        }
    }

    let config_path = PathBuf::from("config.toml");
    let config = Arc::new(AppConfig::load(&config_path)?);

    let store = SqliteStore::new(&config.state.db_path).await?;

    let linkedin = RapidApiLinkedIn::new(&config.linkedin)?;
    let fetcher = ProfileFetcher::new(Arc::new(linkedin));

    let ai_timeout = std::time::Duration::from_secs(config.ai.timeout_secs);
    let primary = AnthropicProvider::new(
        &config.ai.anthropic.api_key,
        &config.ai.anthropic.model,
        ai_timeout,
    )?;
    let fallback = OpenAiCompatibleProvider::new(
        &config.ai.fallback.base_url,
        &config.ai.fallback.api_key,
        &config.ai.fallback.model,
        "groq",
        ai_timeout,
    )?;
    let orchestrator = Orchestrator::new(Arc::new(primary), Arc::new(fallback));

    let identity = Arc::new(auth::HttpIdentityProvider::new(&config.identity)?);

    let state = AppState {
        ctx: Arc::new(AppContext {
            store,
            fetcher,
            orchestrator,
            config: config.clone(),
        }),
        identity,
    };

    server::serve(state, &config.server.bind_addr).await
}
