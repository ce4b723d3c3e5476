use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use hookline_db::Database;
use hookline_engine::{Engine, EngineConfig};
use hookline_llm::{
    BackendError, CompletionRequest, GenerativeBackend, HttpLlmClient, LlmConfig,
};
use hookline_types::{
    GenerationRequest, ModelClass, Objective, Personalization, Platform, SafetyLevel,
    SubscriptionStatus, Tier,
};

#[derive(Parser)]
#[command(name = "hookline", about = "Hook generation engine operator tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one generation for a user and print the outcome
    Generate(GenerateArgs),
    /// List a user's generation history
    History(PageArgs),
    /// List a user's favorite hooks
    Favorites(PageArgs),
    /// Set a user's subscription tier and status
    Grant(GrantArgs),
    /// Set a user's brand context (voice, audience, banned terms)
    Brand(BrandArgs),
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    platform: String,
    #[arg(long)]
    objective: String,
    #[arg(long)]
    topic: String,
    #[arg(long)]
    model_class: Option<String>,
}

#[derive(Args)]
struct PageArgs {
    #[arg(long)]
    user: String,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Args)]
struct GrantArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    tier: String,
    #[arg(long, default_value = "active")]
    status: String,
}

#[derive(Args)]
struct BrandArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    #[arg(long)]
    voice: Option<String>,
    #[arg(long)]
    audience: Option<String>,
    #[arg(long, default_value = "standard")]
    safety: String,
    /// Comma-separated list of terms the generator must avoid
    #[arg(long)]
    banned_terms: Option<String>,
}

/// Backend stand-in for subcommands that never generate. Reaching it is a
/// wiring bug, so it fails loudly instead of calling anything.
struct OfflineBackend;

impl GenerativeBackend for OfflineBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
        Err(BackendError::EmptyResponse)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookline=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Config
    let db_path = std::env::var("HOOKLINE_DB_PATH").unwrap_or_else(|_| "hookline.db".into());
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    let mut config = EngineConfig::default();
    config.limits.apply_env_overrides();

    match cli.command {
        Command::Generate(args) => {
            let llm_config = LlmConfig::from_env()
                .context("HOOKLINE_LLM_API_KEY is not set; the generate command needs a backend")?;
            let backend = HttpLlmClient::new(llm_config)?;
            let engine = Engine::new(db, backend, config);

            let request = GenerationRequest {
                user_id: args.user,
                platform: Platform::parse(&args.platform)
                    .ok_or_else(|| anyhow!("unknown platform '{}'", args.platform))?,
                objective: Objective::parse(&args.objective)
                    .ok_or_else(|| anyhow!("unknown objective '{}'", args.objective))?,
                topic: args.topic,
                requested_model_class: match args.model_class.as_deref() {
                    Some(raw) => Some(
                        ModelClass::parse(raw)
                            .ok_or_else(|| anyhow!("unknown model class '{}'", raw))?,
                    ),
                    None => None,
                },
            };

            let success = engine.generate(request).await?;
            println!("{}", serde_json::to_string_pretty(&success)?);
        }
        Command::History(args) => {
            let engine = Engine::new(db, OfflineBackend, config);
            let records = engine
                .list_generations(&args.user, args.page, args.limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Favorites(args) => {
            let engine = Engine::new(db, OfflineBackend, config);
            let favorites = engine
                .list_favorites(&args.user, args.page, args.limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&favorites)?);
        }
        Command::Grant(args) => {
            let engine = Engine::new(db, OfflineBackend, config);
            let tier = Tier::parse(&args.tier)
                .ok_or_else(|| anyhow!("unknown tier '{}'", args.tier))?;
            let status = SubscriptionStatus::parse(&args.status)
                .ok_or_else(|| anyhow!("unknown status '{}'", args.status))?;

            engine.set_tier(&args.user, tier, status).await?;
            info!(user = %args.user, tier = tier.as_str(), status = status.as_str(), "entitlement updated");

            let entitlement = engine.entitlement(&args.user).await?;
            println!("{}", serde_json::to_string_pretty(&entitlement)?);
        }
        Command::Brand(args) => {
            let engine = Engine::new(db, OfflineBackend, config);
            let personalization = Personalization {
                company: args.company,
                industry: args.industry,
                brand_voice: args.voice,
                audience: args.audience,
                safety: Some(SafetyLevel::parse_lenient(&args.safety)),
                banned_terms: args
                    .banned_terms
                    .as_deref()
                    .map(|raw| {
                        raw.split(',')
                            .map(|term| term.trim().to_string())
                            .filter(|term| !term.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            };

            engine.set_personalization(&args.user, personalization).await?;
            info!(user = %args.user, "brand context updated");

            let entitlement = engine.entitlement(&args.user).await?;
            println!("{}", serde_json::to_string_pretty(&entitlement)?);
        }
    }

    Ok(())
}
