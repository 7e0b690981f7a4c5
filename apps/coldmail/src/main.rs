mod config;
mod errors;
mod llm_client;
mod outreach;
mod portfolio;
mod routes;
mod scrape;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatModel, LlmClient};
use crate::outreach::{EmailComposer, JobExtractor, Pipeline};
use crate::portfolio::{LinkStore, PortfolioStore};
use crate::routes::build_router;
use crate::scrape::{clean_text, PageLoader};
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "coldmail", version, about = "Cold emails from careers pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate emails for one page and print them
    #[command(group(ArgGroup::new("source").required(true).args(["url", "file"])))]
    Generate {
        /// Careers page to scrape
        #[arg(long)]
        url: Option<String>,
        /// File holding page text that was already scraped
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{pkg}={level},tower_http={level}",
                pkg = env!("CARGO_PKG_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coldmail v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.groq_api_key.clone(),
        config.groq_model.clone(),
        config.groq_api_url.clone(),
    )?;
    info!(
        model = llm.model(),
        has_api_key = config.has_api_key(),
        "LLM client initialized"
    );
    let llm: Arc<dyn ChatModel> = Arc::new(llm);

    // Portfolio is loaded lazily by the first run
    let store = Arc::new(
        PortfolioStore::from_csv(&config.portfolio_path).with_max_links(config.portfolio_max_links),
    );

    let pipeline = Arc::new(
        Pipeline::new(
            store,
            JobExtractor::new(llm.clone()),
            EmailComposer::new(llm, config.persona.clone()),
        )
        .with_concurrency(config.compose_concurrency),
    );
    let loader = Arc::new(PageLoader::new(&config.user_agent)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, pipeline, loader).await,
        Command::Generate { url, file } => {
            generate_once(&config, &pipeline, &loader, url, file).await
        }
    }
}

async fn serve(config: &Config, pipeline: Arc<Pipeline>, loader: Arc<PageLoader>) -> Result<()> {
    // Warm the portfolio index; a failure here is retried on the first request
    match pipeline.store().load().await {
        Ok(outcome) => info!(?outcome, "Portfolio ready"),
        Err(e) => warn!("Portfolio not loaded at startup: {e}"),
    }

    let state = AppState {
        pipeline,
        loader,
        failure_policy: config.failure_policy,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate_once(
    config: &Config,
    pipeline: &Pipeline,
    loader: &PageLoader,
    url: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let text = match (url, file) {
        (Some(url), _) => loader.load(&url).await?,
        (None, Some(path)) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let cleaned = clean_text(&raw);
            if cleaned.is_empty() {
                anyhow::bail!("No content could be loaded from {}", path.display());
            }
            cleaned
        }
        (None, None) => anyhow::bail!("Either --url or --file is required"),
    };

    let report = pipeline
        .run_with_policy(&text, config.failure_policy)
        .await?;

    for (i, email) in report.emails.iter().enumerate() {
        if i > 0 {
            println!("\n{}\n", "-".repeat(72));
        }
        println!("{email}");
    }
    for failure in &report.failures {
        eprintln!(
            "Skipped posting {} ({}): {}",
            failure.index, failure.role, failure.message
        );
    }

    Ok(())
}
