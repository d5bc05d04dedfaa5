//! Crossborder LLM API server entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crossborder_llm::api::{create_router, AppState};
use crossborder_llm::config::Config;
use crossborder_llm::crawl::{HttpProductCrawler, JobStore};
use crossborder_llm::llm::{AzureOpenAiClient, ChatModel};
use crossborder_llm::metrics;
use crossborder_llm::utils::shutdown_signal;

/// Cross-border e-commerce LLM API.
#[derive(Parser, Debug)]
#[command(name = "crossborder-llm")]
#[command(about = "HTTP API for product crawling and LLM-driven influencer marketing")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Bind address (overrides HOST).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load()?;

    let filter = if args.verbose {
        EnvFilter::new("crossborder_llm=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    tracing_subscriber::registry()
        .with(args.json_logs.then(|| fmt::layer().json()))
        .with((!args.json_logs).then(fmt::layer))
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Serve { host, port }) => cmd_serve(config, host, port).await,
        None => cmd_serve(config, None, None).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CROSSBORDER LLM API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("  Bind address:     {}", config.bind_addr());
    println!("  Match threshold:  {}%", config.match_threshold);
    println!("  Crawl timeout:    {}s", config.crawl_timeout_secs);
    println!("  Crawl job TTL:    {}s", config.crawl_job_ttl_secs);

    print!("Checking LLM backend... ");
    match AzureOpenAiClient::from_config(config) {
        Ok(client) => {
            println!("OK");
            println!("  Deployment:       {}", client.model_id());
            println!("  Endpoint:         {}", client.endpoint());
        }
        Err(e) => {
            println!("NOT CONFIGURED");
            println!("  {}", e);
            println!("  Workflow endpoints will answer 503.");
        }
    }

    println!("======================================================================");
    Ok(())
}

/// Run the HTTP server until Ctrl-C / SIGTERM.
async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let prometheus = metrics::install_recorder()?;
    metrics::init_metrics();

    let model: Option<Arc<dyn ChatModel>> = match AzureOpenAiClient::from_config(&config) {
        Ok(client) => {
            info!(deployment = %client.model_id(), "LLM backend configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "LLM backend unavailable, workflow endpoints will answer 503");
            None
        }
    };

    let crawler = HttpProductCrawler::new(&config)?;
    let jobs = JobStore::new(Arc::new(crawler))
        .with_ttl(std::time::Duration::from_secs(config.crawl_job_ttl_secs));
    let state = AppState::new(model, jobs)
        .with_metrics(prometheus)
        .with_match_threshold(config.match_threshold);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(version = env!("CARGO_PKG_VERSION"), "HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
