//! # KB Search Server Main Driver
//!
//! ## Purpose
//! Main entry point for the KB search server. Wires configuration, the
//! article/pattern repositories, and the search service together, then runs
//! the web API until shutdown.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load the article corpus and trigger patterns
//! 4. Initialize the search service
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kb_search::{
    api::ApiServer,
    config::Config,
    engine::SearchService,
    errors::{Result, SearchError},
    repository::{InMemoryArticleRepository, InMemoryPatternRepository},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("kb-search-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Support Platform Team")
        .about("Knowledge-base search and ticket-pattern-matching engine")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting KB search server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    let app_state = initialize_components(config.clone()).await?;

    let server = ApiServer::new(app_state);

    info!(
        "KB search server started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
            warn!("Server stopped unexpectedly");
        }
    }

    info!("KB search server shut down");
    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|_| SearchError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Initialize repositories and the search service
async fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing components...");

    let articles = if config.corpus.articles_path.exists() {
        Arc::new(InMemoryArticleRepository::from_json_file(
            &config.corpus.articles_path,
        )?)
    } else {
        warn!(
            "Article corpus file not found: {:?}, starting with an empty corpus",
            config.corpus.articles_path
        );
        Arc::new(InMemoryArticleRepository::new(Vec::new()))
    };

    let patterns = if config.corpus.patterns_path.exists() {
        Arc::new(InMemoryPatternRepository::from_json_file(
            &config.corpus.patterns_path,
        )?)
    } else {
        warn!(
            "Pattern file not found: {:?}, starting with an empty pattern set",
            config.corpus.patterns_path
        );
        Arc::new(InMemoryPatternRepository::new(Vec::new()))
    };

    let service = Arc::new(SearchService::new(config.clone(), articles, patterns).await?);
    service.health_check().await?;
    info!("All components initialized successfully");

    Ok(AppState { config, service })
}
