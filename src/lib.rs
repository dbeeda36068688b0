pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, UserCommands};
pub use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Loads `.env` and the config file, applies environment overrides and
/// validates the result.
pub fn load_config() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let mut config = Config::load()?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    init_tracing(&config)?;

    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    match command {
        Commands::Serve => {
            let prometheus_handle = install_metrics(&config)?;
            run_server(config, prometheus_handle).await
        }

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Commands::Search { kind, query } => {
            cli::cmd_search(&config, &kind, &query.join(" ")).await
        }

        Commands::Top { kind, limit } => cli::cmd_top(&config, &kind, limit).await,

        Commands::Info { kind, id } => cli::cmd_title_info(&config, &kind, id).await,

        Commands::List {
            email,
            kind,
            status,
        } => cli::cmd_list_entries(&config, &email, kind.as_deref(), status.as_deref()).await,

        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                name,
                password,
            } => cli::cmd_user_create(config, &email, &name, &password).await,
            UserCommands::ApiKey { email } => cli::cmd_user_api_key(&config, &email).await,
        },
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn install_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Tsundoku v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let api_state = api::create_app_state(shared, prometheus_handle);

    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

fn print_help() {
    println!("Tsundoku v{}", env!("CARGO_PKG_VERSION"));
    println!("Personal anime and manga tracker");
    println!();
    println!("Usage: tsundoku <command>");
    println!();
    println!("Commands:");
    println!("  serve                          Start the HTTP API server");
    println!("  init                           Create default config file");
    println!("  search <anime|manga> <query>   Search the catalog");
    println!("  top <anime|manga>              Show the catalog ranking");
    println!("  info <anime|manga> <id>        Show catalog details for a title");
    println!("  list <email>                   List a user's entries");
    println!("  user create                    Create a verified account");
    println!("  user api-key <email>           Print an account's API key");
    println!();
    println!("Run 'tsundoku help <command>' for details.");
}
