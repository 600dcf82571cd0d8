//! domainlens - domain intelligence lookups
//!
//! Prints certificate-transparency history and popularity-ranked domain
//! suggestions, or serves them as a JSON API.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use domainlens::{
    cli::{Cli, Command},
    config::Config,
    core::LookupRequest,
    formatting::formatter_for,
    internal_metrics,
    server,
    services::Services,
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_logging("info");
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };
    init_logging(&config.log_level);

    if let Err(err) = run(cli, config).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout only carries results.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let services = Services::from_config(&config)?;
    let formatter = formatter_for(config.output.format);

    match command {
        Command::Certs { domain } => {
            let recording = services.recorder.record(LookupRequest {
                domain: domain.clone(),
                ip: "127.0.0.1".to_string(),
                user_agent: Some(concat!("domainlens-cli/", env!("CARGO_PKG_VERSION")).to_string()),
                is_bot: false,
            });
            let certificates = services.certificates.lookup(&domain).await;
            // Let the background write finish before the runtime goes away.
            if let Some(handle) = recording {
                handle.await.ok();
            }
            println!("{}", formatter.format_certificates(&certificates?));
        }
        Command::Suggest { query } => {
            let suggestions = services.suggestions.suggest(&query).await?;
            println!("{}", formatter.format_domains(&suggestions));
        }
        Command::Top { count } => {
            let domains = services.suggestions.top_domains(count).await?;
            println!("{}", formatter.format_domains(&domains));
        }
        Command::Serve { .. } => {
            info!("-------------------- Configuration --------------------");
            info!("Log Level: {}", config.log_level);
            info!("Certificate Search: {}", config.certificates.base_url);
            info!("Failure Policy: {:?}", config.certificates.failure_policy);
            info!(
                "Analytics: {}",
                if config.analytics.is_some() {
                    "Enabled"
                } else {
                    "Disabled"
                }
            );
            info!("Metrics Endpoint: {}", config.server.metrics_enabled);
            info!("-------------------------------------------------------");

            let prometheus = if config.server.metrics_enabled {
                Some(internal_metrics::install_prometheus_recorder()?)
            } else {
                None
            };

            let listener = TcpListener::bind(&config.server.listen_addr).await?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let server_task = tokio::spawn(server::serve(
                listener,
                server::router(services, prometheus),
                shutdown_rx,
            ));

            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received. Shutting down gracefully...");
            shutdown_tx.send(true).ok();
            server_task.await??;
        }
    }
    Ok(())
}
