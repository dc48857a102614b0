use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use temperature_core::{Config, TemperatureService};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "temperature-server", version, about = "Temperature by CEP over HTTP")]
pub struct Cli {
    /// Address to listen on, e.g. "127.0.0.1:8080". Overrides config and TEMPERATURE_BIND.
    #[arg(long)]
    pub bind: Option<String>,

    /// Config file; defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }

        if config.api_key().is_none() {
            warn!("WEATHER_API_KEY is not set; temperature requests will fail until it is");
        }

        let service = TemperatureService::from_config(&config);
        let app = routes::router(service).layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(config.server.bind.as_str())
            .await
            .with_context(|| format!("Failed to bind {}", config.server.bind))?;

        info!(bind = %config.server.bind, "listening; try /temperature?cep=35620-000");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server terminated with an error")
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
