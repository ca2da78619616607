//! gemini-relay - single-endpoint chat relay for the Gemini API
//!
//! Accepts `POST /chat {"message"}`, forwards the message to a pinned Gemini
//! model and answers `{"reply"}`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gemini_relay::config::{Config, RawConfig};
use gemini_relay::relay::run_server;

#[derive(Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Single-endpoint chat relay for the Gemini API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server (default)
    Serve {
        /// Path to configuration file (defaults to ./relay.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate configuration and credential
    Check {
        /// Path to configuration file (defaults to ./relay.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(raw: &RawConfig) {
    let default_filter = format!("gemini_relay={},tower_http=info", raw.log_level());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already carry the key.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve {
        config: None,
        listen: None,
    });

    match command {
        Commands::Serve { config, listen } => {
            let mut raw = Config::load_raw(config.as_deref()).context("Loading configuration")?;
            init_tracing(&raw);

            if let Some(addr) = listen {
                tracing::info!(listen = %addr, "Override listen address");
                raw = raw.with_listen(addr);
            }

            let (config, key_source) = Config::from_raw(raw).map_err(|e| {
                tracing::error!(error = %e, "Invalid configuration");
                e
            })?;
            tracing::info!(source = %key_source, "API key loaded");

            run_server(config).await
        }

        Commands::Check { config } => {
            let raw = Config::load_raw(config.as_deref()).context("Loading configuration")?;
            init_tracing(&raw);

            let (config, key_source) = Config::from_raw(raw)?;
            println!("Configuration OK");
            println!("  listen:     {}", config.server.listen);
            println!("  base_url:   {}", config.upstream.base_url);
            println!("  model:      {}", config.upstream.model);
            println!("  api_key:    {} ({})", config.upstream.api_key, key_source);
            match config.upstream.timeout_secs {
                Some(secs) => println!("  timeout:    {}s", secs),
                None => println!("  timeout:    none"),
            }
            println!("  error_mode: {:?}", config.relay.error_mode);
            Ok(())
        }
    }
}
