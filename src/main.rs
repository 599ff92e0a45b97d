use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitepulse::config::{LogFormat, MonitorConfig};

#[derive(Parser)]
#[command(
    name = "sitepulse",
    about = "Periodic HTTP uptime probe with a JSON status API",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service (API server + scheduler)
    Serve {
        /// TOML config file (falls back to $SITEPULSE_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address, overrides [server] host and port
        #[arg(long)]
        bind: Option<String>,

        /// Target URL, overrides [target] url
        #[arg(long)]
        target: Option<String>,
    },

    /// Probe the target once and print the result
    Check {
        /// TOML config file (falls back to $SITEPULSE_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// URL to probe instead of the configured target
        #[arg(long)]
        url: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(config: &MonitorConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn log_config_source(source: Option<&Path>) {
    match source {
        Some(path) => tracing::info!(path = %path.display(), "Loaded monitor configuration"),
        None => tracing::debug!("No config file given, using compiled-in defaults"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            target,
        } => {
            let (mut config, source) = MonitorConfig::resolve(config.as_deref())?;
            if let Some(bind) = bind {
                let (host, port) = bind
                    .rsplit_once(':')
                    .with_context(|| format!("bind address '{}' is not host:port", bind))?;
                config.server.host = host.to_string();
                config.server.port = port
                    .parse()
                    .with_context(|| format!("invalid port in bind address '{}'", bind))?;
            }
            if let Some(target) = target {
                config.target.url = target;
            }
            config.validate()?;

            init_tracing(&config);
            log_config_source(source.as_deref());
            tracing::info!(bind = %config.bind_addr(), "Starting SitePulse service");
            sitepulse::serve(config).await?;
        }
        Commands::Check { config, url, json } => {
            let (config, source) = MonitorConfig::resolve(config.as_deref())?;
            init_tracing(&config);
            log_config_source(source.as_deref());

            let result = sitepulse::check_once(&config, url.as_deref()).await?;
            if json {
                let envelope = serde_json::json!({
                    "success": true,
                    "message": "Website check completed",
                    "result": result,
                    "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                });
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                println!("{:<8} {}", result.outcome.to_string(), result.message);
            }
        }
    }

    Ok(())
}
