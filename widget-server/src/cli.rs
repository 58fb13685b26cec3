use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use widget_core::{Config, ProviderId, forecaster_from_config};

use crate::handlers;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "widget-server", version, about = "Weather widget web server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the index and widget pages.
    Serve(ServeArgs),

    /// Store the provider and API key in the config file.
    Configure,
}

/// Flags override the stored configuration.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// World Weather Online API key.
    #[arg(long, env = "WWO_API_KEY")]
    pub api_key: Option<String>,

    /// Directory holding the page templates and `layouts/`.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Directory served under `/static`.
    #[arg(long = "static")]
    pub static_dir: Option<PathBuf>,

    /// Forecast provider base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Forecast provider, "worldweatheronline" or "mock".
    #[arg(long)]
    pub provider: Option<String>,

    /// Upstream request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ServeArgs {
    pub fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(api_key) = self.api_key {
            config.set_api_key(api_key);
        }
        if let Some(templates) = self.templates {
            config.templates_dir = templates;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if self.provider.is_some() {
            config.provider = self.provider;
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve(args) => {
                let mut config = Config::load()?;
                args.apply(&mut config);
                serve(config).await
            }
            Command::Configure => configure(),
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let forecaster = forecaster_from_config(&config)?;
    tracing::info!(provider = %config.provider_id()?, "forecaster ready");

    // Every page is built before the listener exists.
    let renderer = handlers::build_renderer(&config.templates_dir)?;

    let state = handlers::AppState {
        renderer: Arc::new(renderer),
        forecaster: Arc::from(forecaster),
    };
    let app = handlers::router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!("Application serving on http://localhost:{} ...", config.port);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let provider = inquire::Select::new("Forecast provider:", ProviderId::all().to_vec())
        .prompt()
        .context("Provider selection cancelled")?;
    config.set_provider(provider);

    if provider.requires_api_key() {
        let api_key = inquire::Password::new("World Weather Online API key:")
            .without_confirmation()
            .prompt()
            .context("API key entry cancelled")?;
        config.set_api_key(api_key);
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.set_api_key("FROM_FILE".into());

        let cli = Cli::parse_from([
            "widget-server",
            "serve",
            "--port",
            "9090",
            "--api-key",
            "FROM_FLAG",
            "--templates",
            "elsewhere",
            "--provider",
            "mock",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        args.apply(&mut config);

        assert_eq!(config.port, 9090);
        assert_eq!(config.api_key(), Some("FROM_FLAG"));
        assert_eq!(config.templates_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.provider_id().unwrap(), ProviderId::Mock);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = Config::default();
        config.set_api_key("FROM_FILE".into());
        config.timeout_secs = Some(4);

        ServeArgs::default().apply(&mut config);

        assert_eq!(config.api_key(), Some("FROM_FILE"));
        assert_eq!(config.timeout_secs, Some(4));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn command_name_matches_binary() {
        use clap::CommandFactory;

        assert_eq!(Cli::command().get_name(), env!("CARGO_BIN_NAME"));
    }

    #[test]
    fn configure_takes_no_arguments() {
        let cli = Cli::try_parse_from(["widget-server", "configure"]).unwrap();
        assert!(matches!(cli.command, Command::Configure));
    }
}
