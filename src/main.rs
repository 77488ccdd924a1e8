use clap::{Parser, Subcommand};
use imagemill_core::CoreConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "imagemill")]
#[command(about = "A service that derives stored image variants from a single upload")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the imagemill server
    Serve {
        /// Server host address
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },
    /// List the output formats the transform engine can encode
    Formats,
}

#[tokio::main]
async fn main() -> Result<(), ImagemillError> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            serve_command(config, host, port).await?;
        }
        Commands::Formats => {
            for format in imagemill_core::transform::supported_formats() {
                println!("{}", format);
            }
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(config_path: Option<&std::path::Path>) -> Result<CoreConfig, ConfigError> {
    use figment::{
        providers::{Env, Format, Serialized, Toml},
        Figment,
    };

    let mut figment = Figment::from(Serialized::defaults(CoreConfig::default()));

    // Load from config file if provided, else try default locations
    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    } else {
        figment = figment
            .merge(Toml::file("imagemill.toml"))
            .merge(Toml::file("config/imagemill.toml"));
    }

    // Override with environment variables
    figment = figment.merge(Env::prefixed("IMAGEMILL_").split("__"));

    figment.extract().map_err(ConfigError::Figment)
}

async fn serve_command(
    mut config: CoreConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), ImagemillError> {
    // CLI arguments win over file and environment configuration
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!(
        "Starting imagemill server on {}:{}",
        config.server.host, config.server.port
    );

    let server = imagemill_server::Server::new(config)
        .await
        .map_err(|e| ImagemillError::Server(format!("Server initialization failed: {}", e)))?;

    server
        .serve()
        .await
        .map_err(|e| ImagemillError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ImagemillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Figment error: {0}")]
    Figment(#[from] figment::Error),
}
