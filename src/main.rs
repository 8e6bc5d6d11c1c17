use std::path::PathBuf;

use clap::Parser;
use entra_scim::{
    AppState, build_app,
    config::{DEFAULT_CONFIG_TEMPLATE, MIN_RECOMMENDED_TOKEN_LEN, ProvisioningConfig},
    observability,
};

/// Config file used when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "entra-scim.toml";

/// CLI arguments for the Entra ID SCIM provisioning server
#[derive(Parser, Debug)]
#[command(version, about = "SCIM 2.0 provisioning server for Microsoft Entra ID", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./entra-scim.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the provisioning server (default)
    Serve,
    /// Initialize a new configuration file
    Init {
        /// Path to create the config file (defaults to ./entra-scim.toml)
        #[arg(short, long)]
        output: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Init { output, force }) => {
            run_init(output, force);
        }
        Some(Command::Serve) | None => {
            run_server(args.config.as_deref()).await;
        }
    }
}

/// Write the default configuration file.
fn run_init(output: Option<String>, force: bool) {
    let output_path = PathBuf::from(output.unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string()));

    if output_path.exists() && !force {
        eprintln!(
            "Config file already exists: {}\nUse --force to overwrite.",
            output_path.display()
        );
        std::process::exit(1);
    }

    // Create parent directories if needed
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create directory {}: {}", parent.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = std::fs::write(&output_path, DEFAULT_CONFIG_TEMPLATE) {
        eprintln!("Failed to write config file: {}", e);
        std::process::exit(1);
    }

    println!("Created config file: {}", output_path.display());
    println!();
    println!("Set SCIM_BEARER_TOKEN to the secret token configured in Entra ID, then run:");
    println!("  entra-scim serve --config {}", output_path.display());
}

async fn run_server(explicit_config_path: Option<&str>) {
    let config_path = PathBuf::from(explicit_config_path.unwrap_or(DEFAULT_CONFIG_FILE));

    let config = match ProvisioningConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {}",
                config_path.display(),
                e
            );
            if explicit_config_path.is_none() {
                eprintln!("Run `entra-scim init` to create one.");
            }
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing::info!(
        config_file = %config_path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting Entra ID SCIM provisioning server"
    );
    if config.scim.has_short_token() {
        tracing::warn!(
            length = config.scim.bearer_token.len(),
            "scim.bearer_token is shorter than {} characters",
            MIN_RECOMMENDED_TOKEN_LEN
        );
    }

    let addr = config.server.bind_addr();
    let state = AppState::new(config.clone());
    let app = build_app(&config, state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, base_path = %config.scim.base_path, "Listening");

    // Graceful shutdown: wait for SIGINT/SIGTERM
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
