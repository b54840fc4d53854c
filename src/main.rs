//! Barangay Registry daemon
//!
//! ## Usage
//!
//! ```bash
//! # Start the API with defaults
//! barangay-registry
//!
//! # Custom data directory and port
//! barangay-registry --data-dir /srv/brgy serve --http-port 9000
//!
//! # Local development without tokens
//! barangay-registry --dev serve
//!
//! # Wipe and load demo data
//! barangay-registry seed --seed 7
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use barangay_registry::seed::{self, SeedOptions, DEFAULT_PASSWORD, DEFAULT_SEED};
use barangay_registry::services::spawn_logging_listener;
use barangay_registry::{Config, Database, EventBus, HttpServer, Services};

#[derive(Parser, Debug)]
#[command(name = "barangay-registry")]
#[command(about = "Records service for barangay administration")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "BARANGAY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the database and config
    #[arg(long, env = "BARANGAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Session token secret
    #[arg(long, env = "BARANGAY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Development mode: API calls without a token are allowed
    #[arg(long, env = "BARANGAY_DEV_MODE")]
    dev: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "BARANGAY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// HTTP API port
        #[arg(long, env = "BARANGAY_HTTP_PORT")]
        http_port: Option<u16>,

        /// Interface to bind
        #[arg(long, env = "BARANGAY_BIND_HOST")]
        bind_host: Option<String>,

        /// Refuse expenses past a project's total cost
        #[arg(long, env = "BARANGAY_STRICT_BUDGET")]
        strict_budget: bool,
    },
    /// Replace every record with generated demo data
    Seed {
        /// RNG seed; the same seed produces the same records
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Number of households to create
        #[arg(long, default_value_t = 24)]
        households: usize,

        /// Password for every seeded account
        #[arg(long, env = "BARANGAY_SEED_PASSWORD", default_value = DEFAULT_PASSWORD)]
        password: String,
    },
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("barangay_registry=info".parse()?);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json)?;

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(secret) = args.jwt_secret {
        config.jwt_secret = secret;
    }
    if args.dev {
        config.dev_mode = true;
    }
    let command = args.command.unwrap_or(Command::Serve {
        http_port: None,
        bind_host: None,
        strict_budget: false,
    });
    if let Command::Serve {
        http_port,
        ref bind_host,
        strict_budget,
    } = command
    {
        if let Some(port) = http_port {
            config.http_port = port;
        }
        if let Some(host) = bind_host {
            config.bind_host = host.clone();
        }
        config.strict_budget |= strict_budget;
    }

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;

    // Save default config if it doesn't exist
    let config_path = config.config_path();
    if args.config.is_none() && !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    config.validate()?;
    if config.dev_mode {
        warn!("Dev mode is on: API requests without a token are treated as super admin");
    }

    let db = Arc::new(Database::open(&config)?);
    let events = Arc::new(EventBus::new());
    let listener = spawn_logging_listener(events.clone());

    match command {
        Command::Seed {
            seed: seed_value,
            households,
            password,
        } => {
            let options = SeedOptions {
                seed: seed_value,
                households,
                password,
                ..Default::default()
            };
            let summary = seed::run(&db, &events, &options)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Serve { .. } => {
            info!(
                data_dir = %config.data_dir.display(),
                database = %config.database_path().display(),
                http_port = config.http_port,
                "Starting barangay-registry"
            );

            let addr: SocketAddr = format!("{}:{}", config.bind_host, config.http_port)
                .parse()
                .context("invalid bind address")?;
            let services = Arc::new(Services::with_events(db.clone(), Arc::new(config), events)?);
            let server = Arc::new(HttpServer::new(services, addr));

            info!("HTTP API available at http://{}", addr);
            info!("Press Ctrl+C to stop.");

            let shutdown = async {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down...");
            };

            tokio::select! {
                result = server.run() => {
                    if let Err(e) = result {
                        error!(error = %e, "HTTP server error");
                    }
                }
                _ = shutdown => {}
            }

            if let Ok(stats) = db.stats() {
                info!(
                    households = stats.households,
                    residents = stats.residents,
                    certificates = stats.certificates,
                    "Final record counts"
                );
            }
        }
    }

    listener.abort();
    Ok(())
}
