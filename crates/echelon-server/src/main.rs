//! Image Echelon command line.
//!
//! - `serve`: HTTP server with the comparison API, CSV downloads and the
//!   WebSocket outcome feed
//! - `init`: create the store from a directory of images
//! - `reports`: write the ranking and detail reports as TSV files
//! - `audit`: replay the ledger and report rating drift

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echelon_core::db::open_existing;
use echelon_core::{Echelon, EchelonConfig};
use echelon_server::{build_router, commands, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-echelon")]
#[command(about = "Rank images by pairwise comparison", version)]
struct Cli {
    /// Configuration file (default: $IMAGE_ECHELON_SETTINGS or echelon.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the store from a directory of images
    Init {
        /// Directory to scan for png/jpg/jpeg files
        #[arg(long)]
        image_dir: Option<PathBuf>,
        /// Store file to create
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write rankings_report.tsv and detail_results.tsv
    Reports {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Replay the ledger and compare with stored ratings
    Audit {
        /// Number of ranked items to print
        #[arg(short, long, default_value = "10")]
        top: usize,
        /// Drift below this is not reported
        #[arg(long, default_value = "0.0001")]
        tolerance: f64,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EchelonConfig> {
    let config = match path {
        Some(path) => EchelonConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EchelonConfig::load().context("Failed to load config")?,
    };
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(config.resolve_paths(&cwd))
}

fn open_echelon(config: &EchelonConfig) -> Result<Echelon> {
    let db = open_existing(&config.db).with_context(|| {
        format!(
            "Failed to open store at {} (run `image-echelon init` first)",
            config.db.display()
        )
    })?;
    Ok(Echelon::new(db, &config.rating))
}

async fn serve(mut config: EchelonConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let db = open_existing(&config.db)
        .with_context(|| format!("Failed to open store at {}", config.db.display()))?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let app = build_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Init { image_dir, db } => {
            let summary = commands::init(&config, image_dir.as_deref(), db.as_deref())
                .context("Initialization failed")?;
            for path in &summary.skipped {
                println!("Skipped {}", path.display());
            }
            println!("Created {} items", summary.created.len());
            Ok(())
        }
        Commands::Reports { out_dir } => {
            let echelon = open_echelon(&config)?;
            let (ranking, detail) = commands::write_reports(&echelon, &out_dir)
                .context("Failed to write reports")?;
            println!("Wrote {} and {}", ranking.display(), detail.display());
            Ok(())
        }
        Commands::Audit { top, tolerance } => {
            let echelon = open_echelon(&config)?;
            let report = commands::run_audit(&echelon, &config).context("Audit failed")?;
            print!("{}", commands::format_audit(&report, top, tolerance));
            Ok(())
        }
    }
}
