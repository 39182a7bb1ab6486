//! # Checker Binary Entry Point
//!
//! Thin wrapper that loads configuration, builds the pipeline and serves it.
//!
//! ## Usage
//!
//! ```bash
//! CLASSIFICATION_API_KEY=... MATCH_ALLOWLIST=marmot,groundhog STORAGE_HOST=localhost:11113 \
//!     cargo run --bin marmot-checker -- --config config/checker.toml
//! ```
//!
//! Startup fails with a non-zero exit when a required setting is missing.
//! After that, a failing upload only fails its own request.

use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;
use std::sync::Arc;

use marmot_checker::server::router;
use marmot_checker::{CheckerConfig, CheckerPipeline};

/// Command-line arguments for the checker binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on (overrides MARMOT_LISTEN_ADDR and the file)
    #[arg(short, long)]
    listen: Option<String>,
}

/// Initialize logging as `[HH:MM:SS] [LEVEL] message`.
///
/// INFO by default; `RUST_LOG` overrides the level.
fn init_logger() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    info!("🚀 Initializing marmot checker");

    let mut config = CheckerConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }

    info!("🔎 Allow-list: {}", config.allow_list);
    info!("📦 Storage service: {}", config.storage.base_url);

    let pipeline = Arc::new(CheckerPipeline::from_config(&config)?);
    let app = router(pipeline, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    info!("🌐 Listening on http://{}", config.server.listen_addr);
    info!("📡 Upload endpoint: POST /postImage/<any>/<filename>");

    axum::serve(listener, app).await?;

    Ok(())
}
