//! StoryVet server binary

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use storyvet_common::{config, db};
use storyvet_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "storyvet")]
#[command(about = "User-story INVEST review service")]
struct Cli {
    /// Port for the HTTP API
    #[arg(short, long, default_value = "5740")]
    port: u16,

    /// Data directory holding the database (overrides env/config)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting StoryVet v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir.as_deref());
    let db_path = config::database_path(&data_dir);
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path).await?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", cli.port)).await?;
    info!("storyvet listening on http://127.0.0.1:{}", cli.port);
    info!("Health check: http://127.0.0.1:{}/health", cli.port);

    axum::serve(listener, app).await?;

    Ok(())
}
