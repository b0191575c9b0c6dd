use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, AppSettings};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Site search manifest file or directory
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// JSON array of command-palette entries ({id, label, keywords})
    #[arg(long)]
    commands: Option<PathBuf>,
    /// Index configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let settings = AppSettings { manifest: args.manifest, commands: args.commands, config: args.config };
    let app: Router = build_app(&settings)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
