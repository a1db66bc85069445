use anyhow::Result;
use config::{AppConfig, Command};
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env, if present ---
    let _ = dotenvy::dotenv();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;

    match command {
        Command::Serve => serve(cfg).await,
        Command::Upload { file, keywords } => upload(cfg, file, keywords).await,
        Command::Search { query } => search(cfg, query).await,
    }
}

async fn serve(cfg: AppConfig) -> Result<()> {
    tracing::info!("Starting tagged-image-gateway with config: {:?}", cfg);

    let missing = cfg.store.missing();
    if !missing.is_empty() {
        tracing::warn!(
            ?missing,
            "store settings incomplete; upload and search will fail until configured"
        );
    }

    // --- Initialize core service ---
    let store = services::s3_store::S3ObjectStore::connect(&cfg.store).await;
    let service = services::image_service::ImageService::new(
        Arc::new(store),
        cfg.store.clone(),
        cfg.max_upload_bytes,
    );

    // --- Build router ---
    let app = routes::routes::app(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn upload(cfg: AppConfig, file: Option<PathBuf>, keywords: String) -> Result<()> {
    let client = client::GatewayClient::new(&cfg.gateway_url);
    let item = client.upload(file.as_deref(), &keywords).await?;
    println!("{}", client::render_item(&item));
    Ok(())
}

async fn search(cfg: AppConfig, query: Option<String>) -> Result<()> {
    let client = client::GatewayClient::new(&cfg.gateway_url);
    let items = client.search(query.as_deref().unwrap_or_default()).await?;
    if items.is_empty() {
        println!("No images found");
    }
    for item in &items {
        println!("{}", client::render_item(item));
    }
    Ok(())
}
