use std::sync::Arc;

use product_catalog::{
    build_app,
    config::load_config,
    infrastructure::{image_store::ImageStore, json_file::JsonFileStore, logger::Logger},
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    config.validate()?;

    let _log_guard = Logger::init(&config.logging)?;

    ImageStore::new(config.storage.images_dir())
        .ensure_dir()
        .await?;

    let store = JsonFileStore::open(&config.storage.db_path)?;
    info!("using store file {}", store.path().display());

    let app = build_app(&config, Arc::new(store));

    let listener = TcpListener::bind(config.http.listen_addr()).await?;
    info!("Product catalog server running on port {}", config.http.port);

    axum::serve(listener, app).await?;
    Ok(())
}
