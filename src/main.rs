use std::sync::Arc;

use anyhow::Context;
use mongodb::{options::ClientOptions, Client};
use shuttle_secrets::{SecretStore, Secrets};

use cinema_booking::{
    app,
    config::{init_tracing, AppConfig},
    store::MongoStore,
    AppState,
};

#[shuttle_runtime::main]
async fn main(#[Secrets] secret_store: SecretStore) -> shuttle_axum::ShuttleAxum {
    init_tracing();

    let config = AppConfig::from_secrets(&secret_store)?;

    let client_options = ClientOptions::parse(&config.database_url)
        .await
        .context("Failed to parse MONGODB_URI")?;
    let client = Client::with_options(client_options).context("Failed to initialize MongoDB client")?;

    let store = MongoStore::new(client, &config.database_name);
    store.ping().await.context("Failed to reach MongoDB")?;
    tracing::info!(database = %config.database_name, "Connected to MongoDB");

    store
        .ensure_indexes()
        .await
        .context("Failed to create MongoDB indexes")?;

    let router = app(AppState::new(Arc::new(store))).layer(config.cors_layer()?);

    Ok(router.into())
}
