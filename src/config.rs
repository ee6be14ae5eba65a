use anyhow::{anyhow, Context};
use axum::http::{header, HeaderValue, Method};
use shuttle_secrets::SecretStore;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DATABASE: &str = "cinema-booking";
const DEFAULT_LOG_FILTER: &str = "cinema_booking=debug,tower_http=info";

/// Runtime settings, read from `Secrets.toml`.
///
/// | Secret             | Default          |
/// |--------------------|------------------|
/// | `MONGODB_URI`      | required         |
/// | `APP_URL`          | required         |
/// | `MONGODB_DATABASE` | `cinema-booking` |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    /// The only origin allowed by CORS.
    pub app_url: String,
}

impl AppConfig {
    pub fn from_secrets(secrets: &SecretStore) -> anyhow::Result<Self> {
        Self::from_lookup(|key| secrets.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("secret {key} was not found"));

        Ok(AppConfig {
            database_url: required("MONGODB_URI")?,
            app_url: required("APP_URL")?,
            database_name: lookup("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }

    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        let origin = self
            .app_url
            .parse::<HeaderValue>()
            .with_context(|| format!("APP_URL '{}' is not a valid origin", self.app_url))?;

        Ok(CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE]))
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
