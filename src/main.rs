use std::sync::Arc;

use schooldesk::api::router;
use schooldesk::config::AppConfig;
use schooldesk::db;
use schooldesk::identity::{HeaderIdentityProvider, IdentityProvider, RemoteIdentityProvider};
use schooldesk::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "schooldesk=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;

    let identity: Arc<dyn IdentityProvider> = match &config.identity_userinfo_url {
        Some(url) => {
            info!("resolving principals via {}", url);
            Arc::new(RemoteIdentityProvider::new(url.clone())?)
        }
        None => {
            info!("resolving principals from trusted x-user-* headers");
            Arc::new(HeaderIdentityProvider)
        }
    };

    let state = AppState { db: pool, identity };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
