use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pos_sync_server::{config::Config, db, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pos_sync_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().context("SYNC_TOKEN must be set")?;

    let pool = db::connect(&config.database.url)
        .await
        .context("failed to open database")?;
    db::init_schema(&pool)
        .await
        .context("failed to initialize schema")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::app(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("POS sync server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
