use std::sync::Arc;
use std::time::Duration;
use testdesk::service::{spawn_poll_sweeper, UserService};
use testdesk::{app, ensure_database_exists, ensure_schema, AppState, MemoryStore, PgStore, Settings, Store, StoreKind};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("testdesk=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn Store> = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&settings.database_url)
                .await?;
            ensure_schema(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    UserService::create_initial_user(store.as_ref(), &settings).await?;
    let _sweeper = spawn_poll_sweeper(store.clone(), Duration::from_secs(settings.poll_sweep_interval_secs));

    let bind_addr = settings.bind_addr;
    let state = AppState::new(store, settings);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("testdesk listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
