use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    routes::create_app,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool).await?;

    let addr = SocketAddr::from((
        config
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("APP_HOST '{}' is not an IP address", config.host))?,
        config.port,
    ));

    let state = AppState::new(pool.clone(), config);
    let app = create_app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing database pool");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = signal_or_pending("ctrl-c", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = signal_or_pending("SIGTERM", async {
        let mut signal =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        signal.recv().await;
        Ok(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Waits for `signal`. A listener that could not be installed never resolves,
/// so it cannot trigger a shutdown on its own.
async fn signal_or_pending<F>(name: &str, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        tracing::error!(error = %err, "failed to listen for {name}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::signal_or_pending;

    #[tokio::test]
    async fn failed_listener_never_fires() {
        let failed = signal_or_pending("test", async { Err(std::io::Error::other("no handler")) });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), failed)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn delivered_signal_fires() {
        let delivered = signal_or_pending("test", async { Ok(()) });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), delivered)
                .await
                .is_ok()
        );
    }
}
