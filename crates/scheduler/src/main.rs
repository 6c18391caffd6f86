use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth_events::{EventBus, EventPersistence};
use hearth_scheduler::{SchedulerConfig, SchedulerProbe};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth_scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SchedulerConfig::from_env();
    tracing::info!(
        probe_interval_secs = config.probe_interval.as_secs(),
        dedup_window_secs = config.dedup_window.as_secs(),
        "Loaded scheduler configuration"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = hearth_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    hearth_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    // Standalone deployments still persist the events they emit; the
    // WebSocket push of those events requires the in-API deployment.
    let event_bus = Arc::new(EventBus::default());
    let persistence_handle = tokio::spawn(EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    let cancel = tokio_util::sync::CancellationToken::new();
    let probe = SchedulerProbe::new(pool, Arc::clone(&event_bus), config);

    tracing::info!("Scheduler probe starting");
    tokio::select! {
        _ = probe.run(cancel.clone()) => {}
        _ = shutdown_signal() => {
            cancel.cancel();
        }
    }

    // Drop the bus sender to close the broadcast channel, then give the
    // persistence task a moment to drain.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence_handle).await;
    tracing::info!("Scheduler stopped");
}

/// Wait for a termination signal to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
