//! Fraudscore server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraudscore::{
    config::{Config, LogFormat, StoreBackend},
    create_router, db,
    model::{self, ClassifierAdapter},
    scoring::ScoringService,
    store::{CsvTransactionStore, InMemoryTransactionStore, PgTransactionStore, TransactionStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize logging
    init_tracing(config.log_format);

    tracing::info!("Fraudscore starting...");

    // Load the classifier once; it is read-only from here on
    let classifier = model::load_classifier(&config.model_path, config.model_format)
        .context("Failed to load classifier")?;
    let classifier = ClassifierAdapter::new(classifier);
    let info = classifier.info();
    tracing::info!(model = %info.name, format = ?info.format, "Classifier ready");

    let store = open_store(&config).await?;
    tracing::info!(backend = store.backend_name(), "Record store ready");

    let policy = config.decision_policy;
    tracing::info!(
        label_threshold = policy.threshold(),
        persistence = ?config.persistence_mode,
        "Decision policy configured"
    );

    // Build application state
    let state = AppState {
        scoring: ScoringService::new(classifier, store, policy, config.persistence_mode),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fraudscore=debug,tower_http=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn TransactionStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            tracing::info!("Database: {}", url.split('@').last().unwrap_or("***"));

            let pool = db::create_pool(url, config.database_max_connections)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            Ok(Arc::new(PgTransactionStore::new(pool)))
        }
        StoreBackend::Csv => {
            let store = CsvTransactionStore::open(&config.records_path)
                .with_context(|| format!("Failed to open {}", config.records_path.display()))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; records are lost on exit");
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
