//! Scoreboard backend entrypoint wiring the REST API, storage supervisor and tracing.

use std::{env, fmt, net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::Context;
use axum::Router;
use clash_scoreboard_back::{
    config::AppConfig,
    dao::{
        score_store::{ScoreboardStore, memory::MemoryStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";

/// Storage implementations selectable at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Mongo,
    Couch,
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Backend::Mongo),
            "couch" | "couchdb" => Ok(Backend::Couch),
            "memory" => Ok(Backend::Memory),
            other => anyhow::bail!("unknown {STORAGE_BACKEND_ENV} `{other}`"),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Mongo => "mongo",
            Backend::Couch => "couch",
            Backend::Memory => "memory",
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let backend = match env::var(STORAGE_BACKEND_ENV) {
        Ok(value) => value.parse::<Backend>()?,
        Err(_) => Backend::Mongo,
    };

    let app_state = AppState::new(AppConfig::load());
    spawn_storage_supervisor(app_state.clone(), backend)?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, %backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the background task that connects the selected store and tracks degraded mode.
fn spawn_storage_supervisor(state: SharedState, backend: Backend) -> anyhow::Result<()> {
    match backend {
        #[cfg(feature = "mongo-store")]
        Backend::Mongo => {
            use clash_scoreboard_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoScoreStore::connect(config).await?;
                Ok::<Arc<dyn ScoreboardStore>, StorageError>(Arc::new(store))
            }));
        }
        #[cfg(feature = "couch-store")]
        Backend::Couch => {
            use clash_scoreboard_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchScoreStore::connect(config).await?;
                Ok::<Arc<dyn ScoreboardStore>, StorageError>(Arc::new(store))
            }));
        }
        Backend::Memory => {
            let store = MemoryStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<Arc<dyn ScoreboardStore>, StorageError>(Arc::new(store)) }
            }));
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("storage backend `{other}` is not compiled into this build"),
    }
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
