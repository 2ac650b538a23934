//! Quiz Arena binary entrypoint wiring REST, WebSocket and the quiz store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_arena::{
    config::AppConfig,
    dao::{quiz_store::QuizStore, storage::StorageError},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 8888;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    tokio::spawn(run_store_supervisor(app_state.clone()));
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port()));
    info!(%addr, "quiz arena listening");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the JSON record files under the configured data directory, retrying while they are unreachable.
#[cfg(feature = "json-store")]
async fn run_store_supervisor(state: SharedState) {
    use quiz_arena::dao::quiz_store::json::JsonQuizStore;

    let dir = state.config().data_dir.clone();
    storage_supervisor::run(state, move || {
        let dir = dir.clone();
        async move {
            let store = JsonQuizStore::open(dir).await.map_err(StorageError::from)?;
            Ok::<Arc<dyn QuizStore>, StorageError>(Arc::new(store))
        }
    })
    .await;
}

/// Without a file backend the server keeps its records in memory.
#[cfg(not(feature = "json-store"))]
async fn run_store_supervisor(state: SharedState) {
    use quiz_arena::dao::quiz_store::memory::MemoryQuizStore;

    storage_supervisor::run(state, || async {
        Ok::<Arc<dyn QuizStore>, StorageError>(Arc::new(MemoryQuizStore::new()))
    })
    .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Log to stdout, filtered by `RUST_LOG`.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// `PORT`, then `SERVER_PORT`, then the default; unparsable values are skipped.
fn listen_port() -> u16 {
    ["PORT", "SERVER_PORT"]
        .into_iter()
        .find_map(|key| env::var(key).ok()?.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Resolve on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down; open matches are dropped");
}
