//! Main server module - Axum setup and router configuration
//!
//! Serves the generator relay, rendered images, and a health probe.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{HeaderValue, Method, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use treegen_core::ServerSettings;

use crate::error::{ApiError, Result};
use crate::generator::{GeneratorInvoker, ProcessInvoker};
use crate::routes;

/// Origins allowed when CORS is not permissive
const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5000",
    "http://127.0.0.1:5000",
];

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors_permissive: bool,
    pub pics_dir: PathBuf,
    pub marker: String,
    pub generator: Vec<String>,
    pub workdir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            bind_addr: settings.bind,
            cors_permissive: settings.cors_permissive,
            pics_dir: settings.pics_dir.clone(),
            marker: settings.marker.clone(),
            generator: settings.generator.clone(),
            workdir: settings.workdir.clone(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub invoker: Arc<dyn GeneratorInvoker>,
    pub marker: String,
}

/// Build the application router with all routes
pub fn build_router(state: AppState, pics_dir: impl AsRef<Path>, cors_permissive: bool) -> Router {
    Router::new()
        .merge(routes::health::router::<Arc<AppState>>())
        .merge(routes::generate::router())
        .merge(routes::output::router::<Arc<AppState>>(pics_dir))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_permissive))
        .with_state(Arc::new(state))
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            LOCAL_ORIGINS.into_iter().map(HeaderValue::from_static),
        ))
        .allow_methods([Method::GET])
        .allow_headers(Any)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}

/// Start the HTTP server and run until Ctrl+C or SIGTERM
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let invoker = ProcessInvoker::new(&config.generator, config.workdir.clone())?;

    if !config.pics_dir.is_dir() {
        warn!(
            "Image directory {} does not exist yet; /output will return 404 until it does",
            config.pics_dir.display()
        );
    }

    let state = AppState {
        invoker: Arc::new(invoker),
        marker: config.marker.clone(),
    };
    let app = build_router(state, &config.pics_dir, config.cors_permissive);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Starting treegen-server on http://{}", listener.local_addr()?);
    info!("Generator: {}", config.generator.join(" "));
    info!("Images: {}", config.pics_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
