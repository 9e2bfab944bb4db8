//! HTTP surface of gatepass.
//!
//! [`build_router`] wires the registration and profile pages onto an
//! [`AppState`]; [`serve`] runs it until Ctrl+C or SIGTERM.

mod error;
mod handlers;
pub mod origin;
pub mod views;

use std::net::SocketAddr;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::profile::ProfileViewer;
use crate::registration::Registrar;

pub use error::{AppError, AppResult};
pub use handlers::register_path;

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registrar: Registrar,
    viewer: ProfileViewer,
    public_origin: Option<String>,
    fallback_host: String,
}

impl AppState {
    /// Create state from its parts. Profile URLs use the request origin.
    #[must_use]
    pub fn new(registrar: Registrar, viewer: ProfileViewer) -> Self {
        Self {
            registrar,
            viewer,
            public_origin: None,
            fallback_host: "localhost".to_string(),
        }
    }

    /// Open the configured store, create the QR directory and build state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database or QR directory cannot be prepared.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = config.open_storage()?;
        let qr = config.qr_store();
        qr.ensure_dir()?;

        let registrar = Registrar::new(storage.clone(), qr, config.qr_url_prefix());
        let viewer = ProfileViewer::new(storage);

        Ok(Self::new(registrar, viewer)
            .with_public_origin(config.public_origin().map(ToString::to_string))
            .with_fallback_host(format!("{}:{}", config.server.host, config.server.port)))
    }

    /// Use a fixed origin for profile URLs instead of the request origin.
    #[must_use]
    pub fn with_public_origin(mut self, origin: Option<String>) -> Self {
        self.public_origin = origin.map(|o| o.trim_end_matches('/').to_string());
        self
    }

    /// Host used when a request carries no `Host` header.
    #[must_use]
    pub fn with_fallback_host(mut self, host: impl Into<String>) -> Self {
        self.fallback_host = host.into();
        self
    }

    /// The registration workflow.
    #[must_use]
    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Origin that profile URLs are built on for a request with `headers`.
    #[must_use]
    pub fn origin(&self, headers: &HeaderMap) -> String {
        self.public_origin
            .clone()
            .unwrap_or_else(|| origin::request_origin(headers, &self.fallback_host))
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let qr_dir = state.registrar.qr_store().dir().to_path_buf();
    let qr_prefix = state.registrar.qr_url_prefix().to_string();

    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/start",
            get(handlers::start_form).post(handlers::start_submit),
        )
        .route(
            "/register/{token}",
            get(handlers::register_form).post(handlers::register_submit),
        )
        .route("/profile/{id}", get(handlers::profile))
        .nest_service(&qr_prefix, ServeDir::new(qr_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `addr` until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
