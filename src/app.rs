use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::routes::{
    dashboard, pdfs,
    seasoned::{self, Contacts, Emails},
    yearly,
};
use crate::store::Database;
use crate::uploads::UPLOADS_ROUTE;

pub struct AppState {
    pub db: Database,
    pub upload_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, upload_dir: impl Into<PathBuf>) -> SharedState {
        Arc::new(AppState {
            db,
            upload_dir: upload_dir.into(),
        })
    }
}

/// Full application router with state attached
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .nest("/api/contacts", seasoned::router::<Contacts>("/allcontacts"))
        .nest("/api/email", seasoned::router::<Emails>("/allemails"))
        .nest("/api/link", yearly::links_router())
        .nest("/api/pdf", pdfs::router())
        .nest("/api/dashboard", dashboard::router())
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&state.upload_dir))
        .layer(cors)
        .with_state(state)
}

pub async fn run(config: Config, db: Database) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let state = AppState::new(db, config.upload_dir.clone());
    let app = router(state);

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
}
