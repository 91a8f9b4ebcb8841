//! HTTP surface.
//!
//! Routes:
//! - `GET  /`                - HTML landing page
//! - `POST /upload`          - multipart `files`, saved into the data directory
//! - `POST /run`             - form field `raw`, returns `{sql, output}`
//! - `POST /reset`           - delete every CSV and the SQLite file
//! - `GET  /tables`          - `[{file, table}]`
//! - `GET  /csvview/:file`   - CSV as an HTML table
//! - `GET  /csvraw/:file`    - raw CSV bytes

pub mod error;
pub mod handlers;
pub mod pages;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::database::Database;
use crate::types::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let upload_limit_bytes = state.upload_limit_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .route("/run", post(handlers::run))
        .route("/reset", post(handlers::reset))
        .route("/tables", get(handlers::tables))
        .route("/csvview/:file", get(handlers::csv_view))
        .route("/csvraw/:file", get(handlers::csv_raw))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `db` on its configured address until Ctrl-C.
///
/// # Errors
///
/// Returns `DatabaseError::Config` for a bad bind address, or
/// `DatabaseError::Io` if the listener fails
pub async fn serve(db: Database) -> Result<()> {
    let addr = db.config().bind_addr()?;
    let app = create_router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("  GET  /               - Landing page");
    tracing::info!("  POST /upload         - Upload CSV files");
    tracing::info!("  POST /run            - Run SQL");
    tracing::info!("  POST /reset          - Delete all CSVs");
    tracing::info!("  GET  /tables         - List tables");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
