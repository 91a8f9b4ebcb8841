//! Route handlers.
//!
//! Engine and file work runs on the blocking pool. Handlers that change
//! the data directory hold `AppState::write_lock` for the whole cycle.

use crate::database::{RunOutcome, TableFile};
use crate::server::error::ApiError;
use crate::server::pages;
use crate::server::state::AppState;
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

/// Content type of `/csvraw` responses.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// `{"status": "ok"}`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Form body of `/run`.
#[derive(Debug, Deserialize)]
pub struct RunForm {
    pub raw: String,
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// GET / - Landing page
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let db = state.db.clone();
    let tables = blocking(move || db.tables()).await?;
    Ok(Html(pages::index_page(&tables)))
}

/// POST /upload - Save every `files` part into the data directory
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }
        // Browsers send an unnamed empty part when no file was picked.
        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let bytes = field.bytes().await?;
        files.push((name, bytes));
    }

    let _guard = state.write_lock.lock().await;
    let db = state.db.clone();
    let saved = blocking(move || {
        files
            .iter()
            .map(|(name, bytes)| db.save_upload(name, bytes))
            .collect::<crate::Result<Vec<_>>>()
    })
    .await?;

    tracing::info!(count = saved.len(), "Upload finished");
    Ok(Json(StatusResponse::ok()))
}

/// POST /run - One load/execute/export cycle
///
/// Accepts the `raw` field either URL-encoded or as multipart form data.
pub async fn run(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<RunOutcome>, ApiError> {
    let raw = read_raw_field(request).await?;

    let _guard = state.write_lock.lock().await;
    let db = state.db.clone();
    let outcome = blocking(move || db.run(&raw)).await?;
    Ok(Json(outcome))
}

async fn read_raw_field(request: Request) -> Result<String, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        while let Some(field) = multipart.next_field().await? {
            if field.name() == Some("raw") {
                return Ok(field.text().await?);
            }
        }
        Err(ApiError::bad_request("Missing form field: raw"))
    } else {
        let Form(form) = Form::<RunForm>::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(form.raw)
    }
}

/// POST /reset - Delete every CSV and the SQLite file
pub async fn reset(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let db = state.db.clone();
    blocking(move || db.reset()).await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET /tables - CSV files and their table names
pub async fn tables(State(state): State<AppState>) -> Result<Json<Vec<TableFile>>, ApiError> {
    let db = state.db.clone();
    Ok(Json(blocking(move || db.tables()).await?))
}

async fn read_file(state: &AppState, file: &str) -> Result<Vec<u8>, ApiError> {
    let db = state.db.clone();
    let name = file.to_string();
    blocking(move || db.read_file(&name))
        .await?
        .ok_or_else(|| ApiError::not_found(file))
}

/// GET /csvview/:file - CSV rendered as an HTML table
pub async fn csv_view(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Html<String>, ApiError> {
    let bytes = read_file(&state, &file).await?;
    let records = parse_records(&bytes);
    Ok(Html(pages::csv_page(&file, &records)))
}

/// GET /csvraw/:file - Raw CSV bytes
pub async fn csv_raw(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = read_file(&state, &file).await?;
    Ok(([(header::CONTENT_TYPE, CSV_CONTENT_TYPE)], bytes).into_response())
}

/// Lenient parse for display: ragged rows are kept, bad UTF-8 is replaced.
fn parse_records(bytes: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    reader
        .byte_records()
        .map_while(|record| record.ok())
        .map(|record| {
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect()
        })
        .collect()
}
