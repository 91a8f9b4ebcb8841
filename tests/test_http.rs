//! HTTP surface tests driving the router in-process.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use percolate_csvdb::server::{create_router, AppState};
use percolate_csvdb::{Config, Database};
use std::path::Path;
use tempfile::tempdir;
use tower::util::ServiceExt;

fn app(dir: &Path) -> Router {
    let db = Database::open(Config::with_data_dir(dir)).unwrap();
    create_router(AppState::new(db))
}

const BOUNDARY: &str = "----TestBoundary1234567890";

/// Helper to create a multipart body with one part per `(field, filename, content)`
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
            ),
        }
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn upload_people(app: &Router) {
    let body = multipart_body(&[(
        "files",
        Some("people.csv"),
        &b"name,age\nAda,36\nBob,41\n"[..],
    )]);
    let response = app
        .clone()
        .oneshot(multipart_request("/upload", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_upload_and_list_tables() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;

    let response = app.clone().oneshot(get("/tables")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!([{"file": "people.csv", "table": "people"}]));

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("/csvview/people.csv"));
}

#[tokio::test]
async fn test_upload_strips_directories() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let body = multipart_body(&[("files", Some("../../escape.csv"), &b"x\n1\n"[..])]);
    let response = app
        .oneshot(multipart_request("/upload", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(dir.path().join("escape.csv").exists());
    assert!(!dir.path().parent().unwrap().join("escape.csv").exists());
}

#[tokio::test]
async fn test_upload_rejects_dot_dot() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let body = multipart_body(&[("files", Some(".."), &b"x\n1\n"[..])]);
    let response = app
        .oneshot(multipart_request("/upload", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_run_form_encoded() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;

    let response = app
        .oneshot(form_request(
            "/run",
            "raw=SELECT+name+FROM+people+WHERE+age+%3E+40".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sql"], "SELECT name FROM people WHERE age > 40");
    assert_eq!(json["output"], "name\n Bob");
}

#[tokio::test]
async fn test_run_multipart_envelope() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;

    let raw = br#"{"command": "DROP TABLE people"}"#;
    let body = multipart_body(&[("raw", None, &raw[..])]);
    let response = app
        .clone()
        .oneshot(multipart_request("/run", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["sql"], "DROP TABLE people");
    assert_eq!(json["output"], "(Statement executed successfully)");
    assert!(!dir.path().join("people.csv").exists());

    let response = app.oneshot(get("/tables")).await.unwrap();
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_run_sql_error_is_ok_response() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let response = app
        .oneshot(form_request("/run", "raw=SELEKT+1".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let output = json["output"].as_str().unwrap();
    assert!(output.starts_with("ERROR:\nnear \"SELEKT\""));
}

#[tokio::test]
async fn test_run_missing_field_is_bad_request() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let body = multipart_body(&[("other", None, &b"SELECT 1"[..])]);
    let response = app
        .oneshot(multipart_request("/run", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csv_view_and_raw() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;

    let response = app.clone().oneshot(get("/csvview/people.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<tr><th>name</th><th>age</th></tr>"));
    assert!(html.contains("<tr><td>Bob</td><td>41</td></tr>"));

    let response = app.clone().oneshot(get("/csvraw/people.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(body_bytes(response).await, b"name,age\nAda,36\nBob,41\n");

    let response = app.oneshot(get("/csvraw/missing.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"File not found");
}

#[tokio::test]
async fn test_reset_clears_directory() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;
    app.clone()
        .oneshot(form_request("/run", "raw=SELECT+1".to_string()))
        .await
        .unwrap();
    assert!(dir.path().join("database.sqlite").exists());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
    assert!(!dir.path().join("people.csv").exists());
    assert!(!dir.path().join("database.sqlite").exists());

    let response = app.oneshot(get("/csvview/people.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_serialized() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    upload_people(&app).await;

    const REQUESTS: i64 = 8;
    let mut handles = Vec::new();
    for i in 0..REQUESTS {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let raw = format!(
                "raw=INSERT+INTO+people+VALUES+('p{}'%2C+{})%3B+SELECT+COUNT(*)+FROM+people",
                i, i
            );
            let response = app.oneshot(form_request("/run", raw)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            let output = json["output"].as_str().unwrap().to_string();
            output.lines().last().unwrap().trim().parse::<i64>().unwrap()
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.unwrap());
    }
    counts.sort();
    // Each run saw every earlier insert and nothing else.
    assert_eq!(counts, (3..3 + REQUESTS).collect::<Vec<_>>());

    let csv = std::fs::read_to_string(dir.path().join("people.csv")).unwrap();
    assert_eq!(csv.lines().count() as i64, 1 + 2 + REQUESTS);
}
