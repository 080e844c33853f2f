use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Multipart;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use filehub_api_client::{FileRef, MemoryTokenStore, TokenStore};
use filehub_client::{connect_with_store, JobStatus, LoadingState};
use filehub_core::ClientConfig;

const TOKEN: &str = "tok-1";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer tok-1")
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired"}))).into_response();
    }
    Json(json!({"id": 1, "username": "alice", "email": "alice@example.com"})).into_response()
}

async fn upload(headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut name = String::new();
    let mut size = 0usize;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            name = field.file_name().unwrap_or_default().to_string();
            size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        }
    }

    // The server revokes the token while the batch is running.
    if !authorized(&headers) || name == "expired.txt" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired"}))).into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 7,
            "file_name": format!("uploads/{}", name),
            "file": "",
            "file_size": size,
            "uploaded_at": "2024-05-01T10:00:00Z"
        })),
    )
        .into_response()
}

async fn start_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/auth/profile/", get(profile))
        .route("/api/files/", post(upload));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn upload_401_ends_session_and_aborts_batch() {
    let addr = start_server().await;
    let config = ClientConfig::new(format!("http://{}/api", addr));
    let tokens = Arc::new(MemoryTokenStore::with_token(TOKEN));
    let hub = connect_with_store(&config, tokens.clone()).unwrap();

    assert_eq!(hub.session.initialize().await, LoadingState::Authenticated);
    assert!(hub.session.is_authenticated());

    let mut queue = hub.upload_queue();
    let ids = queue.enqueue([
        FileRef::from_bytes("a.txt", b"first".to_vec()),
        FileRef::from_bytes("expired.txt", b"second".to_vec()),
        FileRef::from_bytes("c.txt", b"third".to_vec()),
    ]);

    let outcome = queue.submit_all_pending().await;
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    assert!(outcome.aborted);
    assert!(!outcome.complete);

    let first = queue.get(ids[0]).unwrap();
    assert_eq!(first.status(), JobStatus::Success);
    assert_eq!(first.record().map(|r| r.file_size), Some(5));

    let expired = queue.get(ids[1]).unwrap();
    assert_eq!(expired.status(), JobStatus::Error);
    assert_eq!(expired.error_detail(), Some("Token expired"));

    assert_eq!(queue.get(ids[2]).unwrap().status(), JobStatus::Pending);
    assert_eq!(queue.pending_count(), 1);

    assert_eq!(tokens.load().unwrap(), None);
    assert!(!hub.session.is_authenticated());
    assert!(hub.session.current_user().is_none());
    assert_eq!(hub.session.loading_state(), LoadingState::Unauthenticated);
    assert!(hub.take_login_redirect());
}
