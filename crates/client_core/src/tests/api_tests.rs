use super::*;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::{NETWORK_ERROR_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
use std::sync::Arc;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Default)]
struct Captured {
    request: Arc<Mutex<Option<(HeaderMap, Value)>>>,
}

fn movie_json(id: &str) -> Value {
    json!({
        "id": id,
        "kinopoisk_id": 535341,
        "title": "1+1",
        "title_original": "Intouchables",
        "year": 2011,
        "genre": "comedy",
        "poster_url": "https://example.com/535341.jpg",
        "description": "An unlikely friendship.",
        "rating": 8.8,
        "created_at": "2025-09-25T12:00:00Z",
        "is_active": true
    })
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn handle_swipe(
    State(state): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let movie_id = body["movie_id"].clone();
    let swipe_type = body["swipe_type"].clone();
    *state.request.lock().await = Some((headers, body));
    Json(json!({
        "success": true,
        "data": {
            "id": "5d2c",
            "user_id": "a1b2",
            "movie_id": movie_id,
            "swipe_type": swipe_type,
            "swiped_at": "2025-12-06T14:00:00",
            "group_participants": [],
            "match_found": true
        }
    }))
}

#[tokio::test]
async fn fetch_random_movie_unwraps_data_envelope() {
    let app = Router::new().route(
        "/random",
        get(|| async { Json(ApiEnvelope::ok(movie_json("m-1"))) }),
    );
    let api = HttpMovieApi::new(spawn_server(app).await, TIMEOUT).expect("client");

    let movie = api.fetch_random_movie().await.expect("movie");

    assert_eq!(movie.id, MovieId("m-1".into()));
    assert_eq!(movie.title, "1+1");
    assert_eq!(movie.distinct_original_title(), Some("Intouchables"));
    assert_eq!(movie.rating, Some(8.8));
    assert!(movie.is_active);
}

#[tokio::test]
async fn submit_swipe_sends_user_header_and_snake_case_body() {
    let captured = Captured::default();
    let app = Router::new()
        .route("/swipes", post(handle_swipe))
        .with_state(captured.clone());
    let api = HttpMovieApi::new(spawn_server(app).await, TIMEOUT).expect("client");

    let response = api
        .submit_swipe(&MovieId("m-1".into()), SwipeDirection::Like, TelegramId(42), &[])
        .await
        .expect("swipe");

    assert_eq!(response.movie_id, MovieId("m-1".into()));
    assert_eq!(response.swipe_type, SwipeDirection::Like);
    assert!(response.is_match());

    let (headers, body) = captured.request.lock().await.take().expect("request");
    assert_eq!(
        headers
            .get(TELEGRAM_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("42")
    );
    assert_eq!(
        body,
        json!({ "movie_id": "m-1", "swipe_type": "like", "group_participants": [] })
    );
}

#[tokio::test]
async fn base_url_path_prefix_and_trailing_slash_are_respected() {
    let app = Router::new().route(
        "/api/movies/random",
        get(|| async { Json(json!({ "success": true, "data": movie_json("m-2") })) }),
    );
    let base = format!("{}/api/movies/", spawn_server(app).await);
    let api = HttpMovieApi::new(base, TIMEOUT).expect("client");

    let movie = api.fetch_random_movie().await.expect("movie");

    assert_eq!(movie.id, MovieId("m-2".into()));
    assert!(!api.base_url().ends_with('/'));
}

#[tokio::test]
async fn not_found_detail_becomes_error_message() {
    let app = Router::new().route(
        "/random",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))) }),
    );
    let api = HttpMovieApi::new(spawn_server(app).await, TIMEOUT).expect("client");

    let err = api.fetch_random_movie().await.expect_err("must fail");

    assert_eq!(err.message, "not found");
    assert_eq!(err.status_code, 404);
    assert_eq!(err.details.as_deref(), Some(r#"{"detail":"not found"}"#));
}

#[tokio::test]
async fn unparseable_server_failure_uses_generic_message() {
    let app = Router::new().route(
        "/swipes",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let api = HttpMovieApi::new(spawn_server(app).await, TIMEOUT).expect("client");

    let err = api
        .submit_swipe(&MovieId("m-1".into()), SwipeDirection::Dislike, TelegramId(7), &[])
        .await
        .expect_err("must fail");

    assert_eq!(err.message, UNEXPECTED_ERROR_MESSAGE);
    assert_eq!(err.status_code, 500);
}

#[tokio::test]
async fn success_status_without_data_is_an_error() {
    let app = Router::new().route(
        "/random",
        get(|| async { Json(json!({ "success": false, "error": "No movies available" })) }),
    );
    let api = HttpMovieApi::new(spawn_server(app).await, TIMEOUT).expect("client");

    let err = api.fetch_random_movie().await.expect_err("must fail");

    assert_eq!(err.message, "No movies available");
    assert_eq!(err.status_code, 200);
}

#[tokio::test]
async fn refused_connection_maps_to_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = HttpMovieApi::new(format!("http://{addr}"), TIMEOUT).expect("client");

    let err = api.fetch_random_movie().await.expect_err("must fail");

    assert_eq!(err.status_code, 0);
    assert_eq!(err.message, NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn request_timeout_maps_to_network_error() {
    let app = Router::new().route(
        "/random",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "data": movie_json("late") }))
        }),
    );
    let api = HttpMovieApi::new(spawn_server(app).await, Duration::from_millis(200))
        .expect("client");

    let err = api.fetch_random_movie().await.expect_err("must time out");

    assert!(err.is_network());
}

#[tokio::test]
async fn truncated_body_keeps_received_status() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 502 Bad Gateway\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"error\":",
            )
            .await
            .expect("write");
        socket.shutdown().await.expect("shutdown");
    });
    let api = HttpMovieApi::new(format!("http://{addr}"), TIMEOUT).expect("client");

    let err = api.fetch_random_movie().await.expect_err("must fail");

    assert_eq!(err.status_code, 502);
    assert!(!err.is_network());
    assert!(err.details.is_some());
}
