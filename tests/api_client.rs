//! API client behaviour against a canned PoetryDB stand-in.
//!
//! The stand-in reproduces the service's quirks that matter to the client:
//! the `{status: 404}` not-found object, field projections, and the `:abs`
//! substring-match suffix.

use std::time::Duration;

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::{Value, json};

use versewalk::api::{ApiError, PoetryDb};

fn fire_and_ice() -> Value {
    json!({
        "title": "Fire and Ice",
        "author": "Robert Frost",
        "lines": [
            "Some say the world will end in fire,",
            "Some say in ice.",
        ],
        "linecount": "9"
    })
}

fn road_not_taken() -> Value {
    json!({
        "title": "The Road Not Taken",
        "author": "Robert Frost",
        "lines": ["Two roads diverged in a yellow wood,"],
        "linecount": "20"
    })
}

fn not_found() -> Value {
    json!({ "status": 404, "reason": "Not found" })
}

async fn authors() -> Json<Value> {
    Json(json!({
        "authors": ["Emily Dickinson", "Robert Frost", "William Shakespeare"]
    }))
}

async fn author_poems(Path(query): Path<String>) -> Response {
    let name = query.strip_suffix(":abs").unwrap_or(&query).to_string();
    match name.as_str() {
        "ServerError" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "NotJson" => "this is not json".into_response(),
        "Slowpoke" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([])).into_response()
        }
        _ if name.contains("Frost") => {
            Json(json!([fire_and_ice(), road_not_taken()])).into_response()
        }
        _ => Json(not_found()).into_response(),
    }
}

async fn exact_poem(Path(pair): Path<String>) -> Json<Value> {
    match pair.split_once(';') {
        Some(("Robert Frost", "Fire and Ice")) => Json(json!([fire_and_ice()])),
        _ => Json(not_found()),
    }
}

fn strip_abs(query: &str) -> &str {
    query.strip_suffix(":abs").unwrap_or(query)
}

async fn title_search(Path(query): Path<String>) -> Json<Value> {
    if strip_abs(&query).eq_ignore_ascii_case("fire") {
        Json(json!([fire_and_ice()]))
    } else {
        Json(not_found())
    }
}

async fn title_search_projected(Path((query, fields)): Path<(String, String)>) -> Json<Value> {
    assert_eq!(fields, "author,title");
    if strip_abs(&query).eq_ignore_ascii_case("fire") {
        Json(json!([{ "title": "Fire and Ice", "author": "Robert Frost" }]))
    } else {
        Json(not_found())
    }
}

async fn lines_search(Path(query): Path<String>) -> Json<Value> {
    if strip_abs(&query).eq_ignore_ascii_case("ice") {
        Json(json!([fire_and_ice()]))
    } else {
        Json(not_found())
    }
}

async fn lines_search_projected(Path((query, fields)): Path<(String, String)>) -> Json<Value> {
    assert_eq!(fields, "author,title,lines");
    if strip_abs(&query).eq_ignore_ascii_case("ice") {
        Json(json!([{
            "title": "Fire and Ice",
            "author": "Robert Frost",
            "lines": ["Some say in ice."]
        }]))
    } else {
        Json(not_found())
    }
}

async fn random() -> Json<Value> {
    Json(json!([fire_and_ice()]))
}

/// Binds the stand-in on an ephemeral port and returns its base URL.
async fn serve_fixture() -> String {
    let app = Router::new()
        .route("/author", get(authors))
        .route("/author/:query", get(author_poems))
        .route("/author,title/:pair", get(exact_poem))
        .route("/title/:query", get(title_search))
        .route("/title/:query/:fields", get(title_search_projected))
        .route("/lines/:query", get(lines_search))
        .route("/lines/:query/:fields", get(lines_search_projected))
        .route("/random", get(random));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server");
    });
    format!("http://{addr}")
}

async fn client() -> PoetryDb {
    PoetryDb::new(serve_fixture().await).expect("build client")
}

#[tokio::test]
async fn lists_authors() {
    let client = client().await;
    let authors = client.authors().await.unwrap();
    assert_eq!(
        authors,
        vec!["Emily Dickinson", "Robert Frost", "William Shakespeare"]
    );
}

#[tokio::test]
async fn fetches_poems_by_author_with_encoded_name() {
    let client = client().await;
    let poems = client.poems_by_author("Robert Frost").await.unwrap();
    assert_eq!(poems.len(), 2);
    assert_eq!(poems[0].title, "Fire and Ice");
    assert_eq!(poems[0].line_count(), 9);
    assert!(!poems[0].lines.is_empty());
}

#[tokio::test]
async fn not_found_shape_is_an_empty_result_not_an_error() {
    let client = client().await;
    let poems = client.poems_by_author("Nobody").await.unwrap();
    assert!(poems.is_empty());
}

#[tokio::test]
async fn author_search_uses_substring_matching() {
    let client = client().await;
    // "Frost" is not an exact author name in the fixture's eyes; the
    // `:abs` suffix path must still reach the Frost records.
    let poems = client.search_authors("Frost").await.unwrap();
    assert_eq!(poems.len(), 2);
}

#[tokio::test]
async fn exact_poem_lookup_returns_first_record() {
    let client = client().await;
    let poem = client.poem("Robert Frost", "Fire and Ice").await.unwrap();
    assert_eq!(poem.unwrap().title, "Fire and Ice");

    let missing = client.poem("Robert Frost", "Missing").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn title_preview_projects_author_and_title() {
    let client = client().await;
    let poems = client.title_preview("Fire").await.unwrap();
    assert_eq!(poems.len(), 1);
    assert_eq!(poems[0].author, "Robert Frost");
    // Projection drops the lines.
    assert!(poems[0].lines.is_empty());
}

#[tokio::test]
async fn lines_preview_projects_lines_too() {
    let client = client().await;
    let poems = client.lines_preview("Ice").await.unwrap();
    assert_eq!(poems.len(), 1);
    assert_eq!(poems[0].lines, vec!["Some say in ice."]);
}

#[tokio::test]
async fn lines_search_with_no_match_is_empty() {
    let client = client().await;
    let poems = client.search_lines("love").await.unwrap();
    assert!(poems.is_empty());
}

#[tokio::test]
async fn random_returns_one_poem() {
    let client = client().await;
    let poem = client.random().await.unwrap();
    assert_eq!(poem.unwrap().author, "Robert Frost");
}

#[tokio::test]
async fn server_failure_surfaces_as_status_error() {
    let client = client().await;
    let err = client.poems_by_author("ServerError").await.unwrap_err();
    assert!(matches!(err, ApiError::Status(status) if status.as_u16() == 500));
}

#[tokio::test]
async fn non_json_body_surfaces_as_decode_error() {
    let client = client().await;
    let err = client.poems_by_author("NotJson").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn hung_requests_hit_the_client_timeout() {
    let base = serve_fixture().await;
    let client = PoetryDb::with_timeout(base, Duration::from_millis(200)).unwrap();
    let err = client.poems_by_author("Slowpoke").await.unwrap_err();
    match err {
        ApiError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("expected a transport timeout, got {other:?}"),
    }
}
