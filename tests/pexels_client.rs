use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::Router;
use rust_photo_gallery::config::ApiOptions;
use rust_photo_gallery::feed::{GalleryFeed, PexelsClient};
use rust_photo_gallery::photo::ImageSize;

#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    params: HashMap<String, String>,
    authorization: Option<String>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

const LISTING: &str = r#"{
  "page": 1,
  "per_page": 2,
  "photos": [
    {"id": 101, "photographer": "Ada", "src": {"original": "https://img/101/o.jpg", "large2x": "https://img/101/l2x.jpg"}},
    {"id": 102, "photographer": "Bo", "src": {"original": "https://img/102/o.jpg"}}
  ],
  "total_results": 40,
  "next_page": "https://api.example/v1/curated?page=2&per_page=2"
}"#;

fn record(log: &Log, path: &'static str, headers: &HeaderMap, params: HashMap<String, String>) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    log.lock().unwrap().push(Seen {
        path,
        params,
        authorization,
    });
}

async fn curated(
    State(log): State<Log>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> &'static str {
    record(&log, "curated", &headers, params);
    LISTING
}

async fn search(
    State(log): State<Log>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> &'static str {
    record(&log, "search", &headers, params);
    r#"{"page": 3, "per_page": 2, "photos": []}"#
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn feed_for(addr: SocketAddr) -> GalleryFeed<PexelsClient> {
    let opts = ApiOptions {
        // no trailing slash on purpose
        base_url: format!("http://{addr}/v1"),
        ..ApiOptions::default()
    };
    let client = PexelsClient::new(&opts, "test-key".to_owned()).unwrap();
    GalleryFeed::new(client, ImageSize::Large2x)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn curated_page_is_requested_with_key_and_paging() {
    let log: Log = Log::default();
    let app = Router::new()
        .route("/v1/curated", get(curated))
        .route("/v1/search", get(search))
        .with_state(log.clone());
    let feed = feed_for(serve(app).await);

    let page = feed.fetch_page(1, 12, None).await.expect("page");
    assert_eq!(page.len(), 2);
    assert_eq!(page.photos[0].id, 101);
    assert_eq!(page.photos[0].image_url, "https://img/101/l2x.jpg");
    assert_eq!(page.photos[0].photographer, "Ada");
    // missing rendition falls back to the original
    assert_eq!(page.photos[1].image_url, "https://img/102/o.jpg");
    assert_eq!(page.total_results, Some(40));

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "curated");
    assert_eq!(seen[0].authorization.as_deref(), Some("test-key"));
    assert_eq!(seen[0].params.get("page").map(String::as_str), Some("1"));
    assert_eq!(seen[0].params.get("per_page").map(String::as_str), Some("12"));
    assert!(!seen[0].params.contains_key("query"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_term_goes_to_the_search_endpoint() {
    let log: Log = Log::default();
    let app = Router::new()
        .route("/v1/curated", get(curated))
        .route("/v1/search", get(search))
        .with_state(log.clone());
    let feed = feed_for(serve(app).await);

    let page = feed.fetch_page(3, 12, Some("red cars")).await.expect("page");
    assert!(page.is_empty(), "empty result is still a page");

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "search");
    assert_eq!(seen[0].params.get("query").map(String::as_str), Some("red cars"));
    assert_eq!(seen[0].params.get("page").map(String::as_str), Some("3"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_error_is_reported_as_absent() {
    let app = Router::new().route(
        "/v1/curated",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let feed = feed_for(serve(app).await);
    assert!(feed.fetch_page(1, 12, None).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_body_is_reported_as_absent() {
    let app = Router::new().route("/v1/curated", get(|| async { "<html>not json</html>" }));
    let feed = feed_for(serve(app).await);
    assert!(feed.fetch_page(1, 12, None).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_host_is_reported_as_absent() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let feed = feed_for(addr);
    assert!(feed.fetch_page(1, 12, None).await.is_none());
}
