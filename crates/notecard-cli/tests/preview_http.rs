//! End-to-end tests for `GET /preview-image/{reference}`.
//!
//! Each test spins the router up on an ephemeral port over a temp content
//! directory and talks to it with a plain HTTP client.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use notecard::server::{AppState, router};
use notecard::source::FileContentSource;
use notecard_core::config::Config;
use notecard_core::error::FetchError;
use notecard_core::images::encode_png;
use notecard_core::media::ImageFetcher;
use notecard_core::style::{PreviewStyle, StyleProfile};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn note_json(author: &str, content: &str) -> String {
    serde_json::json!({
        "kind": "note",
        "content": content,
        "created_at": 1_700_000_000,
        "author": { "id": author, "name": "ana" },
    })
    .to_string()
}

/// Content directory with a handful of documents.
fn content_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello.json"), note_json("alice", "gm #nostr")).unwrap();
    fs::write(dir.path().join("spam1.json"), note_json("alice", "buy now")).unwrap();
    fs::write(dir.path().join("troll.json"), note_json("mallory", "hi")).unwrap();
    fs::write(
        dir.path().join("round.json"),
        serde_json::json!({
            "kind": "scorecard",
            "created_at": 1_700_000_000,
            "author": { "id": "golfer", "name": "Tiger" },
            "scorecard": { "value": 70, "reference_total": 72 },
        })
        .to_string(),
    )
    .unwrap();
    dir
}

async fn spawn_server(content: &TempDir, config: &Config) -> SocketAddr {
    let state = AppState::from_config(config, FileContentSource::new(content.path())).unwrap();
    spawn_state(state).await
}

async fn spawn_state<F: ImageFetcher + 'static>(
    state: AppState<FileContentSource, F>,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(Arc::new(state))).await.unwrap();
    });
    addr
}

/// Blows up the moment any media is reached.
struct CrashingFetcher;

impl ImageFetcher for CrashingFetcher {
    async fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
        panic!("decoder state corrupted")
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.moderation.banned_references = vec!["spam1".to_string()];
    config.moderation.banned_authors = vec!["mallory".to_string()];
    config
}

async fn get(
    addr: SocketAddr,
    path_and_query: &str,
    user_agent: Option<&str>,
) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(format!("http://{addr}{path_and_query}"));
    if let Some(ua) = user_agent {
        request = request.header(reqwest::header::USER_AGENT, ua);
    }
    request.send().await.unwrap()
}

async fn png_dimensions(response: reqwest::Response) -> (u32, u32) {
    let bytes = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    (decoded.width(), decoded.height())
}

#[tokio::test]
async fn test_renders_note_as_cacheable_png() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/hello", None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["cache-control"], "public, max-age=604800");
    assert_eq!(png_dimensions(response).await, (700, 525));
}

#[tokio::test]
async fn test_fake_extension_is_ignored() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/hello.jpg", None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_style_from_query_and_user_agent() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    let facebook = get(addr, "/preview-image/hello?style=facebook", None).await;
    assert_eq!(png_dimensions(facebook).await, (700, 365));

    let telegram = get(addr, "/preview-image/hello", Some("TelegramBot (like TwitterBot)")).await;
    assert_eq!(png_dimensions(telegram).await.0, 690);

    // an explicit style wins over the crawler's user agent
    let forced = get(
        addr,
        "/preview-image/hello?style=twitter",
        Some("TelegramBot (like TwitterBot)"),
    )
    .await;
    assert_eq!(png_dimensions(forced).await, (700, 366));
}

#[tokio::test]
async fn test_missing_content_is_404() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/nothing-here", None).await;
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("content not found: nothing-here"));
}

#[tokio::test]
async fn test_malformed_document_is_404() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    fs::write(content.path().join("broken.json"), "{").unwrap();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/broken", None).await;
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().starts_with("error fetching content"));
}

#[tokio::test]
async fn test_denylisted_reference_and_author_are_refused() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    for reference in ["spam1", "spam1.png", "troll"] {
        let response = get(addr, &format!("/preview-image/{reference}"), None).await;
        assert_eq!(response.status(), 404, "{reference}");
        assert_eq!(response.text().await.unwrap(), "content is not allowed");
    }
}

#[tokio::test]
async fn test_scorecard_has_fixed_size() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/round?style=telegram", None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(png_dimensions(response).await, (1200, 630));
}

#[tokio::test]
async fn test_inline_media_is_fetched_once() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let media = MockServer::start().await;
    let picture = encode_png(&RgbaImage::from_pixel(300, 120, Rgba([200, 40, 40, 255]))).unwrap();
    Mock::given(method("GET"))
        .and(path("/sunset.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(picture))
        .expect(1)
        .mount(&media)
        .await;

    let content = content_dir();
    let body = format!("look at this\n{}/sunset.png\nnice", media.uri());
    fs::write(content.path().join("photo.json"), note_json("alice", &body)).unwrap();
    let addr = spawn_server(&content, &test_config()).await;

    let response = get(addr, "/preview-image/photo", None).await;
    assert_eq!(response.status(), 200);
    let bytes = response.bytes().await.unwrap();
    let card = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(card.dimensions(), (700, 525));

    // media sits one text line below the top margin, at the left padding
    let profile = PreviewStyle::Default.profile();
    let line_height = profile.font_size * 12 / 10;
    let left = profile.padding_left;
    let top = StyleProfile::TOP_MARGIN + line_height;
    let served = Rgba([200, 40, 40, 255]);
    let corners = [(2, 2), (150, 60), (297, 117)];
    for (dx, dy) in corners {
        let (x, y) = (left + dx, top + dy);
        assert_eq!(card.get_pixel(x, y), &served, "({x}, {y})");
    }
    // and nothing past its right edge
    assert_ne!(card.get_pixel(left + 320, top + 60), &served);
}

#[tokio::test]
async fn test_render_fault_is_500_with_text_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let content = content_dir();
    fs::write(
        content.path().join("boom.json"),
        note_json("alice", "https://media.example/boom.png"),
    )
    .unwrap();
    let state = AppState::with_fetcher(
        &test_config(),
        FileContentSource::new(content.path()),
        CrashingFetcher,
    )
    .unwrap();
    let addr = spawn_state(state).await;

    let response = get(addr, "/preview-image/boom", None).await;
    assert_eq!(response.status(), 500);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(response.text().await.unwrap().starts_with("error rendering image"));

    // the server survives the fault
    let healthy = get(addr, "/preview-image/hello", None).await;
    assert_eq!(healthy.status(), 200);
}
