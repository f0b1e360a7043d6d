//! Resource fetcher tests against a local mock HTTP server.

use mockito::Matcher;
use tempfile::TempDir;
use webmirror::{CanonicalUrl, FetchError, ResourceFetcher};

#[tokio::test]
async fn fetch_writes_file_named_from_final_segment() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/assets/logo.png")
        .match_header("user-agent", Matcher::Regex("Chrome".to_owned()))
        .with_status(200)
        .with_body(b"png-bytes")
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let url = CanonicalUrl::normalize(&format!("{}/assets/logo.png", server.url())).unwrap();

    let path = fetcher.fetch(&url, dest.path()).await.unwrap();

    assert_eq!(path.file_name().unwrap(), "logo.png");
    assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_creates_missing_destination_directory() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/style.css")
        .with_status(200)
        .with_body("body {}")
        .create_async()
        .await;

    let dest_root = TempDir::new().unwrap();
    let dest = dest_root.path().join("nested").join("dir");
    let fetcher = ResourceFetcher::new().unwrap();
    let url = CanonicalUrl::normalize(&format!("{}/style.css", server.url())).unwrap();

    let path = fetcher.fetch(&url, &dest).await.unwrap();
    assert!(path.starts_with(&dest));
    assert!(path.exists());
}

#[tokio::test]
async fn http_error_status_is_reported_not_written() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/gone.js")
        .with_status(404)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let url = CanonicalUrl::normalize(&format!("{}/gone.js", server.url())).unwrap();

    match fetcher.fetch(&url, dest.path()).await {
        Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_error_is_reported() {
    // Nothing listens on this port.
    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let url = CanonicalUrl::normalize("http://127.0.0.1:9/logo.png").unwrap();

    match fetcher.fetch(&url, dest.path()).await {
        Err(FetchError::Transport(_)) => {}
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn colliding_basenames_get_distinct_files() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a/logo.png")
        .with_status(200)
        .with_body(b"first")
        .create_async()
        .await;
    server
        .mock("GET", "/b/logo.png")
        .with_status(200)
        .with_body(b"second")
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let first = CanonicalUrl::normalize(&format!("{}/a/logo.png", server.url())).unwrap();
    let second = CanonicalUrl::normalize(&format!("{}/b/logo.png", server.url())).unwrap();

    let first_path = fetcher.fetch(&first, dest.path()).await.unwrap();
    let second_path = fetcher.fetch(&second, dest.path()).await.unwrap();

    assert_ne!(first_path, second_path);
    assert_eq!(std::fs::read(&first_path).unwrap(), b"first");
    assert_eq!(std::fs::read(&second_path).unwrap(), b"second");
}

#[tokio::test]
async fn repeated_fetch_of_same_url_downloads_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/app.js")
        .with_status(200)
        .with_body("console.log(1)")
        .expect(1)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let url = CanonicalUrl::normalize(&format!("{}/app.js", server.url())).unwrap();

    let first = fetcher.fetch(&url, dest.path()).await.unwrap();
    let second = fetcher.fetch(&url, dest.path()).await.unwrap();

    assert_eq!(first, second);
    mock.assert_async().await;
}
