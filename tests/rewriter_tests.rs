//! End-to-end rewrite tests: real downloads against a mock server,
//! verifying the rewrite-on-success / fallback-on-failure contract.

use tempfile::TempDir;
use webmirror::{CanonicalUrl, ResourceFetcher, rewrite_page};

#[tokio::test]
async fn successful_fetch_rewrites_attribute_to_relative_path() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/logo.png")
        .with_status(200)
        .with_body(b"png")
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let page_url = CanonicalUrl::normalize(&format!("{}/", server.url())).unwrap();
    let html = r#"<html><body><img src="/logo.png"></body></html>"#;

    let page = rewrite_page(html, &page_url, dest.path(), &fetcher).await;

    assert!(page.html.contains(r#"src="logo.png""#));
    assert!(dest.path().join("logo.png").exists());
    assert_eq!(page.resources.len(), 1);
    assert!(page.resources[0].local.is_some());
}

#[tokio::test]
async fn failed_fetch_leaves_attribute_unchanged() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/style.css")
        .with_status(500)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let page_url = CanonicalUrl::normalize(&format!("{}/", server.url())).unwrap();
    let html = r#"<link href="/style.css" rel="stylesheet">"#;

    let page = rewrite_page(html, &page_url, dest.path(), &fetcher).await;

    // degraded fallback: the remote reference stays in place
    assert!(page.html.contains(r#"href="/style.css""#));
    assert_eq!(page.resources.len(), 1);
    assert!(page.resources[0].local.is_none());
    assert!(!dest.path().join("style.css").exists());
}

#[tokio::test]
async fn links_are_collected_regardless_of_origin() {
    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let page_url = CanonicalUrl::normalize("https://example.com/").unwrap();
    let html = r#"
        <a href="/about">About</a>
        <a href="https://other.org/page">Elsewhere</a>
    "#;

    let page = rewrite_page(html, &page_url, dest.path(), &fetcher).await;

    let links: Vec<_> = page.links.iter().map(CanonicalUrl::as_str).collect();
    assert_eq!(
        links,
        vec!["https://example.com/about", "https://other.org/page"]
    );
}

#[tokio::test]
async fn unrecognized_elements_pass_through_unchanged() {
    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let page_url = CanonicalUrl::normalize("https://example.com/").unwrap();
    let html = r#"<video controls src="movie.mp4"></video><table><tr><td>x</td></tr></table>"#;

    let page = rewrite_page(html, &page_url, dest.path(), &fetcher).await;

    assert!(page.html.contains(r#"<video controls src="movie.mp4">"#));
    assert!(page.html.contains("<table>"));
    assert!(page.resources.is_empty());
}

#[tokio::test]
async fn shared_resource_is_rewritten_on_every_page_but_fetched_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/shared.js")
        .with_status(200)
        .with_body("x")
        .expect(1)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let fetcher = ResourceFetcher::new().unwrap();
    let base = CanonicalUrl::normalize(&server.url()).unwrap();
    let html = r#"<script src="/shared.js"></script>"#;

    let first = rewrite_page(html, &base, dest.path(), &fetcher).await;
    let second_url = base.join("/other").unwrap();
    let second = rewrite_page(html, &second_url, dest.path(), &fetcher).await;

    assert!(first.html.contains(r#"src="shared.js""#));
    assert!(second.html.contains(r#"src="shared.js""#));
    mock.assert_async().await;
}
