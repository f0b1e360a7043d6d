//! Markup rewriting.
//!
//! Turns one rendered page into its mirrored form: resource-bearing
//! attributes (`img[src]`, `script[src]`, `link[href]`) are rewritten to
//! local relative paths once their targets are downloaded, hyperlinks are
//! collected for the coordinator, and everything else passes through the
//! serializer untouched.
//!
//! Two-phase by design: a read-only scraper pass collects resource and
//! link URLs, the downloads run concurrently, then a streaming lol_html
//! pass rewrites only the attributes whose fetch succeeded. A failed fetch
//! leaves the original remote URL in place as a degraded fallback.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use futures::future::join_all;
use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, Settings, element};
use log::warn;

use crate::canon::{CanonicalUrl, is_followable};
use crate::fetcher::ResourceFetcher;

/// The recognized set of resource-bearing attributes.
const RESOURCE_ATTRIBUTES: [(&str, &str); 3] =
    [("img", "src"), ("script", "src"), ("link", "href")];

/// One resource reference discovered while rewriting a page.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    /// The attribute the reference came from (`src` or `href`).
    pub attribute: &'static str,
    /// Absolute URL after resolution against the page.
    pub original: CanonicalUrl,
    /// Local file the resource was downloaded to; `None` when the fetch
    /// failed and the markup keeps the remote URL.
    pub local: Option<PathBuf>,
}

/// Result of rewriting one page's markup.
#[derive(Debug)]
pub struct RewrittenPage {
    pub html: String,
    pub resources: Vec<ResourceRef>,
    /// Every hyperlink found on the page, resolved to absolute form.
    /// Scope filtering is the coordinator's responsibility, not ours.
    pub links: Vec<CanonicalUrl>,
}

/// Rewrite one page: download its resources into `dest_dir` and point the
/// markup at the local copies.
///
/// Degrades rather than fails: unparseable markup or a rewriter error
/// yields the original markup with whatever resources did download.
pub async fn rewrite_page(
    html: &str,
    page_url: &CanonicalUrl,
    dest_dir: &Path,
    fetcher: &ResourceFetcher,
) -> RewrittenPage {
    let (resource_urls, links) = extract_refs(html, page_url);

    let downloads = resource_urls.into_iter().map(|(attribute, url)| async move {
        match fetcher.fetch(&url, dest_dir).await {
            Ok(path) => ResourceRef {
                attribute,
                original: url,
                local: Some(path),
            },
            Err(e) => {
                warn!(target: "webmirror::rewrite", "resource fetch failed for {url}: {e}");
                ResourceRef {
                    attribute,
                    original: url,
                    local: None,
                }
            }
        }
    });
    let resources = join_all(downloads).await;

    let url_to_local = local_path_map(&resources, dest_dir);
    let html = if url_to_local.is_empty() {
        html.to_owned()
    } else {
        match rewrite_markup(html, page_url, &url_to_local) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                warn!(target: "webmirror::rewrite", "markup rewrite failed for {page_url}: {e:#}");
                html.to_owned()
            }
        }
    };

    RewrittenPage {
        html,
        resources,
        links,
    }
}

/// Read-only extraction pass: resource references from the recognized
/// attribute set, and every hyperlink, each resolved against `page_url`.
/// Both lists are deduplicated preserving order.
fn extract_refs(
    html: &str,
    page_url: &CanonicalUrl,
) -> (Vec<(&'static str, CanonicalUrl)>, Vec<CanonicalUrl>) {
    let document = scraper::Html::parse_document(html);

    let mut seen_resources = HashSet::new();
    let mut resources = Vec::new();
    for (tag, attr) in RESOURCE_ATTRIBUTES {
        let selector = match scraper::Selector::parse(&format!("{tag}[{attr}]")) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attr) else {
                continue;
            };
            if !is_followable(value) {
                continue;
            }
            let Ok(resolved) = page_url.join(value) else {
                continue;
            };
            if seen_resources.insert(resolved.clone()) {
                resources.push((attr, resolved));
            }
        }
    }

    let mut seen_links = HashSet::new();
    let mut links = Vec::new();
    if let Ok(selector) = scraper::Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !is_followable(href) {
                continue;
            }
            let Ok(resolved) = page_url.join(href) else {
                continue;
            };
            if seen_links.insert(resolved.clone()) {
                links.push(resolved);
            }
        }
    }

    (resources, links)
}

/// Map successfully downloaded URLs to paths relative to the page's
/// directory, which is what the rewritten attributes must contain.
fn local_path_map(resources: &[ResourceRef], page_dir: &Path) -> HashMap<String, String> {
    resources
        .iter()
        .filter_map(|r| {
            let local = r.local.as_ref()?;
            let relative = pathdiff::diff_paths(local, page_dir)?;
            Some((
                r.original.as_str().to_owned(),
                relative.to_string_lossy().replace('\\', "/"),
            ))
        })
        .collect()
}

/// Streaming rewrite pass: every recognized attribute whose resolved URL
/// has a local copy is pointed at it; everything else is serialized
/// unchanged (lossless passthrough).
fn rewrite_markup(
    html: &str,
    page_url: &CanonicalUrl,
    url_to_local: &HashMap<String, String>,
) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("img[src]", |el| rewrite_attr(el, "src", page_url, url_to_local)),
                element!("script[src]", |el| {
                    rewrite_attr(el, "src", page_url, url_to_local)
                }),
                element!("link[href]", |el| {
                    rewrite_attr(el, "href", page_url, url_to_local)
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| anyhow!("HTML rewrite error: {e}"))?;
    rewriter
        .end()
        .map_err(|e| anyhow!("HTML rewrite finalization error: {e}"))?;

    String::from_utf8(output).context("invalid UTF-8 in rewritten HTML")
}

fn rewrite_attr(
    el: &mut Element,
    attr: &str,
    page_url: &CanonicalUrl,
    url_to_local: &HashMap<String, String>,
) -> lol_html::HandlerResult {
    if let Some(value) = el.get_attribute(attr)
        && is_followable(&value)
        && let Ok(resolved) = page_url.join(&value)
        && let Some(local) = url_to_local.get(resolved.as_str())
    {
        el.set_attribute(attr, local)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> CanonicalUrl {
        CanonicalUrl::normalize("https://example.com/index.html").unwrap()
    }

    #[test]
    fn extract_finds_recognized_attributes_and_links() {
        let html = r#"
            <html><body>
                <img src="/logo.png">
                <script src="app.js"></script>
                <link href="style.css" rel="stylesheet">
                <a href="/about">About</a>
                <a href="https://other.com/page">External</a>
                <a href="mailto:x@example.com">Mail</a>
                <video src="movie.mp4"></video>
            </body></html>
        "#;

        let (resources, links) = extract_refs(html, &page_url());

        let resource_urls: Vec<_> = resources.iter().map(|(_, u)| u.as_str()).collect();
        assert_eq!(
            resource_urls,
            vec![
                "https://example.com/logo.png",
                "https://example.com/app.js",
                "https://example.com/style.css",
            ]
        );

        // links are reported regardless of origin; mailto is dropped
        let link_urls: Vec<_> = links.iter().map(CanonicalUrl::as_str).collect();
        assert_eq!(
            link_urls,
            vec!["https://example.com/about", "https://other.com/page"]
        );
    }

    #[test]
    fn extract_deduplicates_repeated_references() {
        let html = r#"
            <img src="/logo.png">
            <img src="/logo.png">
            <a href="/about">One</a>
            <a href="/about">Two</a>
        "#;
        let (resources, links) = extract_refs(html, &page_url());
        assert_eq!(resources.len(), 1);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn rewrite_points_mapped_attributes_at_local_copies() {
        let html = r#"<img src="/logo.png" alt="logo"><script src="app.js"></script>"#;
        let mut map = HashMap::new();
        map.insert(
            "https://example.com/logo.png".to_owned(),
            "logo.png".to_owned(),
        );

        let rewritten = rewrite_markup(html, &page_url(), &map).unwrap();
        assert!(rewritten.contains(r#"src="logo.png""#));
        // unmapped reference (failed fetch) stays untouched
        assert!(rewritten.contains(r#"src="app.js""#));
        // other attributes survive
        assert!(rewritten.contains(r#"alt="logo""#));
    }

    #[test]
    fn rewrite_passes_unrecognized_elements_through_unchanged() {
        let html = r#"<video controls src="movie.mp4"></video><custom-widget data-x="1">text</custom-widget>"#;
        let map = HashMap::new();
        let rewritten = rewrite_markup(html, &page_url(), &map).unwrap();
        assert_eq!(rewritten, html);
    }

    #[test]
    fn rewrite_resolves_relative_references_before_lookup() {
        let page = CanonicalUrl::normalize("https://example.com/docs/index.html").unwrap();
        let html = r#"<link href="../style.css" rel="stylesheet">"#;
        let mut map = HashMap::new();
        map.insert(
            "https://example.com/style.css".to_owned(),
            "style.css".to_owned(),
        );
        let rewritten = rewrite_markup(html, &page, &map).unwrap();
        assert!(rewritten.contains(r#"href="style.css""#));
    }
}
