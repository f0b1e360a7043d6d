//! webmirror: mirror JavaScript-rendered websites to local storage.
//!
//! Pages are rendered in a headless Chromium session so client-side
//! content is captured, resource references are rewritten to local
//! relative paths, and same-origin links are followed until the reachable
//! site graph is exhausted. Optional post-crawl steps produce a PDF of the
//! landing page and a zip of the mirror tree.

pub mod artifacts;
pub mod browser;
pub mod canon;
pub mod config;
pub mod crawl_engine;
pub mod fetcher;
pub mod rewriter;
pub mod utils;

pub use browser::{PageRenderer, RendererSession};
pub use canon::CanonicalUrl;
pub use config::MirrorConfig;
pub use crawl_engine::{
    CountingProgress, CrawlError, CrawlOutcome, NoOpProgress, ProgressReporter, crawl_site,
};
pub use fetcher::{FetchError, ResourceFetcher};
pub use rewriter::{ResourceRef, RewrittenPage, rewrite_page};

use log::warn;

/// Mirror the site described by `config` and return the crawl summary.
///
/// Convenience wrapper that owns the whole session lifecycle: acquire the
/// rendering session, crawl, release the session on every exit path.
/// Callers that also want the PDF artifact should drive
/// [`RendererSession`] and [`crawl_site`] themselves so the session can be
/// reused for printing (see `src/main.rs`).
pub async fn mirror(config: MirrorConfig) -> Result<CrawlOutcome, CrawlError> {
    let mut session = RendererSession::launch(&config)
        .await
        .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;

    let outcome = crawl_site(&session, &config, &NoOpProgress).await;

    if let Err(e) = session.close().await {
        warn!(target: "webmirror", "browser shutdown failed: {e:#}");
    }
    outcome
}
