//! Core crawl loop.
//!
//! The coordinator owns the visited set and the pending-URL work queue,
//! and drives renderer, rewriter, and fetcher per page. Traversal is an
//! explicit queue loop, not call-stack recursion, so arbitrarily deep
//! sites cannot blow the stack and the concurrency degree is a knob
//! rather than a redesign.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashSet;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, info, warn};

use super::crawl_types::{CrawlError, CrawlOutcome, PageState};
use super::progress::ProgressReporter;
use crate::browser::PageRenderer;
use crate::canon::CanonicalUrl;
use crate::config::MirrorConfig;
use crate::fetcher::ResourceFetcher;
use crate::rewriter;
use crate::utils::INDEX_FILENAME;

/// Crawl the site reachable from the configured seed URL and write its
/// mirror under `{output_dir}/{origin_dirname}`.
///
/// Invariants, independent of concurrency degree:
/// - a canonical URL is enqueued (and therefore rendered) at most once per
///   run; the visited-set insert is the atomic check-and-insert and happens
///   at enqueue time;
/// - only URLs whose origin exactly matches the seed's are followed;
/// - a per-page failure skips that page and nothing else;
/// - the run ends when the queue is empty and no page is in flight.
pub async fn crawl_site<R, P>(
    renderer: &R,
    config: &MirrorConfig,
    progress: &P,
) -> Result<CrawlOutcome, CrawlError>
where
    R: PageRenderer,
    P: ProgressReporter,
{
    let seed = CanonicalUrl::normalize(config.seed_url())
        .map_err(|e| CrawlError::Config(format!("{e:#}")))?;
    let origin = seed.origin();

    let mirror_dir = config.output_dir().join(seed.origin_dirname());
    if let Err(e) = tokio::fs::create_dir_all(&mirror_dir).await {
        let error = format!("cannot create mirror directory {}: {e}", mirror_dir.display());
        progress.report_error(&error);
        return Err(CrawlError::Filesystem(error));
    }

    let fetcher = ResourceFetcher::new().map_err(|e| {
        let error = format!("HTTP client: {e}");
        progress.report_error(&error);
        CrawlError::Config(error)
    })?;

    // The visited set: membership means Enqueued-or-later. insert() is the
    // atomic check-and-insert, so two pages discovering the same link
    // cannot both enqueue it.
    let visited: DashSet<CanonicalUrl> = DashSet::new();
    let mut queue: VecDeque<CanonicalUrl> = VecDeque::new();

    visited.insert(seed.clone());
    queue.push_back(seed.clone());
    debug!(target: "webmirror::crawl", "{seed}: {:?}", PageState::Enqueued);

    let concurrency = config.max_concurrent_pages();
    let mut in_flight = FuturesUnordered::new();
    let mut started = 0usize;
    let mut persisted = 0usize;
    let mut skipped = 0usize;

    info!(target: "webmirror::crawl", "mirroring {origin} into {}", mirror_dir.display());

    loop {
        // Fill up to the concurrency limit.
        while in_flight.len() < concurrency {
            if let Some(limit) = config.limit()
                && started >= limit
            {
                break;
            }
            let Some(url) = queue.pop_front() else { break };
            started += 1;
            in_flight.push(process_page(renderer, &fetcher, &seed, &mirror_dir, url));
        }

        // Wait for one page to finish; none in flight means we are done.
        let Some((url, result)) = in_flight.next().await else {
            break;
        };

        match result {
            Ok(links) => {
                persisted += 1;
                debug!(target: "webmirror::crawl", "{url}: {:?}", PageState::Persisted);
                progress.report_page_persisted(url.as_str(), persisted);

                for link in links {
                    // Scope rule: exact origin match against the seed, no
                    // path-prefix restriction, no depth limit.
                    if link.origin() != origin {
                        continue;
                    }
                    if visited.insert(link.clone()) {
                        debug!(target: "webmirror::crawl", "{link}: {:?}", PageState::Enqueued);
                        queue.push_back(link);
                    }
                }
            }
            Err(e) => {
                skipped += 1;
                warn!(target: "webmirror::crawl", "skipping {url}: {e:#}");
                debug!(target: "webmirror::crawl", "{url}: {:?}", PageState::Skipped);
                progress.report_page_skipped(url.as_str(), &format!("{e:#}"));
            }
        }
    }

    // Queue empty, nothing in flight: release the page futures' borrows.
    drop(in_flight);

    info!(
        target: "webmirror::crawl",
        "crawl finished: {persisted} pages mirrored, {skipped} skipped"
    );
    progress.report_completed(persisted);

    Ok(CrawlOutcome {
        pages_persisted: persisted,
        pages_skipped: skipped,
        output_dir: mirror_dir,
    })
}

/// Render, rewrite, and persist a single page, returning the hyperlinks it
/// carries. Any error here skips exactly this page.
async fn process_page<R: PageRenderer>(
    renderer: &R,
    fetcher: &ResourceFetcher,
    seed: &CanonicalUrl,
    mirror_dir: &Path,
    url: CanonicalUrl,
) -> (CanonicalUrl, Result<Vec<CanonicalUrl>>) {
    let result = async {
        debug!(target: "webmirror::crawl", "{url}: {:?}", PageState::Rendering);
        let html = renderer.render(&url).await?;

        debug!(target: "webmirror::crawl", "{url}: {:?}", PageState::Rewriting);
        let page = rewriter::rewrite_page(&html, &url, mirror_dir, fetcher).await;

        let path = page_path(&url, seed, mirror_dir);
        tokio::fs::write(&path, page.html.as_bytes())
            .await
            .with_context(|| format!("cannot write page file {}", path.display()))?;
        info!(target: "webmirror::crawl", "saved {url} -> {}", path.display());

        Ok(page.links)
    }
    .await;

    (url, result)
}

/// `index.html` for the seed page, a flattened-path filename otherwise.
fn page_path(url: &CanonicalUrl, seed: &CanonicalUrl, mirror_dir: &Path) -> PathBuf {
    if url == seed {
        mirror_dir.join(INDEX_FILENAME)
    } else {
        mirror_dir.join(format!("{}.html", url.derive_filename()))
    }
}
