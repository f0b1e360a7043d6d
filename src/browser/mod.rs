//! Headless rendering session.
//!
//! The crawl consumes rendering as a capability: given a URL, return the
//! fully-rendered markup after client-side JavaScript has run. The
//! [`PageRenderer`] trait is that seam; [`RendererSession`] is the
//! production implementation wrapping one chromiumoxide browser held for
//! the lifetime of the run.

mod setup;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::canon::CanonicalUrl;
use crate::config::MirrorConfig;

pub use setup::{download_managed_browser, find_browser_executable};

/// The external rendering capability: navigate to a URL and return the
/// final DOM markup once client-side rendering has settled.
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &CanonicalUrl) -> impl Future<Output = Result<String>> + Send;
}

/// One browser session shared by a whole mirror run.
///
/// Acquired once before the first page and released once after the run.
/// `close()` is the graceful path; `Drop` aborts the CDP handler task so
/// the session is released on every exit path, including crawl abort.
pub struct RendererSession {
    browser: Browser,
    handler_task: Option<JoinHandle<()>>,
    settle_delay: Duration,
    page_load_timeout: Duration,
}

impl RendererSession {
    /// Launch the browser session. This is the only crawl-fatal failure
    /// point: without a rendering session there is no run.
    pub async fn launch(config: &MirrorConfig) -> Result<Self> {
        let (browser, handler_task) = setup::launch_browser(config.headless()).await?;
        Ok(Self {
            browser,
            handler_task: Some(handler_task),
            settle_delay: config.settle_delay(),
            page_load_timeout: config.page_load_timeout(),
        })
    }

    /// Navigate a fresh tab to `url` and read the rendered document.
    ///
    /// Waits a fixed settle delay after load so client-side rendering can
    /// finish before the markup is read. One retry on failure; a second
    /// failure surfaces as a per-page error for the coordinator to handle.
    pub async fn render_page(&self, url: &CanonicalUrl) -> Result<String> {
        match self.render_once(url).await {
            Ok(html) => Ok(html),
            Err(first) => {
                warn!(target: "webmirror::render", "retrying {url} after error: {first:#}");
                self.render_once(url)
                    .await
                    .with_context(|| format!("rendering {url} failed twice"))
            }
        }
    }

    async fn render_once(&self, url: &CanonicalUrl) -> Result<String> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open browser tab")?;

        let result = self.navigate_and_read(&page, url).await;
        close_page(page).await;
        result
    }

    async fn navigate_and_read(&self, page: &Page, url: &CanonicalUrl) -> Result<String> {
        with_page_timeout(
            async {
                page.goto(url.as_str())
                    .await
                    .map_err(|e| anyhow::anyhow!("navigation failed: {e}"))?;
                page.wait_for_navigation()
                    .await
                    .map_err(|e| anyhow::anyhow!("page load failed: {e}"))?;
                Ok(())
            },
            self.page_load_timeout,
            "page navigation",
        )
        .await?;

        // Let client-side rendering settle before reading the document.
        tokio::time::sleep(self.settle_delay).await;

        page.content()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read rendered document: {e}"))
    }

    /// Render `url` (typically a `file://` path into a finished mirror)
    /// and print it to PDF bytes via CDP.
    pub async fn print_to_pdf(&self, url: &str) -> Result<Vec<u8>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open browser tab")?;

        let result = async {
            page.goto(url)
                .await
                .map_err(|e| anyhow::anyhow!("navigation failed: {e}"))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| anyhow::anyhow!("page load failed: {e}"))?;
            page.pdf(PrintToPdfParams::default())
                .await
                .map_err(|e| anyhow::anyhow!("PDF printing failed: {e}"))
        }
        .await;
        close_page(page).await;
        result
    }

    /// Gracefully shut the session down: close the browser, wait for the
    /// process to exit, then stop the CDP handler task.
    pub async fn close(&mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("failed to close browser")?;
        self.browser
            .wait()
            .await
            .context("failed to wait for browser exit")?;

        if let Some(task) = self.handler_task.take() {
            task.abort();
            if let Err(e) = task.await
                && !e.is_cancelled()
            {
                warn!(target: "webmirror::render", "handler task failed during shutdown: {e}");
            }
        }
        debug!(target: "webmirror::render", "rendering session released");
        Ok(())
    }
}

impl Drop for RendererSession {
    fn drop(&mut self) {
        // Abort path: close() was never awaited. Stopping the handler task
        // severs the CDP connection, which takes the browser process down.
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

impl PageRenderer for RendererSession {
    fn render(&self, url: &CanonicalUrl) -> impl Future<Output = Result<String>> + Send {
        self.render_page(url)
    }
}

async fn close_page(page: Page) {
    if let Err(e) = page.close().await {
        debug!(target: "webmirror::render", "failed to close tab: {e}");
    }
}

/// Wrap an async page operation with an explicit timeout so a hung
/// navigation cannot stall the whole crawl.
async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} seconds",
            timeout.as_secs()
        )),
    }
}
