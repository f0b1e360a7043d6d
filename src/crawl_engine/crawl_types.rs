//! Core types for mirror crawl operations.

use std::fmt;
use std::path::PathBuf;

/// Custom error type for crawl operations.
#[derive(Debug, Clone)]
pub enum CrawlError {
    /// Configuration error
    Config(String),
    /// Browser session error (the only crawl-fatal class: failing to
    /// acquire the rendering session aborts the run)
    Browser(String),
    /// Filesystem error preparing the mirror directory
    Filesystem(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Browser(msg) => write!(f, "browser error: {msg}"),
            Self::Filesystem(msg) => write!(f, "filesystem error: {msg}"),
            Self::Other(msg) => write!(f, "crawl error: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} preserves the full context chain
        Self::Other(format!("{err:#}"))
    }
}

/// Lifecycle of one canonical URL within a run.
///
/// `Unseen` is implicit (absence from the visited set). A URL enters
/// `Enqueued` exactly once; `Skipped` is terminal for pages whose render,
/// rewrite, or write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Enqueued,
    Rendering,
    Rewriting,
    Persisted,
    Skipped,
}

/// Summary of a finished crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Pages written to the mirror.
    pub pages_persisted: usize,
    /// Pages that hit an unrecoverable per-page error.
    pub pages_skipped: usize,
    /// The mirror directory (`{output_dir}/{origin_dirname}`).
    pub output_dir: PathBuf,
}
