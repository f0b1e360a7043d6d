//! Core configuration types for site mirroring
//!
//! This module contains the main `MirrorConfig` struct that defines the
//! parameters of one mirror run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{
    DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_SETTLE_DELAY_SECS,
};

/// Configuration for one mirror run.
///
/// Build via [`MirrorConfig::builder`], which enforces the two required
/// fields (output directory and seed URL) at compile time and normalizes
/// both at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Root directory the mirror tree is written under.
    ///
    /// **INVARIANT:** always an absolute path (normalized in the builder),
    /// so relative-path computations during rewriting are stable regardless
    /// of the process working directory.
    pub(crate) output_dir: PathBuf,

    /// Seed URL in canonical form (normalized in the builder).
    pub(crate) seed_url: String,

    pub(crate) headless: bool,
    pub(crate) settle_delay_secs: u64,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) max_concurrent_pages: usize,

    /// Optional upper bound on pages processed. The crawl itself is
    /// unbounded by design (it stops when the reachable same-origin graph
    /// is exhausted); this is the external bound callers may impose.
    pub(crate) limit: Option<usize>,

    /// Produce `website.pdf` from the finished mirror's landing page.
    /// Consumed by the invocation trigger only; the crawl coordinator is
    /// option-agnostic.
    pub(crate) make_pdf: bool,

    /// Produce a `.zip` archive of the finished mirror directory.
    /// Consumed by the invocation trigger only.
    pub(crate) make_archive: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./mirror"),
            seed_url: String::new(),
            headless: true,
            settle_delay_secs: DEFAULT_SETTLE_DELAY_SECS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            limit: None,
            make_pdf: false,
            make_archive: false,
        }
    }
}

impl MirrorConfig {
    #[must_use]
    pub fn builder() -> super::builder::MirrorConfigBuilder<()> {
        super::builder::MirrorConfigBuilder::default()
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages.max(1)
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn make_pdf(&self) -> bool {
        self.make_pdf
    }

    #[must_use]
    pub fn make_archive(&self) -> bool {
        self.make_archive
    }
}
