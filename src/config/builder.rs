//! Type-safe builder for `MirrorConfig` using the typestate pattern
//!
//! The builder provides a fluent interface with compile-time validation:
//! `build()` only exists once both required fields (output directory and
//! seed URL) have been set.

use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::MirrorConfig;
use crate::canon::CanonicalUrl;

// Type states for the builder
pub struct WithOutputDir;
pub struct Complete;

pub struct MirrorConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) seed_url: Option<String>,
    pub(crate) headless: bool,
    pub(crate) settle_delay_secs: u64,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) limit: Option<usize>,
    pub(crate) make_pdf: bool,
    pub(crate) make_archive: bool,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for MirrorConfigBuilder<()> {
    fn default() -> Self {
        let defaults = MirrorConfig::default();
        Self {
            output_dir: None,
            seed_url: None,
            headless: defaults.headless,
            settle_delay_secs: defaults.settle_delay_secs,
            page_load_timeout_secs: defaults.page_load_timeout_secs,
            max_concurrent_pages: defaults.max_concurrent_pages,
            limit: None,
            make_pdf: false,
            make_archive: false,
            _phantom: PhantomData,
        }
    }
}

impl<State> MirrorConfigBuilder<State> {
    fn transition<Next>(self) -> MirrorConfigBuilder<Next> {
        MirrorConfigBuilder {
            output_dir: self.output_dir,
            seed_url: self.seed_url,
            headless: self.headless,
            settle_delay_secs: self.settle_delay_secs,
            page_load_timeout_secs: self.page_load_timeout_secs,
            max_concurrent_pages: self.max_concurrent_pages,
            limit: self.limit,
            make_pdf: self.make_pdf,
            make_archive: self.make_archive,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn settle_delay_secs(mut self, secs: u64) -> Self {
        self.settle_delay_secs = secs;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_concurrent_pages(mut self, pages: usize) -> Self {
        self.max_concurrent_pages = pages;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn make_pdf(mut self, make_pdf: bool) -> Self {
        self.make_pdf = make_pdf;
        self
    }

    #[must_use]
    pub fn make_archive(mut self, make_archive: bool) -> Self {
        self.make_archive = make_archive;
        self
    }
}

impl MirrorConfigBuilder<()> {
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> MirrorConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.transition()
    }
}

impl MirrorConfigBuilder<WithOutputDir> {
    #[must_use]
    pub fn seed_url(mut self, url: impl Into<String>) -> MirrorConfigBuilder<Complete> {
        self.seed_url = Some(url.into());
        self.transition()
    }
}

impl MirrorConfigBuilder<Complete> {
    /// Validate and normalize the configuration.
    ///
    /// The seed URL is canonicalized (scheme defaulting, fragment
    /// stripping) and the output directory made absolute, so every later
    /// path and origin comparison works on stable inputs.
    pub fn build(self) -> Result<MirrorConfig> {
        let raw_seed = self
            .seed_url
            .ok_or_else(|| anyhow!("seed URL not set"))?;
        let seed = CanonicalUrl::normalize(&raw_seed)
            .with_context(|| format!("invalid seed URL {raw_seed:?}"))?;

        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output directory not set"))?;
        let output_dir = std::path::absolute(&output_dir)
            .with_context(|| format!("cannot absolutize output dir {}", output_dir.display()))?;

        Ok(MirrorConfig {
            output_dir,
            seed_url: seed.as_str().to_owned(),
            headless: self.headless,
            settle_delay_secs: self.settle_delay_secs,
            page_load_timeout_secs: self.page_load_timeout_secs,
            max_concurrent_pages: self.max_concurrent_pages,
            limit: self.limit,
            make_pdf: self.make_pdf,
            make_archive: self.make_archive,
        })
    }
}
