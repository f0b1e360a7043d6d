//! Crawl Engine Module
//!
//! The crawl coordinator: visited-set ownership, the pending-URL work
//! queue, same-origin scoping, and the per-page
//! render -> rewrite -> persist pipeline.

pub mod core;
pub mod crawl_types;
pub mod progress;

pub use core::crawl_site;
pub use crawl_types::{CrawlError, CrawlOutcome, PageState};
pub use progress::{CountingProgress, NoOpProgress, ProgressReporter};
