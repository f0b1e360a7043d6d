//! Shared configuration constants for webmirror
//!
//! Default values used throughout the codebase to ensure consistency
//! and avoid magic numbers.

/// Chrome user agent string sent by both the rendering session and the
/// resource fetcher, so pages and their assets are served the same variant.
///
/// Chrome releases new stable versions ~every 4 weeks; update quarterly to
/// stay within a reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default settle delay after navigation: 5 seconds
///
/// Client-side frameworks keep mutating the DOM after the load event fires.
/// The crawler reads the document only after this delay so rendered markup
/// includes JavaScript-driven content. A policy knob, not a correctness
/// requirement: tune down for static sites, up for heavy SPAs.
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 5;

/// Default timeout for page navigation and load: 30 seconds
///
/// Prevents hangs on slow DNS, unresponsive servers, or streaming content.
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Default number of pages processed concurrently: 4
///
/// Each in-flight page holds one browser tab, so this is also the tab
/// budget for the rendering session.
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;

/// Filename for the seed page of a mirror.
pub const INDEX_FILENAME: &str = "index.html";

/// Filename for the PDF rendition of the mirror's landing page.
pub const PDF_FILENAME: &str = "website.pdf";

/// Fallback basename for resources whose URL has no final path segment.
pub const FALLBACK_RESOURCE_NAME: &str = "file";
