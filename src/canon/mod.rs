//! Canonical URL handling.
//!
//! `CanonicalUrl` is the normalized form of a URL used as the deduplication
//! key for the crawl: two raw strings that denote the same resource compare
//! equal after normalization. The parsed `Url` is shared behind an `Arc` so
//! the type is cheap to clone into the visited set, the work queue, and
//! per-page futures.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use url::Url;

/// A normalized absolute URL (scheme + host + path + query, fragment
/// stripped).
///
/// Construct via [`CanonicalUrl::normalize`]; every instance is already in
/// canonical form, so equality and hashing operate on the serialized string.
#[derive(Clone, Debug)]
pub struct CanonicalUrl {
    url: Arc<Url>,
}

impl CanonicalUrl {
    /// Normalize a raw URL string into canonical form.
    ///
    /// Prefixes `https://` when the scheme is missing, rejects non-HTTP(S)
    /// schemes, and strips fragment anchors (client-side navigation markers
    /// that don't represent different HTTP resources).
    ///
    /// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("empty URL");
        }

        let candidate = if has_scheme(raw) {
            raw.to_owned()
        } else {
            format!("https://{raw}")
        };

        let mut parsed = Url::parse(&candidate)
            .with_context(|| format!("failed to parse URL {candidate:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported scheme {:?} in {raw:?}", parsed.scheme());
        }
        parsed.set_fragment(None);

        Ok(Self {
            url: Arc::new(parsed),
        })
    }

    /// Resolve a possibly-relative reference against this URL.
    ///
    /// Used for every `src`/`href` found while rewriting a page. Fails for
    /// unjoinable references and for resolved URLs outside HTTP(S).
    pub fn join(&self, reference: &str) -> Result<Self> {
        let mut resolved = self
            .url
            .join(reference.trim())
            .with_context(|| format!("cannot resolve {reference:?} against {self}"))?;
        if !matches!(resolved.scheme(), "http" | "https") {
            bail!("unsupported scheme in resolved URL {resolved}");
        }
        resolved.set_fragment(None);
        Ok(Self {
            url: Arc::new(resolved),
        })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The URL's origin (scheme + host + non-default port), the unit of
    /// same-site scoping.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Whether this URL belongs to the same origin as `other`.
    pub fn same_origin(&self, other: &Self) -> bool {
        self.url.origin() == other.url.origin()
    }

    /// Final path segment, used to name downloaded resources.
    /// Empty for directory-style URLs (`https://host/dir/`).
    pub fn final_segment(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
    }

    /// Directory name for this URL's origin in the mirror layout,
    /// e.g. `https://example.com` -> `example_com`.
    pub fn origin_dirname(&self) -> String {
        self.host_stem()
    }

    /// Derive a filesystem-safe page filename stem from host and path.
    ///
    /// Path separators become `_` so the flat mirror layout stays
    /// collision-free for distinct paths of one origin:
    /// `https://example.com/docs/api` -> `example_com_docs_api`.
    /// A URL that yields nothing maps to the sentinel `index`.
    pub fn derive_filename(&self) -> String {
        let path = self.url.path();
        let path = if path == "/" { "" } else { path };
        let stem = format!("{}{}", self.host_stem(), path.replace('/', "_"));
        let stem = sanitize_filename::sanitize(stem);
        if stem.is_empty() {
            "index".to_owned()
        } else {
            stem
        }
    }

    fn host_stem(&self) -> String {
        let host = self.url.host_str().unwrap_or_default().replace('.', "_");
        match self.url.port() {
            Some(port) => format!("{host}_{port}"),
            None => host,
        }
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for CanonicalUrl {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for CanonicalUrl {}

impl Hash for CanonicalUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

fn has_scheme(raw: &str) -> bool {
    raw.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }) || raw.split_once(':').is_some_and(|(scheme, _)| {
        matches!(scheme, "javascript" | "mailto" | "tel" | "data")
    })
}

/// Whether an href is worth resolving at all.
///
/// Skips empty values, fragment-only anchors, and non-navigational schemes
/// before they ever reach [`CanonicalUrl::join`].
#[must_use]
pub fn is_followable(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:"))
}
