//! Resource downloading.
//!
//! `ResourceFetcher` downloads a single byte stream to local disk,
//! independent of any page logic. Errors are never fatal to a crawl: the
//! caller skips rewriting that one reference and leaves the original
//! remote URL in place as a degraded fallback.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use log::debug;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use xxhash_rust::xxh3::xxh3_64;

use crate::canon::CanonicalUrl;
use crate::utils::{CHROME_USER_AGENT, FALLBACK_RESOURCE_NAME};

/// Recoverable failure while fetching one resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS, or TLS failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Server answered with a non-success status.
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    /// Destination directory or file could not be written.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Run-scoped record of which resource URLs map to which local files.
///
/// Serves two purposes: a resource referenced by many pages is downloaded
/// once, and two distinct URLs that share only their final path segment do
/// not silently overwrite each other in the flat mirror layout (the second
/// claimant gets a path-hash-qualified filename).
#[derive(Debug, Default)]
struct ResourceStore {
    /// canonical URL -> local file path, for completed downloads
    by_url: DashMap<String, PathBuf>,
    /// local filename -> canonical URL of its first claimant
    claimed: DashMap<String, String>,
}

impl ResourceStore {
    /// Reserve a filename for `url`, qualifying it with a hash of the URL
    /// path when the bare basename is already taken by a different URL.
    /// The claim is atomic: concurrent fetches of different URLs with the
    /// same basename cannot both receive the bare name.
    fn claim_filename(&self, url: &CanonicalUrl, basename: String) -> String {
        match self.claimed.entry(basename.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(url.as_str().to_owned());
                basename
            }
            Entry::Occupied(slot) if slot.get().as_str() == url.as_str() => basename,
            Entry::Occupied(_) => qualify_basename(&basename, url.path()),
        }
    }
}

/// Downloads resources over HTTP(S) with a browser-identifying
/// `User-Agent`, sharing one connection pool across the whole crawl.
#[derive(Debug)]
pub struct ResourceFetcher {
    client: Client,
    store: ResourceStore,
}

impl ResourceFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CHROME_USER_AGENT));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            store: ResourceStore::default(),
        })
    }

    /// Download `url` into `dest_dir`, returning the local file path.
    ///
    /// The file is named from the URL's final path segment (or a sentinel
    /// when empty). `dest_dir` is created if absent; concurrent fetches
    /// into the same directory do not race on its creation
    /// (`create_dir_all` is idempotent). A URL already downloaded in this
    /// run returns its existing path without touching the network.
    pub async fn fetch(
        &self,
        url: &CanonicalUrl,
        dest_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        if let Some(existing) = self.store.by_url.get(url.as_str()) {
            return Ok(existing.clone());
        }

        let basename = sanitize_filename::sanitize(
            url.final_segment().unwrap_or(FALLBACK_RESOURCE_NAME),
        );
        let basename = if basename.is_empty() {
            FALLBACK_RESOURCE_NAME.to_owned()
        } else {
            basename
        };
        let filename = self.store.claim_filename(url, basename);

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(&filename);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        debug!(target: "webmirror::fetch", "downloaded {url} -> {}", path.display());
        self.store
            .by_url
            .insert(url.as_str().to_owned(), path.clone());
        Ok(path)
    }
}

/// `logo.png` + path `/v2/logo.png` -> `logo-<xxh3 of path>.png`.
fn qualify_basename(basename: &str, url_path: &str) -> String {
    let digest = xxh3_64(url_path.as_bytes());
    match basename.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{digest:016x}.{ext}"),
        None => format!("{basename}-{digest:016x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_keep_extension() {
        let name = qualify_basename("logo.png", "/v2/logo.png");
        assert!(name.starts_with("logo-"));
        assert!(name.ends_with(".png"));
        assert_ne!(name, qualify_basename("logo.png", "/v3/logo.png"));
    }

    #[test]
    fn claim_is_stable_per_url() {
        let store = ResourceStore::default();
        let a = CanonicalUrl::normalize("https://example.com/a/logo.png").unwrap();
        let b = CanonicalUrl::normalize("https://example.com/b/logo.png").unwrap();

        let first = store.claim_filename(&a, "logo.png".to_owned());
        assert_eq!(first, "logo.png");
        // same URL keeps its claim
        assert_eq!(store.claim_filename(&a, "logo.png".to_owned()), "logo.png");
        // a different URL with the same basename gets a qualified name
        let second = store.claim_filename(&b, "logo.png".to_owned());
        assert_ne!(second, "logo.png");
        assert!(second.ends_with(".png"));
    }
}
