//! PDF rendition of the mirror's landing page.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use log::info;
use url::Url;

use crate::browser::RendererSession;
use crate::utils::{INDEX_FILENAME, PDF_FILENAME};

/// Print the mirror's `index.html` to `website.pdf` inside the mirror
/// directory, reusing the run's rendering session.
///
/// Requires a finished mirror: a missing `index.html` is an error, not
/// something to wait for.
pub async fn write_pdf(session: &RendererSession, mirror_dir: &Path) -> Result<PathBuf> {
    let index_path = mirror_dir.join(INDEX_FILENAME);
    ensure!(
        tokio::fs::try_exists(&index_path)
            .await
            .unwrap_or(false),
        "no {INDEX_FILENAME} found in {}",
        mirror_dir.display()
    );

    let file_url = Url::from_file_path(&index_path)
        .map_err(|()| anyhow!("cannot build file URL for {}", index_path.display()))?;

    let bytes = session
        .print_to_pdf(file_url.as_str())
        .await
        .context("failed to print landing page to PDF")?;

    let pdf_path = mirror_dir.join(PDF_FILENAME);
    tokio::fs::write(&pdf_path, bytes)
        .await
        .with_context(|| format!("cannot write {}", pdf_path.display()))?;

    info!(target: "webmirror::artifacts", "wrote PDF: {}", pdf_path.display());
    Ok(pdf_path)
}
