// webmirror CLI: collect a URL and the artifact options, run the crawl,
// then produce the PDF and zip artifacts strictly after the mirror is
// complete.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use webmirror::{CountingProgress, MirrorConfig, RendererSession, artifacts, crawl_site};

#[derive(Debug, Parser)]
#[command(
    name = "webmirror",
    version,
    about = "Mirror a JavaScript-rendered website to local storage"
)]
struct Cli {
    /// Seed URL to mirror (scheme optional, https assumed)
    #[arg(value_name = "URL")]
    url: String,

    /// Root directory to write the mirror under
    #[arg(long, value_name = "DIR", default_value = "./mirror")]
    output_dir: PathBuf,

    /// Also produce website.pdf from the mirrored landing page
    #[arg(long)]
    pdf: bool,

    /// Also pack the mirror directory into a .zip archive
    #[arg(long)]
    zip: bool,

    /// Stop after mirroring this many pages
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Seconds to let client-side rendering settle after navigation
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    settle_delay: u64,

    /// Number of pages processed concurrently
    #[arg(long, value_name = "N", default_value_t = 4)]
    concurrency: usize,

    /// Run the browser with a visible window
    #[arg(long)]
    with_head: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = MirrorConfig::builder()
        .output_dir(cli.output_dir)
        .seed_url(&cli.url)
        .headless(!cli.with_head)
        .settle_delay_secs(cli.settle_delay)
        .max_concurrent_pages(cli.concurrency)
        .limit(cli.limit)
        .make_pdf(cli.pdf)
        .make_archive(cli.zip)
        .build()?;

    let mut session = RendererSession::launch(&config)
        .await
        .context("failed to acquire rendering session")?;
    info!("rendering session acquired");

    let progress = CountingProgress::new(1);
    let outcome = match crawl_site(&session, &config, &progress).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The session must be released even when the crawl aborts.
            if let Err(close_err) = session.close().await {
                warn!("browser shutdown failed: {close_err:#}");
            }
            return Err(e.into());
        }
    };
    info!(
        "mirrored {} pages ({} skipped) into {}",
        progress.value(),
        outcome.pages_skipped,
        outcome.output_dir.display()
    );

    // Artifacts are sequenced continuations: they start only once the
    // mirror is fully persisted.
    if config.make_pdf() {
        match artifacts::write_pdf(&session, &outcome.output_dir).await {
            Ok(path) => info!("PDF written to {}", path.display()),
            Err(e) => warn!("PDF generation failed: {e:#}"),
        }
    }

    if let Err(e) = session.close().await {
        warn!("browser shutdown failed: {e:#}");
    }

    if config.make_archive() {
        let mirror_dir = outcome.output_dir.clone();
        let result = tokio::task::spawn_blocking(move || artifacts::write_archive(&mirror_dir))
            .await
            .context("archive task failed")?;
        match result {
            Ok(path) => info!("archive written to {}", path.display()),
            Err(e) => warn!("archive generation failed: {e:#}"),
        }
    }

    Ok(())
}
