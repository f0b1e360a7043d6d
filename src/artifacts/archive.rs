//! Zip archive of a finished mirror directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Pack every file under `mirror_dir` into `{mirror_dir}.zip`, entry paths
/// relative to the mirror root.
///
/// Synchronous by design (pure filesystem walk + compression); callers on
/// an async runtime should run it via `spawn_blocking`.
pub fn write_archive(mirror_dir: &Path) -> Result<PathBuf> {
    let zip_path = mirror_dir.with_extension("zip");
    let file = File::create(&zip_path)
        .with_context(|| format!("cannot create {}", zip_path.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in jwalk::WalkDir::new(mirror_dir).sort(true) {
        let entry = entry.context("failed to walk mirror directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(mirror_dir)
            .context("walked file outside mirror directory")?;

        writer
            .start_file(relative.to_string_lossy().replace('\\', "/"), options)
            .with_context(|| format!("cannot add archive entry {}", relative.display()))?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        writer.write_all(&bytes)?;
    }

    writer.finish().context("cannot finalize archive")?;
    info!(target: "webmirror::artifacts", "wrote archive: {}", zip_path.display());
    Ok(zip_path)
}
