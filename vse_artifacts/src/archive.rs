//! Zip bundles of an artifact directory, for moving trained models between
//! machines.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Packs the contents of `dir` into `{base_filename}.zip`. Entry names are
/// relative to `dir` and written in sorted order.
pub fn export_archive(dir: &Path, base_filename: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut bundle_name = base_filename.as_os_str().to_owned();
    bundle_name.push(".zip");
    let bundle = PathBuf::from(bundle_name);

    if let Some(parent) = bundle.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(&bundle)
        .with_context(|| format!("failed to create archive {}", bundle.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let bundle_abs = fs::canonicalize(&bundle).unwrap_or_else(|_| bundle.clone());

    let mut files = 0usize;
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let path = entry.path();
        if fs::canonicalize(path).map_or(false, |p| p == bundle_abs) {
            continue;
        }
        let name = entry_name(dir, path)?;

        if entry.file_type().is_dir() {
            zip.add_directory(name.as_str(), options)
                .with_context(|| format!("failed to add directory {}", name))?;
        } else {
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("failed to add {}", name))?;
            let mut src = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            io::copy(&mut src, &mut zip).with_context(|| format!("failed to compress {}", name))?;
            files += 1;
        }
        debug!(entry = %name, "archived");
    }

    let mut writer = zip.finish().context("failed to finish archive")?;
    writer.flush().context("failed to flush archive")?;
    info!(archive = %bundle.display(), files, "exported archive");
    Ok(bundle)
}

/// Replaces `dir` with the contents of `bundle`. The archive is checked
/// before `dir` is touched; entries pointing outside `dir` are rejected.
pub fn import_archive(bundle: &Path, dir: &Path) -> Result<usize> {
    let file = File::open(bundle)
        .with_context(|| format!("failed to open archive {}", bundle.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a zip archive", bundle.display()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let entry = archive
            .by_index(idx)
            .with_context(|| format!("failed to read entry {} of {}", idx, bundle.display()))?;
        let rel = match entry.enclosed_name() {
            Some(rel) => rel.to_path_buf(),
            None => bail!("archive entry {} escapes the target directory", entry.name()),
        };
        entries.push((idx, rel, entry.is_dir()));
    }

    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut files = 0usize;
    for (idx, rel, is_dir) in entries {
        let out = dir.join(&rel);
        if is_dir {
            fs::create_dir_all(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut entry = archive.by_index(idx)?;
        let mut dst = File::create(&out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        io::copy(&mut entry, &mut dst)
            .with_context(|| format!("failed to extract {}", rel.display()))?;
        files += 1;
    }

    info!(archive = %bundle.display(), dir = %dir.display(), files, "imported archive");
    Ok(files)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
